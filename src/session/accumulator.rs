//! Frame accumulators
//!
//! [`FrameAccumulator`] is the seam to per-session frame reassembly and
//! transport counting. [`RtpFrameAccumulator`] is the stock implementation:
//! packets sharing an RTP timestamp form one frame, sequence numbers feed
//! loss/duplicate/reorder counters, and arrival times feed an RFC 3550
//! interarrival jitter estimate.

use std::collections::{HashSet, VecDeque};

use tracing::trace;

use super::{FrameSink, SessionMeta};
use crate::Result;
use crate::types::{CaptureTime, CompletedFrame, PacketMeta, PacketRecord, StreamStats};

/// Per-session frame reassembly and transport counting.
pub trait FrameAccumulator: Send {
    /// Consume one packet of the session, reporting completed frames and
    /// due statistics to `sink`.
    fn add(&mut self, session: &SessionMeta, packet: &PacketRecord, sink: &mut dyn FrameSink);

    /// End of input: flush any open frame and emit a final report.
    fn finish(&mut self, session: &SessionMeta, sink: &mut dyn FrameSink);

    /// Counters so far.
    fn stats(&self) -> &StreamStats;
}

/// Builds the accumulator for a newly seen session.
pub trait AccumulatorFactory {
    fn create(&self, session: &SessionMeta) -> Result<Box<dyn FrameAccumulator>>;
}

impl<F> AccumulatorFactory for F
where
    F: Fn(&SessionMeta) -> Result<Box<dyn FrameAccumulator>>,
{
    fn create(&self, session: &SessionMeta) -> Result<Box<dyn FrameAccumulator>> {
        self(session)
    }
}

/// Factory for [`RtpFrameAccumulator`].
#[derive(Debug, Clone, Copy)]
pub struct RtpAccumulatorFactory {
    pub stats_interval_secs: u64,
}

impl AccumulatorFactory for RtpAccumulatorFactory {
    fn create(&self, _session: &SessionMeta) -> Result<Box<dyn FrameAccumulator>> {
        Ok(Box::new(RtpFrameAccumulator::new(self.stats_interval_secs)))
    }
}

/// Sequence numbers remembered for duplicate detection.
const SEQUENCE_HISTORY: usize = 1024;

/// Largest forward gap whose sequence numbers are remembered as missing.
const MAX_TRACKED_GAP: u16 = 1024;

#[derive(Debug)]
struct OpenFrame {
    rtp_timestamp: u32,
    min_time: CaptureTime,
    max_time: CaptureTime,
    packets: u32,
    payload_len: u64,
    first_packet: PacketMeta,
}

impl OpenFrame {
    fn start(packet: &PacketRecord) -> Self {
        Self {
            rtp_timestamp: packet.rtp_timestamp,
            min_time: packet.captured,
            max_time: packet.captured,
            packets: 1,
            payload_len: u64::from(packet.payload_len),
            first_packet: PacketMeta::from(packet),
        }
    }

    fn extend(&mut self, packet: &PacketRecord) {
        self.min_time = self.min_time.min(packet.captured);
        self.max_time = self.max_time.max(packet.captured);
        self.packets += 1;
        self.payload_len += u64::from(packet.payload_len);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceEvent {
    InOrder,
    Duplicate,
    /// Arrived after a later sequence number
    Late { was_missing: bool },
}

/// 16-bit sequence tracking with wraparound.
#[derive(Debug, Default)]
struct SequenceTracker {
    highest: Option<u16>,
    recent: VecDeque<u16>,
    recent_set: HashSet<u16>,
    missing: HashSet<u16>,
    lost: u64,
}

impl SequenceTracker {
    fn record(&mut self, seq: u16) -> SequenceEvent {
        if self.recent_set.contains(&seq) {
            return SequenceEvent::Duplicate;
        }
        self.remember(seq);

        let Some(highest) = self.highest else {
            self.highest = Some(seq);
            return SequenceEvent::InOrder;
        };

        let ahead = seq.wrapping_sub(highest);
        if ahead != 0 && ahead < 0x8000 {
            let gap = ahead - 1;
            self.lost += u64::from(gap);
            if gap <= MAX_TRACKED_GAP {
                for offset in 1..=gap {
                    self.missing.insert(highest.wrapping_add(offset));
                }
            }
            self.highest = Some(seq);
            self.missing.retain(|&s| seq.wrapping_sub(s) < 0x8000);
            SequenceEvent::InOrder
        } else {
            let was_missing = self.missing.remove(&seq);
            if was_missing {
                self.lost -= 1;
            }
            SequenceEvent::Late { was_missing }
        }
    }

    fn remember(&mut self, seq: u16) {
        if self.recent.len() == SEQUENCE_HISTORY {
            if let Some(oldest) = self.recent.pop_front() {
                self.recent_set.remove(&oldest);
            }
        }
        self.recent.push_back(seq);
        self.recent_set.insert(seq);
    }
}

/// Stock accumulator: frames by RTP timestamp, RFC 3550 jitter.
#[derive(Debug)]
pub struct RtpFrameAccumulator {
    stats_interval_secs: u64,
    next_report_secs: Option<u64>,
    last_seen_secs: u64,
    report_count: u32,
    open: Option<OpenFrame>,
    previous_frame_rtp: Option<u32>,
    sequence: SequenceTracker,
    prev_transit: Option<i64>,
    /// Jitter in RTP clock units
    jitter: f64,
    stats: StreamStats,
}

impl RtpFrameAccumulator {
    pub fn new(stats_interval_secs: u64) -> Self {
        Self {
            stats_interval_secs: stats_interval_secs.max(1),
            next_report_secs: None,
            last_seen_secs: 0,
            report_count: 0,
            open: None,
            previous_frame_rtp: None,
            sequence: SequenceTracker::default(),
            prev_transit: None,
            jitter: 0.0,
            stats: StreamStats::default(),
        }
    }

    fn jitter_ms(&self, sampling_rate: u32) -> f64 {
        self.jitter / f64::from(sampling_rate) * 1000.0
    }

    fn update_jitter(&mut self, packet: &PacketRecord, sampling_rate: u32) {
        let arrival =
            (packet.captured.as_micros() * u128::from(sampling_rate) / 1_000_000) as i64;
        let transit = arrival - i64::from(packet.rtp_timestamp);
        if let Some(prev) = self.prev_transit {
            let d = (transit - prev).abs() as f64;
            self.jitter += (d - self.jitter) / 16.0;
        }
        self.prev_transit = Some(transit);

        self.stats.jitter_sum_ms += self.jitter_ms(sampling_rate);
        self.stats.jitter_samples += 1;
    }

    fn complete_open_frame(&mut self, session: &SessionMeta, sink: &mut dyn FrameSink) {
        let Some(open) = self.open.take() else {
            return;
        };

        let fps = match self.previous_frame_rtp {
            Some(prev) => {
                let delta = open.rtp_timestamp.wrapping_sub(prev);
                if delta == 0 || delta >= 0x8000_0000 {
                    0
                } else {
                    (f64::from(session.sampling_rate) / f64::from(delta)).round() as u32
                }
            }
            None => 0,
        };
        self.previous_frame_rtp = Some(open.rtp_timestamp);

        self.stats.total_frames += 1;
        self.stats.total_frame_bytes += open.payload_len;

        let frame = CompletedFrame {
            rtp_timestamp: open.rtp_timestamp,
            min_time: open.min_time,
            max_time: open.max_time,
            packets_seen: open.packets,
            total_payload_len: open.payload_len,
            fps,
            jitter_ms: self.jitter_ms(session.sampling_rate),
            first_packet: open.first_packet,
        };
        trace!(ssrc = session.key.ssrc, rtp_ts = frame.rtp_timestamp, "frame completed");
        sink.on_frame(session, &frame);
    }

    fn report(&mut self, session: &SessionMeta, timestamp: u64, sink: &mut dyn FrameSink) {
        self.report_count += 1;
        sink.on_stats(session, self.report_count, timestamp, &self.stats);
    }
}

impl FrameAccumulator for RtpFrameAccumulator {
    fn add(&mut self, session: &SessionMeta, packet: &PacketRecord, sink: &mut dyn FrameSink) {
        self.stats.total_pkts += 1;
        self.stats.total_bytes += u64::from(packet.payload_len);

        match self.sequence.record(packet.sequence) {
            SequenceEvent::Duplicate => {
                self.stats.duplicate_pkts += 1;
            }
            SequenceEvent::Late { was_missing } => {
                self.stats.out_of_order_pkts += 1;
                if !was_missing {
                    trace!(seq = packet.sequence, "late packet outside the tracked gap");
                }
            }
            SequenceEvent::InOrder => {}
        }
        self.stats.lost_pkts = self.sequence.lost;

        self.update_jitter(packet, session.sampling_rate);

        match self.open.as_mut() {
            Some(open) if open.rtp_timestamp == packet.rtp_timestamp => open.extend(packet),
            _ => {
                self.complete_open_frame(session, sink);
                self.open = Some(OpenFrame::start(packet));
            }
        }

        let now = packet.captured.secs;
        self.last_seen_secs = self.last_seen_secs.max(now);
        match self.next_report_secs {
            None => self.next_report_secs = Some(now + self.stats_interval_secs),
            Some(due) if now >= due => {
                self.report(session, now, sink);
                self.next_report_secs = Some(now + self.stats_interval_secs);
            }
            Some(_) => {}
        }
    }

    fn finish(&mut self, session: &SessionMeta, sink: &mut dyn FrameSink) {
        self.complete_open_frame(session, sink);
        if self.stats.total_pkts > 0 {
            self.report(session, self.last_seen_secs, sink);
        }
    }

    fn stats(&self) -> &StreamStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingSink, video_packet, video_session};

    #[test]
    fn frames_complete_on_timestamp_change() {
        let session = video_session(1);
        let mut sink = RecordingSink::default();
        let mut acc = RtpFrameAccumulator::new(1);

        acc.add(&session, &video_packet(1, 3000, 1_000), &mut sink);
        acc.add(&session, &video_packet(2, 3000, 1_004), &mut sink);
        assert!(sink.frames.is_empty());

        acc.add(&session, &video_packet(3, 6000, 1_033), &mut sink);
        assert_eq!(sink.frames.len(), 1);

        let frame = &sink.frames[0];
        assert_eq!(frame.rtp_timestamp, 3000);
        assert_eq!(frame.packets_seen, 2);
        assert_eq!(frame.min_time.as_millis(), 1_000);
        assert_eq!(frame.max_time.as_millis(), 1_004);
        assert_eq!(frame.total_payload_len, 2 * 1000);
        assert_eq!(frame.fps, 0);

        acc.finish(&session, &mut sink);
        assert_eq!(sink.frames.len(), 2);
        assert_eq!(sink.frames[1].rtp_timestamp, 6000);
        assert_eq!(sink.frames[1].fps, 30);
    }

    #[test]
    fn sequence_counters() {
        let session = video_session(1);
        let mut sink = RecordingSink::default();
        let mut acc = RtpFrameAccumulator::new(1);

        // 1, 2, 5 (3 and 4 missing), 3 (late), 5 (duplicate)
        for (seq, ts) in [(1u16, 0u32), (2, 0), (5, 3000), (3, 0), (5, 3000)] {
            acc.add(&session, &video_packet(seq, ts, 1_000), &mut sink);
        }

        let stats = acc.stats();
        assert_eq!(stats.total_pkts, 5);
        assert_eq!(stats.lost_pkts, 1);
        assert_eq!(stats.out_of_order_pkts, 1);
        assert_eq!(stats.duplicate_pkts, 1);
    }

    #[test]
    fn sequence_wraparound_is_not_loss() {
        let session = video_session(1);
        let mut sink = RecordingSink::default();
        let mut acc = RtpFrameAccumulator::new(1);

        for seq in [65534u16, 65535, 0, 1] {
            acc.add(&session, &video_packet(seq, 0, 1_000), &mut sink);
        }
        assert_eq!(acc.stats().lost_pkts, 0);
        assert_eq!(acc.stats().out_of_order_pkts, 0);
    }

    #[test]
    fn steady_arrivals_have_no_jitter() {
        let session = video_session(1);
        let mut sink = RecordingSink::default();
        let mut acc = RtpFrameAccumulator::new(1);

        for i in 0..10u32 {
            acc.add(&session, &video_packet(i as u16, i * 2970, 5_000 + u64::from(i) * 33), &mut sink);
        }
        acc.finish(&session, &mut sink);

        assert!(sink.frames.iter().all(|f| f.jitter_ms < 1e-9));
        assert_eq!(acc.stats().mean_jitter(), 0.0);
    }

    #[test]
    fn stats_follow_capture_cadence() {
        let session = video_session(1);
        let mut sink = RecordingSink::default();
        let mut acc = RtpFrameAccumulator::new(1);

        // 2.5 seconds of packets every 100 ms
        for i in 0..25u32 {
            acc.add(&session, &video_packet(i as u16, i * 9000, 10_000 + u64::from(i) * 100), &mut sink);
        }
        let periodic = sink.stats.len();
        assert_eq!(periodic, 2);
        assert_eq!(sink.stats[0].0, 1);
        assert_eq!(sink.stats[0].1, 11);

        acc.finish(&session, &mut sink);
        assert_eq!(sink.stats.len(), periodic + 1);
        let (count, _, last) = sink.stats.last().expect("final report");
        assert_eq!(*count, 3);
        assert_eq!(last.total_pkts, 25);
        assert_eq!(last.total_frames, 25);
    }

    #[test]
    fn factory_closures_can_fail() {
        let failing = |_: &SessionMeta| -> Result<Box<dyn FrameAccumulator>> {
            Err(crate::AnalysisError::session_setup("k", "no decoder"))
        };
        assert!(failing.create(&video_session(1)).is_err());

        let stock = RtpAccumulatorFactory { stats_interval_secs: 5 };
        assert!(stock.create(&video_session(1)).is_ok());
    }
}
