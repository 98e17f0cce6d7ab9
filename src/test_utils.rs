//! Fixtures shared by unit tests, integration tests and benches.
//!
//! Every fixture uses the same flow, `10.0.0.1:8801 -> 10.0.0.2:50000` over
//! UDP, so packets, sessions and frames built here line up with each other.

#![cfg(any(test, feature = "benchmark"))]

use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use crate::playout::{FrameGroups, group_records};
use crate::session::{FrameSink, SessionMeta};
use crate::types::{
    CaptureTime, CompletedFrame, FiveTuple, FrameRecord, GroupId, MediaType, PacketMeta,
    PacketRecord, SessionKey, StreamStats, StreamType,
};

/// Capture time, in ms, that relative fixture times are anchored to.
pub const BASE_MILLIS: u64 = 1_700_000_000_000;

pub const VIDEO_TAG: u8 = 16;
pub const AUDIO_TAG: u8 = 15;

pub fn fixture_flow() -> FiveTuple {
    FiveTuple::udp(Ipv4Addr::new(10, 0, 0, 1), 8801, Ipv4Addr::new(10, 0, 0, 2), 50000)
}

/// Media video packet of 1000 payload bytes on SSRC 1.
pub fn video_packet(sequence: u16, rtp_timestamp: u32, captured_ms: u64) -> PacketRecord {
    PacketRecord {
        captured: CaptureTime::from_millis(captured_ms),
        five_tuple: fixture_flow(),
        ssrc: 1,
        media_tag: VIDEO_TAG,
        stream_type: StreamType::Media,
        payload_type: 98,
        sequence,
        rtp_timestamp,
        payload_len: 1000,
        ext: [0; 3],
        packets_hint: Some(2),
    }
}

/// Media audio packet of 160 payload bytes on SSRC 1.
pub fn audio_packet(sequence: u16, rtp_timestamp: u32, captured_ms: u64) -> PacketRecord {
    PacketRecord {
        media_tag: AUDIO_TAG,
        payload_type: 112,
        payload_len: 160,
        packets_hint: None,
        ..video_packet(sequence, rtp_timestamp, captured_ms)
    }
}

pub fn video_session(ssrc: u32) -> SessionMeta {
    SessionMeta {
        key: SessionKey {
            five_tuple: fixture_flow(),
            ssrc,
            media_type: MediaType::Video,
            stream_type: StreamType::Media,
        },
        sampling_rate: 90_000,
    }
}

/// Single-packet video frame captured at `captured_ms`.
pub fn video_frame(rtp_timestamp: u32, captured_ms: u64) -> CompletedFrame {
    let captured = CaptureTime::from_millis(captured_ms);
    CompletedFrame {
        rtp_timestamp,
        min_time: captured,
        max_time: captured,
        packets_seen: 1,
        total_payload_len: 1000,
        fps: 30,
        jitter_ms: 0.0,
        first_packet: PacketMeta { media_tag: VIDEO_TAG, ext: [0; 3], packets_hint: Some(2) },
    }
}

/// Group 0 frame row with the given normalized times.
///
/// Capture time is `BASE_MILLIS + times`, so a group's capture span equals
/// the spread of its `times`.
pub fn frame_record(times: i64, rtps: i64) -> FrameRecord {
    let captured = CaptureTime::from_millis(BASE_MILLIS.saturating_add_signed(times));
    FrameRecord {
        five_tuple: fixture_flow(),
        ssrc: 1,
        media_tag: VIDEO_TAG,
        ext: [0; 3],
        min_time: captured,
        max_time: captured,
        rtp_timestamp: 3000,
        packets_seen: 1,
        packets_hint: 0,
        total_payload_len: 1000,
        fps: 30,
        jitter_ms: 0.0,
        times,
        rtps,
        clock_diff: times - rtps,
        group_id: GroupId(0),
    }
}

/// Group 0 rows from `(rtps, times)` pairs.
pub fn frames_from(points: &[(i64, i64)]) -> Vec<FrameRecord> {
    points.iter().map(|&(rtps, times)| frame_record(times, rtps)).collect()
}

/// Deterministic arrival delay in `0..=spread_ms` for step `i`.
fn arrival_delay(i: u64, spread_ms: u64) -> u64 {
    if spread_ms == 0 { 0 } else { (i * 7919 + 13) % (spread_ms + 1) }
}

/// Two-packet-per-frame video stream at 30 fps on `ssrc`.
///
/// `spread_ms` adds a deterministic per-frame arrival delay; 0 gives a
/// perfectly paced stream.
pub fn synthetic_stream(ssrc: u32, frames: u32, spread_ms: u64) -> Vec<PacketRecord> {
    let mut packets = Vec::with_capacity(frames as usize * 2);
    for i in 0..frames {
        let rtp_timestamp = i.wrapping_mul(3000);
        let captured_ms = BASE_MILLIS + u64::from(i) * 33 + arrival_delay(u64::from(i), spread_ms);
        for part in 0..2u16 {
            let sequence = (i as u16).wrapping_mul(2).wrapping_add(part);
            let mut packet = video_packet(sequence, rtp_timestamp, captured_ms + u64::from(part));
            packet.ssrc = ssrc;
            packets.push(packet);
        }
    }
    packets
}

/// `groups` groups of `frames` rows each, with group-specific lateness.
pub fn synthetic_groups(groups: u32, frames: u32) -> FrameGroups {
    let rows = (0..groups).flat_map(|group| {
        (0..frames).map(move |i| {
            let rtps = i64::from(i) * 33;
            let delay = arrival_delay(u64::from(i + group), u64::from(group) * 10) as i64;
            let mut record = frame_record(rtps + delay, rtps);
            record.group_id = GroupId(group);
            record
        })
    });
    group_records(rows)
}

/// Sink that keeps every callback for inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub frames: Vec<CompletedFrame>,
    /// `(report_count, timestamp, stats)`
    pub stats: Vec<(u32, u64, StreamStats)>,
}

impl FrameSink for RecordingSink {
    fn on_frame(&mut self, _session: &SessionMeta, frame: &CompletedFrame) {
        self.frames.push(frame.clone());
    }

    fn on_stats(
        &mut self,
        _session: &SessionMeta,
        report_count: u32,
        timestamp: u64,
        stats: &StreamStats,
    ) {
        self.stats.push((report_count, timestamp, stats.clone()));
    }
}

/// In-memory writer whose contents stay readable after it is moved into
/// an analyzer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().map(|buf| buf.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.0.lock().map_err(|_| io::Error::other("buffer poisoned"))?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
