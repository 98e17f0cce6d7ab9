//! Frame-level clock normalization.
//!
//! Capture clocks and RTP clocks start at unrelated offsets. For every group
//! the normalizer keeps a bounded window of `(rtps, times)` millisecond
//! samples and subtracts the window means from each frame, putting both
//! timelines around a common zero.
//!
//! ```rust
//! use rtp_playout::config::NormalizationConfig;
//! use rtp_playout::normalize::rtp_to_millis;
//!
//! assert_eq!(rtp_to_millis(90_000, 90_000), 1000);
//! assert_eq!(rtp_to_millis(3_000, 90_000), 33);
//! assert_eq!(NormalizationConfig::default().window_capacity, 100);
//! ```

mod groups;
mod window;

pub use groups::GroupRegistry;
pub use window::ClockOffsetWindow;

use tracing::trace;

use crate::config::NormalizationConfig;
use crate::session::SessionMeta;
use crate::types::{CompletedFrame, FrameRecord, GroupId};

/// RTP timestamp to milliseconds on the session's clock, truncated.
pub fn rtp_to_millis(rtp_timestamp: u32, sampling_rate: u32) -> u64 {
    (f64::from(rtp_timestamp) / f64::from(sampling_rate) * 1000.0) as u64
}

/// Per-run normalization state: group ids and their offset windows.
#[derive(Debug)]
pub struct ClockNormalizer {
    config: NormalizationConfig,
    groups: GroupRegistry,
    /// Indexed by `GroupId`
    windows: Vec<ClockOffsetWindow>,
}

impl ClockNormalizer {
    pub fn new(config: NormalizationConfig) -> Self {
        Self { config, groups: GroupRegistry::new(), windows: Vec::new() }
    }

    /// Normalize one completed frame.
    ///
    /// Returns `None` for frames the normalization predicate rejects.
    pub fn normalize(
        &mut self,
        session: &SessionMeta,
        frame: &CompletedFrame,
    ) -> Option<FrameRecord> {
        let key = &session.key;
        if !self.config.accepts(&frame.first_packet, key.stream_type) {
            return None;
        }

        let rtps = rtp_to_millis(frame.rtp_timestamp, session.sampling_rate);
        let times = frame.max_time.as_millis();

        let group_id = self.groups.resolve(key.group_key());
        let window = self.window_mut(group_id);
        window.push(rtps, times);

        let norm_times = times as i64 - window.mean_times() as i64;
        let norm_rtps = rtps as i64 - window.mean_rtps() as i64;

        trace!(group = %group_id, rtps, times, norm_times, norm_rtps, "normalized frame");

        Some(FrameRecord {
            five_tuple: key.five_tuple,
            ssrc: key.ssrc,
            media_tag: frame.first_packet.media_tag,
            ext: frame.first_packet.ext,
            min_time: frame.min_time,
            max_time: frame.max_time,
            rtp_timestamp: frame.rtp_timestamp,
            packets_seen: frame.packets_seen,
            packets_hint: frame.first_packet.packets_hint.map_or(0, u32::from),
            total_payload_len: frame.total_payload_len,
            fps: frame.fps,
            jitter_ms: frame.jitter_ms,
            times: norm_times,
            rtps: norm_rtps,
            clock_diff: norm_times - norm_rtps,
            group_id,
        })
    }

    fn window_mut(&mut self, group_id: GroupId) -> &mut ClockOffsetWindow {
        let index = group_id.0 as usize;
        while self.windows.len() <= index {
            self.windows.push(ClockOffsetWindow::new(self.config.window_capacity));
        }
        &mut self.windows[index]
    }

    pub fn window(&self, group_id: GroupId) -> Option<&ClockOffsetWindow> {
        self.windows.get(group_id.0 as usize)
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{video_frame, video_session};
    use crate::types::{PacketMeta, StreamType};
    use proptest::prelude::*;

    fn normalizer() -> ClockNormalizer {
        ClockNormalizer::new(NormalizationConfig::default())
    }

    #[test]
    fn first_frame_is_its_own_mean() {
        let mut normalizer = normalizer();
        let record = normalizer
            .normalize(&video_session(1), &video_frame(90_000, 1_700_000_000_500))
            .expect("video frame is accepted");

        assert_eq!(record.times, 0);
        assert_eq!(record.rtps, 0);
        assert_eq!(record.clock_diff, 0);
        assert_eq!(record.group_id, GroupId(0));
    }

    #[test]
    fn running_mean_while_filling() {
        let mut normalizer = normalizer();
        let session = video_session(1);

        normalizer.normalize(&session, &video_frame(0, 1_000));
        let second = normalizer.normalize(&session, &video_frame(9_000, 1_150)).expect("accepted");

        // rtps samples 0, 100 -> mean 50; times 1000, 1150 -> mean 1075
        assert_eq!(second.rtps, 50);
        assert_eq!(second.times, 75);
        assert_eq!(second.clock_diff, 25);
    }

    #[test]
    fn rejected_frames_do_not_touch_state() {
        let mut normalizer = normalizer();
        let session = video_session(1);

        let mut audio_first = video_frame(0, 1_000);
        audio_first.first_packet = PacketMeta { media_tag: 15, ..audio_first.first_packet };
        assert!(normalizer.normalize(&session, &audio_first).is_none());

        let mut fec_session = session;
        fec_session.key.stream_type = StreamType::Fec;
        assert!(normalizer.normalize(&fec_session, &video_frame(0, 1_000)).is_none());

        assert!(normalizer.groups().is_empty());
        assert!(normalizer.window(GroupId(0)).is_none());
    }

    #[test]
    fn window_saturates_after_first_hundred() {
        let mut normalizer = normalizer();
        let session = video_session(1);

        let frames: Vec<_> = (0..150u32)
            .map(|i| video_frame(i * 3000, 1_700_000_000_000 + u64::from(i) * 40 + u64::from(i % 7)))
            .collect();
        let records: Vec<_> =
            frames.iter().filter_map(|f| normalizer.normalize(&session, f)).collect();
        assert_eq!(records.len(), 150);

        let window = normalizer.window(GroupId(0)).expect("group 0 window");
        assert_eq!(window.len(), 100);

        let first_hundred: Vec<(u64, u64)> = frames[..100]
            .iter()
            .map(|f| (rtp_to_millis(f.rtp_timestamp, 90_000), f.max_time.as_millis()))
            .collect();
        assert_eq!(window.samples().collect::<Vec<_>>(), first_hundred);

        let mean_rtps = first_hundred.iter().map(|s| s.0).sum::<u64>() / 100;
        let mean_times = first_hundred.iter().map(|s| s.1).sum::<u64>() / 100;
        for (frame, record) in frames.iter().zip(&records).skip(100) {
            let rtps = rtp_to_millis(frame.rtp_timestamp, 90_000);
            assert_eq!(record.rtps, rtps as i64 - mean_rtps as i64);
            assert_eq!(record.times, frame.max_time.as_millis() as i64 - mean_times as i64);
        }
    }

    proptest! {
        #[test]
        fn prop_group_ids_are_stable_across_interleaving(
            ssrcs in prop::collection::vec(0u32..6, 1..200)
        ) {
            let mut normalizer = normalizer();
            let mut first_seen = std::collections::HashMap::new();

            for (i, ssrc) in ssrcs.iter().enumerate() {
                let record = normalizer
                    .normalize(&video_session(*ssrc), &video_frame(i as u32 * 3000, 1_000 + i as u64 * 33))
                    .expect("accepted");
                let expected = *first_seen.entry(*ssrc).or_insert(record.group_id);
                prop_assert_eq!(record.group_id, expected);
            }

            let mut ids: Vec<u32> = first_seen.values().map(|id| id.0).collect();
            ids.sort_unstable();
            prop_assert_eq!(ids, (0..first_seen.len() as u32).collect::<Vec<_>>());
        }

        #[test]
        fn prop_window_never_exceeds_capacity(
            capacity in 1usize..20,
            frames in 0usize..60
        ) {
            let config = NormalizationConfig { window_capacity: capacity, ..Default::default() };
            let mut normalizer = ClockNormalizer::new(config);
            for i in 0..frames {
                normalizer.normalize(&video_session(3), &video_frame(i as u32 * 3000, 5_000 + i as u64 * 40));
            }
            let len = normalizer.window(GroupId(0)).map_or(0, ClockOffsetWindow::len);
            prop_assert_eq!(len, frames.min(capacity));
        }
    }
}
