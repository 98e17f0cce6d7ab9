//! Offline playout simulation
//!
//! Replays one group's frames against a virtual receiver clock. Frames are
//! taken in RTP order; the playout clock only moves forward and is pinned to
//! the later of a frame's arrival and its schedule. A frame whose successor
//! arrives after both the clock and its own schedule freezes the picture; a
//! clock that then advances by less than the nominal frame spacing means the
//! receiver would have skipped ahead, which cancels the freeze recorded for
//! the previous frame.

use crate::types::{CaptureTime, FrameRecord};

/// Outcome for one frame of a group, in simulated playout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameVerdict {
    pub rtps: i64,
    pub times: i64,
    /// Virtual playout clock after this frame
    pub play_time: i64,
    pub skip: i64,
    pub freeze: i64,
}

/// Simulation result for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPlayout {
    /// One verdict per frame; empty for groups with fewer than two frames
    pub verdicts: Vec<FrameVerdict>,
    /// Sum of freeze values at the step each was computed
    pub lateness_ms: i64,
    pub span_ms: u64,
    pub lateness_ratio: f64,
}

impl GroupPlayout {
    fn degenerate() -> Self {
        Self { verdicts: Vec::new(), lateness_ms: 0, span_ms: 0, lateness_ratio: 0.0 }
    }
}

/// Simulate playout of one group's frames, given in any order.
pub fn simulate(frames: &[FrameRecord]) -> GroupPlayout {
    if frames.len() < 2 {
        return GroupPlayout::degenerate();
    }

    let mut order: Vec<&FrameRecord> = frames.iter().collect();
    order.sort_by_key(|frame| frame.rtps);

    let delta_rtp: Vec<i64> = order.windows(2).map(|pair| pair[1].rtps - pair[0].rtps).collect();

    let mut verdicts = Vec::with_capacity(order.len());
    // Previous frame's verdict; its skip is only known after the next step.
    let mut pending: Option<FrameVerdict> = None;
    let mut out_time = 0i64;
    let mut lateness_ms = 0i64;

    for (i, pair) in order.windows(2).enumerate() {
        let (current, next) = (pair[0], pair[1]);

        let prev_play_time = out_time;
        out_time = out_time.max(current.times.max(current.rtps));

        let freeze = if next.times > next.rtps {
            (next.times - out_time.max(next.rtps)).max(0)
        } else {
            0
        };

        if let Some(mut previous) = pending.take() {
            let advanced = out_time - prev_play_time;
            let spacing = delta_rtp[i - 1];
            if advanced < spacing {
                previous.skip = spacing - advanced;
                previous.freeze = 0;
            }
            verdicts.push(previous);
        }

        lateness_ms += freeze;
        pending = Some(FrameVerdict {
            rtps: current.rtps,
            times: current.times,
            play_time: out_time,
            skip: 0,
            freeze,
        });
    }

    verdicts.extend(pending);
    if let Some(last) = order.last() {
        verdicts.push(FrameVerdict {
            rtps: last.rtps,
            times: last.times,
            play_time: out_time.max(last.times.max(last.rtps)),
            skip: 0,
            freeze: 0,
        });
    }

    let span_ms = capture_span_ms(order.iter().copied());
    let lateness_ratio = if span_ms == 0 { 0.0 } else { lateness_ms as f64 / span_ms as f64 };

    GroupPlayout { verdicts, lateness_ms, span_ms, lateness_ratio }
}

/// Wall-clock span of a group in ms, over frames in playout order.
///
/// Seconds and micros are tracked as separate running extremes: the micros
/// accumulator only moves on rows whose second equals the current extreme
/// second, and is never reset when that second changes. The result depends
/// on frame order when the extremes come from different rows.
pub fn capture_span_ms<'a>(frames: impl IntoIterator<Item = &'a FrameRecord>) -> u64 {
    let (mut min_s, mut min_us) = (u64::MAX, u32::MAX);
    let (mut max_s, mut max_us) = (0u64, 0u32);
    let mut seen = false;

    for frame in frames {
        seen = true;
        min_s = min_s.min(frame.min_time.secs);
        if frame.min_time.secs == min_s {
            min_us = min_us.min(frame.min_time.micros);
        }
        max_s = max_s.max(frame.max_time.secs);
        if frame.max_time.secs == max_s {
            max_us = max_us.max(frame.max_time.micros);
        }
    }

    if !seen {
        return 0;
    }
    let start = CaptureTime::new(min_s, min_us).as_millis();
    let end = CaptureTime::new(max_s, max_us).as_millis();
    end.saturating_sub(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{frame_record, frames_from};
    use proptest::prelude::*;

    fn skips(playout: &GroupPlayout) -> Vec<i64> {
        playout.verdicts.iter().map(|v| v.skip).collect()
    }

    fn freezes(playout: &GroupPlayout) -> Vec<i64> {
        playout.verdicts.iter().map(|v| v.freeze).collect()
    }

    #[test]
    fn on_schedule_frames_have_no_events() {
        let playout = simulate(&frames_from(&[(0, 0), (33, 33), (66, 66)]));
        assert_eq!(skips(&playout), [0, 0, 0]);
        assert_eq!(freezes(&playout), [0, 0, 0]);
        assert_eq!(playout.lateness_ratio, 0.0);
    }

    #[test]
    fn late_second_frame_freezes_first() {
        // (rtps, times)
        let playout = simulate(&frames_from(&[(0, 0), (33, 80)]));
        assert_eq!(freezes(&playout), [47, 0]);
        assert_eq!(skips(&playout), [0, 0]);
        assert_eq!(playout.lateness_ms, 47);
        assert_eq!(playout.span_ms, 80);
        assert_eq!(playout.lateness_ratio, 47.0 / 80.0);
    }

    #[test]
    fn single_frame_is_degenerate() {
        let playout = simulate(&frames_from(&[(0, 500)]));
        assert!(playout.verdicts.is_empty());
        assert_eq!(playout.lateness_ratio, 0.0);

        assert_eq!(simulate(&[]).lateness_ratio, 0.0);
    }

    #[test]
    fn skip_overrides_recorded_freeze() {
        let playout = simulate(&frames_from(&[(0, 0), (33, 80), (66, 81), (99, 99)]));

        // frame 1 first froze for 1 ms, then the clock advanced only 1 ms
        // over a 33 ms spacing
        assert_eq!(freezes(&playout), [47, 0, 0, 0]);
        assert_eq!(skips(&playout), [0, 32, 0, 0]);
        // lateness keeps the freeze as it was when computed
        assert_eq!(playout.lateness_ms, 48);
        assert_eq!(playout.span_ms, 99);
    }

    #[test]
    fn frames_are_sorted_by_rtp_time() {
        let shuffled = frames_from(&[(66, 66), (0, 0), (33, 80)]);
        let playout = simulate(&shuffled);
        let order: Vec<i64> = playout.verdicts.iter().map(|v| v.rtps).collect();
        assert_eq!(order, [0, 33, 66]);
        assert_eq!(freezes(&playout)[0], 47);
    }

    #[test]
    fn ties_keep_input_order() {
        let playout = simulate(&frames_from(&[(10, 5), (10, 7), (10, 6)]));
        let times: Vec<i64> = playout.verdicts.iter().map(|v| v.times).collect();
        assert_eq!(times, [5, 7, 6]);
    }

    #[test]
    fn zero_span_yields_zero_ratio() {
        let mut frames = frames_from(&[(0, 0), (33, 80)]);
        for frame in &mut frames {
            frame.min_time = CaptureTime::new(1_700_000_000, 0);
            frame.max_time = CaptureTime::new(1_700_000_000, 0);
        }
        let playout = simulate(&frames);
        assert_eq!(playout.lateness_ms, 47);
        assert_eq!(playout.span_ms, 0);
        assert_eq!(playout.lateness_ratio, 0.0);
    }

    #[test]
    fn span_keeps_micros_across_second_changes() {
        let mut early = frame_record(0, 0);
        early.min_time = CaptureTime::new(10, 900_000);
        early.max_time = CaptureTime::new(11, 100_000);
        let mut late = frame_record(0, 0);
        late.min_time = CaptureTime::new(10, 200_000);
        late.max_time = CaptureTime::new(12, 50_000);

        // start 10.200; end keeps the 100_000 micros seen at second 11
        assert_eq!(capture_span_ms(&[early, late]), 1900);
    }

    #[test]
    fn span_extremes_can_come_from_different_frames() {
        let mut first = frame_record(0, 0);
        first.min_time = CaptureTime::new(11, 100);
        first.max_time = CaptureTime::new(12, 999_000);
        let mut second = frame_record(33, 33);
        second.min_time = CaptureTime::new(10, 500_000);
        second.max_time = CaptureTime::new(13, 0);

        // 13.999 - 10.000
        assert_eq!(capture_span_ms(&[first.clone(), second.clone()]), 3999);

        // simulate walks rtps order, whatever the input order
        let playout = simulate(&[second, first]);
        assert_eq!(playout.span_ms, 3999);
    }

    #[test]
    fn span_of_nothing_is_zero() {
        assert_eq!(capture_span_ms(std::iter::empty()), 0);
    }

    prop_compose! {
        fn arb_frames()(
            points in prop::collection::vec((-5_000i64..5_000, -5_000i64..5_000), 0..80)
        ) -> Vec<FrameRecord> {
            frames_from(&points)
        }
    }

    proptest! {
        #[test]
        fn prop_playout_clock_is_monotonic(frames in arb_frames()) {
            let playout = simulate(&frames);
            for pair in playout.verdicts.windows(2) {
                prop_assert!(pair[0].play_time <= pair[1].play_time);
            }
        }

        #[test]
        fn prop_skip_and_freeze_are_exclusive(frames in arb_frames()) {
            let playout = simulate(&frames);
            for verdict in &playout.verdicts {
                prop_assert!(verdict.skip == 0 || verdict.freeze == 0);
                prop_assert!(verdict.skip >= 0);
                prop_assert!(verdict.freeze >= 0);
            }
        }

        #[test]
        fn prop_one_verdict_per_frame(frames in arb_frames()) {
            let playout = simulate(&frames);
            let expected = if frames.len() < 2 { 0 } else { frames.len() };
            prop_assert_eq!(playout.verdicts.len(), expected);
            prop_assert!(playout.lateness_ratio >= 0.0);
        }

        #[test]
        fn prop_simulation_is_deterministic(frames in arb_frames()) {
            prop_assert_eq!(simulate(&frames), simulate(&frames));
        }
    }
}
