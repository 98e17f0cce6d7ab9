//! Per-session state and the callback seam to frame accumulators.
//!
//! A frame accumulator turns a session's packets into frames and periodic
//! transport statistics. It reports both through a [`FrameSink`], which the
//! analyzer implements. Everything runs synchronously on the ingesting
//! thread, in packet order.

pub mod accumulator;
pub mod registry;

pub use accumulator::{AccumulatorFactory, FrameAccumulator, RtpAccumulatorFactory, RtpFrameAccumulator};
pub use registry::{SessionRegistry, SessionState};

use crate::types::{CompletedFrame, SessionKey, StreamStats};

/// Session metadata handed to every callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMeta {
    pub key: SessionKey,
    /// RTP clock rate in Hz
    pub sampling_rate: u32,
}

/// Receiver of accumulator output.
pub trait FrameSink {
    /// Called once per fully reassembled frame.
    fn on_frame(&mut self, session: &SessionMeta, frame: &CompletedFrame);

    /// Called on the accumulator's statistics cadence.
    ///
    /// `timestamp` is the capture time in seconds that triggered the report.
    fn on_stats(
        &mut self,
        session: &SessionMeta,
        report_count: u32,
        timestamp: u64,
        stats: &StreamStats,
    );
}
