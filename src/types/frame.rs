//! Frame-level records
//!
//! A [`CompletedFrame`] is what a frame accumulator reports once all packets
//! sharing an RTP timestamp have been seen. A [`FrameRecord`] is the normalized
//! row the analyzer exports for it; it is the hand-off between frame
//! extraction and playout simulation.

use super::{CaptureTime, FiveTuple, GroupId, PacketMeta};

/// A fully reassembled frame, as reported by a frame accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedFrame {
    pub rtp_timestamp: u32,
    /// Earliest capture time among the frame's packets
    pub min_time: CaptureTime,
    /// Latest capture time among the frame's packets
    pub max_time: CaptureTime,
    pub packets_seen: u32,
    pub total_payload_len: u64,
    /// Instantaneous frame rate from the previous frame's RTP spacing
    pub fps: u32,
    /// Interarrival jitter estimate in milliseconds
    pub jitter_ms: f64,
    pub first_packet: PacketMeta,
}

/// One normalized frame row.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub five_tuple: FiveTuple,
    pub ssrc: u32,
    pub media_tag: u8,
    pub ext: [u8; 3],
    pub min_time: CaptureTime,
    pub max_time: CaptureTime,
    pub rtp_timestamp: u32,
    pub packets_seen: u32,
    pub packets_hint: u32,
    pub total_payload_len: u64,
    pub fps: u32,
    pub jitter_ms: f64,
    /// Capture time in ms, minus the group's mean capture time
    pub times: i64,
    /// RTP time in ms, minus the group's mean RTP time
    pub rtps: i64,
    /// `times - rtps`
    pub clock_diff: i64,
    pub group_id: GroupId,
}
