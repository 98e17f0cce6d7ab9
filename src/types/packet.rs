//! Parsed packet records handed over by the capture layer

use super::{CaptureTime, FiveTuple, StreamType};

/// One already-parsed RTP packet.
///
/// Field extraction (IP/UDP/RTP headers, application media tags) happens in
/// the capture layer; the analyzer only reads these values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRecord {
    pub captured: CaptureTime,
    pub five_tuple: FiveTuple,
    pub ssrc: u32,
    /// Application-level media type tag (e.g. 15 audio, 16 video).
    pub media_tag: u8,
    pub stream_type: StreamType,
    pub payload_type: u8,
    pub sequence: u16,
    pub rtp_timestamp: u32,
    pub payload_len: u32,
    pub ext: [u8; 3],
    /// Number of packets the sender announced for this packet's frame.
    pub packets_hint: Option<u16>,
}

/// Metadata of the first packet of a frame, forwarded with the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketMeta {
    pub media_tag: u8,
    pub ext: [u8; 3],
    pub packets_hint: Option<u16>,
}

impl From<&PacketRecord> for PacketMeta {
    fn from(packet: &PacketRecord) -> Self {
        Self { media_tag: packet.media_tag, ext: packet.ext, packets_hint: packet.packets_hint }
    }
}
