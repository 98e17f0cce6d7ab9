//! Core types for capture analysis.
//!
//! ## Architecture
//!
//! - [`PacketRecord`] is the parsed packet handed over by the capture layer
//! - [`SessionKey`] identifies one RTP media session, [`GroupKey`] its
//!   five-tuple + SSRC projection that receives a [`GroupId`]
//! - [`CompletedFrame`] is a reassembled frame reported by an accumulator
//! - [`FrameRecord`] is the normalized, exported frame row
//! - [`StreamStats`] carries the periodic transport counters
//!
//! ## Usage Example
//!
//! ```rust
//! use rtp_playout::types::{FiveTuple, MediaType, SessionKey, StreamType};
//! use std::net::Ipv4Addr;
//!
//! let flow = FiveTuple::udp(Ipv4Addr::new(10, 0, 0, 1), 8801, Ipv4Addr::new(10, 0, 0, 2), 50000);
//! let video = SessionKey { five_tuple: flow, ssrc: 7, media_type: MediaType::Video, stream_type: StreamType::Media };
//! let fec = SessionKey { stream_type: StreamType::Fec, ..video };
//!
//! assert_ne!(video, fec);
//! assert_eq!(video.group_key(), fec.group_key());
//! ```

mod capture_time;
mod five_tuple;
mod frame;
mod packet;
mod session_key;
mod stats;

pub use capture_time::CaptureTime;
pub use five_tuple::{FiveTuple, IPPROTO_UDP};
pub use frame::{CompletedFrame, FrameRecord};
pub use packet::{PacketMeta, PacketRecord};
pub use session_key::{GroupId, GroupKey, MediaType, SessionKey, StreamType};
pub use stats::StreamStats;
