//! Session identity types

use serde::{Deserialize, Serialize};
use std::fmt;

use super::FiveTuple;

/// Kind of media carried by a session, derived from the packet media tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaType {
    Audio,
    Video,
    Other(u8),
}

impl MediaType {
    /// Single-character code used in the session logs.
    pub fn as_char(self) -> char {
        match self {
            MediaType::Audio => 'a',
            MediaType::Video => 'v',
            MediaType::Other(_) => 'o',
        }
    }
}

/// Primary media stream or its redundancy (FEC) companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Media,
    Fec,
}

impl StreamType {
    pub fn as_char(self) -> char {
        match self {
            StreamType::Media => 'm',
            StreamType::Fec => 'f',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'm' => Some(StreamType::Media),
            'f' => Some(StreamType::Fec),
            _ => None,
        }
    }
}

/// Identifies one logical RTP media session for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub five_tuple: FiveTuple,
    pub ssrc: u32,
    pub media_type: MediaType,
    pub stream_type: StreamType,
}

impl SessionKey {
    /// Projection used for analysis grouping: media and stream type are dropped.
    pub fn group_key(&self) -> GroupKey {
        GroupKey { five_tuple: self.five_tuple, ssrc: self.ssrc }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ssrc={} {}{}",
            self.five_tuple,
            self.ssrc,
            self.media_type.as_char(),
            self.stream_type.as_char()
        )
    }
}

/// Five-tuple plus SSRC; the unit that receives a [`GroupId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub five_tuple: FiveTuple,
    pub ssrc: u32,
}

/// Sequential analysis group identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
