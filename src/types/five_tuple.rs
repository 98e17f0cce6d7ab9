//! Transport flow identity

use std::fmt;
use std::net::Ipv4Addr;

/// IP protocol number for UDP, the transport RTP media runs over.
pub const IPPROTO_UDP: u8 = 17;

/// Transport five-tuple of an IPv4 flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiveTuple {
    pub protocol: u8,
    pub src: Ipv4Addr,
    pub src_port: u16,
    pub dst: Ipv4Addr,
    pub dst_port: u16,
}

impl FiveTuple {
    /// UDP flow between two endpoints.
    pub fn udp(src: Ipv4Addr, src_port: u16, dst: Ipv4Addr, dst_port: u16) -> Self {
        Self { protocol: IPPROTO_UDP, src, src_port, dst, dst_port }
    }
}

impl fmt::Display for FiveTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} (proto {})",
            self.src, self.src_port, self.dst, self.dst_port, self.protocol
        )
    }
}
