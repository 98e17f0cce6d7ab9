//! Packet capture timestamps

use std::fmt;

/// Capture timestamp as recorded by the packet capture layer.
///
/// Ordering is by seconds, then microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaptureTime {
    pub secs: u64,
    pub micros: u32,
}

impl CaptureTime {
    pub fn new(secs: u64, micros: u32) -> Self {
        Self { secs, micros }
    }

    /// Wall-clock milliseconds, truncating sub-millisecond precision.
    /// Saturates at `u64::MAX`.
    pub fn as_millis(&self) -> u64 {
        self.secs.saturating_mul(1000).saturating_add(u64::from(self.micros) / 1000)
    }

    /// Build a capture time from milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Self { secs: millis / 1000, micros: ((millis % 1000) * 1000) as u32 }
    }

    /// Microseconds since the epoch, used for RTP-unit arrival math.
    pub fn as_micros(&self) -> u128 {
        u128::from(self.secs) * 1_000_000 + u128::from(self.micros)
    }
}

impl fmt::Display for CaptureTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_truncate_micros() {
        assert_eq!(CaptureTime::new(1, 999_999).as_millis(), 1999);
        assert_eq!(CaptureTime::new(0, 999).as_millis(), 0);
        assert_eq!(CaptureTime::from_millis(1_700_000_000_123).micros, 123_000);
    }

    #[test]
    fn millis_saturate_on_huge_seconds() {
        assert_eq!(CaptureTime::new(u64::MAX, 999_999).as_millis(), u64::MAX);
        assert_eq!(CaptureTime::new(u64::MAX / 1000, 999_999).as_millis(), u64::MAX);
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(CaptureTime::new(1, 900_000) < CaptureTime::new(2, 0));
        assert!(CaptureTime::new(2, 1) > CaptureTime::new(2, 0));
    }
}
