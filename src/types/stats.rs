//! Per-session transport statistics

/// Running counters reported by a frame accumulator on its stats cadence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamStats {
    pub total_pkts: u64,
    pub total_bytes: u64,
    pub lost_pkts: u64,
    pub duplicate_pkts: u64,
    pub out_of_order_pkts: u64,
    pub total_frames: u64,
    pub total_frame_bytes: u64,
    pub jitter_sum_ms: f64,
    pub jitter_samples: u64,
}

impl StreamStats {
    /// Mean payload bytes per completed frame, 0 without frames.
    pub fn mean_frame_size(&self) -> u64 {
        if self.total_frames == 0 { 0 } else { self.total_frame_bytes / self.total_frames }
    }

    /// Mean of the per-packet jitter samples in ms, 0 without samples.
    pub fn mean_jitter(&self) -> f64 {
        if self.jitter_samples == 0 {
            0.0
        } else {
            self.jitter_sum_ms / self.jitter_samples as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn means_handle_empty_counters() {
        let stats = StreamStats::default();
        assert_eq!(stats.mean_frame_size(), 0);
        assert_eq!(stats.mean_jitter(), 0.0);
    }

    #[test]
    fn means_divide_totals() {
        let stats = StreamStats {
            total_frames: 4,
            total_frame_bytes: 4100,
            jitter_sum_ms: 3.0,
            jitter_samples: 2,
            ..Default::default()
        };
        assert_eq!(stats.mean_frame_size(), 1025);
        assert_eq!(stats.mean_jitter(), 1.5);
    }
}
