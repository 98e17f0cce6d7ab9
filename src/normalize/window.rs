//! Bounded clock-offset sample window

/// Bounded `(rtps, times)` sample window of one group.
///
/// Samples are appended until `capacity` is reached; after that the window
/// is frozen and its means never change.
#[derive(Debug, Clone)]
pub struct ClockOffsetWindow {
    rtps: Vec<u64>,
    times: Vec<u64>,
    capacity: usize,
}

impl ClockOffsetWindow {
    pub fn new(capacity: usize) -> Self {
        Self { rtps: Vec::with_capacity(capacity), times: Vec::with_capacity(capacity), capacity }
    }

    /// Append a sample if there is room. Returns whether it was kept.
    pub fn push(&mut self, rtps: u64, times: u64) -> bool {
        if self.is_saturated() {
            return false;
        }
        self.rtps.push(rtps);
        self.times.push(times);
        true
    }

    pub fn len(&self) -> usize {
        self.rtps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rtps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_saturated(&self) -> bool {
        self.rtps.len() >= self.capacity
    }

    /// Truncating integer mean of the RTP-derived samples.
    pub fn mean_rtps(&self) -> u64 {
        truncated_mean(&self.rtps)
    }

    /// Truncating integer mean of the wall-clock samples.
    pub fn mean_times(&self) -> u64 {
        truncated_mean(&self.times)
    }

    pub fn samples(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.rtps.iter().copied().zip(self.times.iter().copied())
    }
}

fn truncated_mean(values: &[u64]) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let sum: u128 = values.iter().map(|&v| u128::from(v)).sum();
    (sum / values.len() as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn means_truncate() {
        let mut window = ClockOffsetWindow::new(4);
        assert_eq!(window.mean_rtps(), 0);

        window.push(1, 10);
        window.push(2, 11);
        assert_eq!(window.mean_rtps(), 1);
        assert_eq!(window.mean_times(), 10);
    }

    #[test]
    fn window_freezes_at_capacity() {
        let mut window = ClockOffsetWindow::new(2);
        assert!(window.push(10, 100));
        assert!(window.push(20, 200));
        assert!(window.is_saturated());
        assert!(!window.push(1_000, 10_000));

        assert_eq!(window.len(), 2);
        assert_eq!(window.mean_rtps(), 15);
        assert_eq!(window.mean_times(), 150);
        assert_eq!(window.samples().collect::<Vec<_>>(), vec![(10, 100), (20, 200)]);
    }
}
