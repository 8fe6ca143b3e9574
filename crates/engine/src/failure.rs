// In crates/engine/src/failure.rs

/// Counts consecutive failed cycles.
///
/// An alert is due when the count reaches the threshold and again at every
/// further multiple of it, so a long outage keeps reminding the operator
/// without alerting on every cycle.
#[derive(Debug, Clone)]
pub struct FailureTracker {
    threshold: u32,
    consecutive: u32,
}

impl FailureTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: 0,
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Resets the count. Returns the length of the streak that just ended.
    pub fn record_success(&mut self) -> u32 {
        std::mem::take(&mut self.consecutive)
    }

    /// Counts a failure. Returns the streak length when an alert is due.
    pub fn record_failure(&mut self) -> Option<u32> {
        self.consecutive = self.consecutive.saturating_add(1);
        (self.consecutive % self.threshold == 0).then_some(self.consecutive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alerts_at_threshold_and_each_multiple() {
        let mut tracker = FailureTracker::new(3);
        let alerts: Vec<_> = (0..7).map(|_| tracker.record_failure()).collect();
        assert_eq!(alerts, vec![None, None, Some(3), None, None, Some(6), None]);
    }

    #[test]
    fn success_resets_the_streak() {
        let mut tracker = FailureTracker::new(2);
        tracker.record_failure();
        assert_eq!(tracker.record_success(), 1);
        assert_eq!(tracker.consecutive(), 0);
        assert_eq!(tracker.record_failure(), None);
        assert_eq!(tracker.record_failure(), Some(2));
    }

    #[test]
    fn threshold_of_one_alerts_every_failure() {
        let mut tracker = FailureTracker::new(1);
        assert_eq!(tracker.record_failure(), Some(1));
        assert_eq!(tracker.record_failure(), Some(2));
    }
}
