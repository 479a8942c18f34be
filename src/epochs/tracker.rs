//! Epoch trackers

use serde::{Deserialize, Serialize};

/// A named logical clock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochTracker {
    pub epoch_identifier: String,
    pub epoch_number: u64,
    /// Unix nanos at which the next epoch begins
    pub next_epoch_start_time: u64,
    /// Epoch length in nanos
    pub duration: u64,
}

impl EpochTracker {
    pub fn new(identifier: impl Into<String>, epoch_number: u64, next_epoch_start_time: u64, duration: u64) -> Self {
        Self {
            epoch_identifier: identifier.into(),
            epoch_number,
            next_epoch_start_time,
            duration,
        }
    }

    /// Advance by one epoch if `now` has reached the next start time.
    ///
    /// At most one tick per call; a tracker that fell several epochs behind
    /// catches up one block at a time.
    pub fn tick(&mut self, now: u64) -> bool {
        if self.duration == 0 || now < self.next_epoch_start_time {
            return false;
        }
        self.epoch_number += 1;
        self.next_epoch_start_time = self.next_epoch_start_time.saturating_add(self.duration);
        true
    }

    /// Unix nanos at which the current epoch started
    pub fn current_epoch_start_time(&self) -> u64 {
        self.next_epoch_start_time.saturating_sub(self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_is_monotonic() {
        let mut tracker = EpochTracker::new("day", 1, 100, 50);
        assert!(!tracker.tick(99));
        assert!(tracker.tick(100));
        assert_eq!(tracker.epoch_number, 2);
        assert_eq!(tracker.next_epoch_start_time, 150);

        // far behind: one tick per call
        assert!(tracker.tick(1_000));
        assert_eq!(tracker.epoch_number, 3);
        assert_eq!(tracker.next_epoch_start_time, 200);
    }

    #[test]
    fn test_zero_duration_never_ticks() {
        let mut tracker = EpochTracker::new("broken", 1, 0, 0);
        assert!(!tracker.tick(u64::MAX));
        assert_eq!(tracker.epoch_number, 1);
    }
}
