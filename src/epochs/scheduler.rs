//! Deadlines derived from epoch trackers
//!
//! Remote calls that must settle before an epoch boundary get their TTL from
//! here. A missing tracker is always an error: an unbounded TTL would leave a
//! call that nothing can cancel.

use super::tracker::EpochTracker;
use super::STRIDE_EPOCH;
use crate::error::{EngineError, EngineResult};
use crate::state::Ledger;

use tracing::{debug, error};

pub fn get_epoch_tracker<'a>(ledger: &'a Ledger, identifier: &str) -> Option<&'a EpochTracker> {
    ledger.get_epoch_tracker(identifier)
}

/// Unix nanos at which the next `identifier` epoch begins
pub fn get_start_time_next_epoch(ledger: &Ledger, identifier: &str) -> EngineResult<u64> {
    match ledger.get_epoch_tracker(identifier) {
        Some(tracker) => Ok(tracker.next_epoch_start_time),
        None => {
            error!("Failed to get epoch tracker for {}", identifier);
            Err(EngineError::EpochTrackerNotFound(identifier.to_string()))
        }
    }
}

fn buffer_nanos(tracker: &EpochTracker, buffer_size: u64) -> EngineResult<u64> {
    if buffer_size == 0 {
        return Err(EngineError::InvalidBufferSize {
            buffer: buffer_size,
            duration: tracker.duration,
        });
    }
    Ok(tracker.duration / buffer_size)
}

/// Timeout for an ICA tx scoped to `identifier`: the next epoch start, less
/// `duration / buffer_size` so the outcome lands before the boundary.
pub fn ica_timeout_nanos(ledger: &Ledger, identifier: &str, buffer_size: u64) -> EngineResult<u64> {
    let tracker = ledger
        .get_epoch_tracker(identifier)
        .ok_or_else(|| EngineError::EpochTrackerNotFound(identifier.to_string()))?;

    let buffer = buffer_nanos(tracker, buffer_size)?;
    Ok(tracker.next_epoch_start_time.saturating_sub(buffer))
}

/// Whether `now` falls in the tail of the stride epoch during which queries
/// may be issued.
pub fn is_within_buffer_window(ledger: &Ledger, buffer_size: u64, now: u64) -> EngineResult<bool> {
    let tracker = ledger
        .get_epoch_tracker(STRIDE_EPOCH)
        .ok_or_else(|| EngineError::EpochTrackerNotFound(STRIDE_EPOCH.to_string()))?;

    let window_start = tracker
        .next_epoch_start_time
        .saturating_sub(buffer_nanos(tracker, buffer_size)?);
    let within = now >= window_start && now <= tracker.next_epoch_start_time;

    debug!(
        "Buffer window check: now {} window [{}, {}] -> {}",
        now, window_start, tracker.next_epoch_start_time, within
    );
    Ok(within)
}

/// Tick every tracker whose next start time has been reached. Returns the
/// trackers that started a new epoch, ordered by identifier.
pub fn advance_epochs(ledger: &mut Ledger, now: u64) -> Vec<EpochTracker> {
    let mut started = Vec::new();
    for mut tracker in ledger.all_epoch_trackers() {
        if tracker.tick(now) {
            ledger.set_epoch_tracker(tracker.clone());
            started.push(tracker);
        }
    }
    started
}
