//! Progress reporting and cooperative cancellation for long-running
//! operations.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Receives progress from a long-running operation.
///
/// Operations call [`ProgressListener::is_canceled`] between units of work
/// and stop with [`crate::IndexError::Canceled`] when it returns `true`.
pub trait ProgressListener: Send + Sync {
    fn started(&self) {}

    /// `percent` is in `0.0..=100.0`.
    fn progress(&self, _percent: f32) {}

    fn complete(&self) {}

    fn is_canceled(&self) -> bool {
        false
    }
}

/// Ignores all progress and never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProgress;

impl ProgressListener for NullProgress {}

/// Records the last reported progress and carries a cancel flag that may be
/// raised from another thread.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    started: AtomicBool,
    completed: AtomicBool,
    canceled: AtomicBool,
    percent: AtomicU32,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the running operation to stop at its next check.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_complete(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    /// Last reported percentage.
    pub fn percent(&self) -> f32 {
        f32::from_bits(self.percent.load(Ordering::SeqCst))
    }
}

impl ProgressListener for ProgressTracker {
    fn started(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    fn progress(&self, percent: f32) {
        self.percent.store(percent.to_bits(), Ordering::SeqCst);
    }

    fn complete(&self) {
        self.completed.store(true, Ordering::SeqCst);
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

/// Percentage of `done` out of `total`, capped at 100. A zero total counts
/// as finished.
pub(crate) fn percent_of(done: usize, total: usize) -> f32 {
    if total == 0 {
        return 100.0;
    }
    ((done as f32 / total as f32) * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_records_lifecycle() {
        let tracker = ProgressTracker::new();
        assert!(!tracker.is_started());
        tracker.started();
        tracker.progress(42.5);
        tracker.complete();
        assert!(tracker.is_started());
        assert!(tracker.is_complete());
        assert_eq!(tracker.percent(), 42.5);
    }

    #[test]
    fn cancel_is_visible_to_listener() {
        let tracker = ProgressTracker::new();
        assert!(!tracker.is_canceled());
        tracker.cancel();
        assert!(tracker.is_canceled());
        assert!(!NullProgress.is_canceled());
    }

    #[test]
    fn percent_of_bounds() {
        assert_eq!(percent_of(0, 0), 100.0);
        assert_eq!(percent_of(1, 4), 25.0);
        assert_eq!(percent_of(9, 4), 100.0);
    }
}
