//! Cooperative cancellation, checked before every outbound call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Phase, SyncError};

/// A cloneable stop signal with an optional deadline.
///
/// A call already in flight is never interrupted; it finishes or times out on
/// its own, and the run stops before the next one.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    /// Signals every clone.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub(crate) fn check(&self, phase: Phase) -> Result<(), SyncError> {
        if self.is_cancelled() {
            return Err(SyncError::Cancelled { phase });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_reaches_clones() {
        let cancel = Cancellation::new();
        let clone = cancel.clone();
        assert!(!clone.is_cancelled());
        cancel.cancel();
        assert!(clone.is_cancelled());
        assert!(matches!(
            clone.check(Phase::Teams),
            Err(SyncError::Cancelled { phase: Phase::Teams })
        ));
    }

    #[test]
    fn past_deadline_is_cancelled() {
        let cancel = Cancellation::with_deadline(Instant::now());
        assert!(cancel.is_cancelled());
        assert!(!Cancellation::with_timeout(Duration::from_secs(3600)).is_cancelled());
    }

    #[test]
    fn unrepresentable_timeout_means_no_deadline() {
        let cancel = Cancellation::with_timeout(Duration::from_secs(u64::MAX));
        assert!(!cancel.is_cancelled());
        assert!(cancel.check(Phase::Robots).is_ok());
        cancel.cancel();
        assert!(cancel.is_cancelled());
    }
}
