//! Cooperative cancellation

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use crate::error::{Error, Result};

/// Shared flag checked between page steps and between batch documents.
///
/// Cloning shares the flag and the step counter. A step already in progress
/// always finishes.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    /// Checks passed so far
    steps: Arc<AtomicUsize>,
    /// Cancel once this many checks have passed
    limit: Arc<AtomicUsize>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            steps: Arc::new(AtomicUsize::new(0)),
            limit: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that cancels itself after `steps` successful checks.
    pub fn after_steps(steps: usize) -> Self {
        let token = Self::default();
        token.limit.store(steps, Ordering::SeqCst);
        token
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Number of checks that have passed
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once [`cancel`](Self::cancel) has been called
    /// or the step limit is used up.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.steps.load(Ordering::SeqCst) >= self.limit.load(Ordering::SeqCst) {
            self.cancel();
            return Err(Error::Cancelled);
        }
        self.steps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_step_limit() {
        let token = CancelToken::after_steps(2);
        assert!(token.check().is_ok());
        assert!(token.check().is_ok());
        assert_eq!(token.steps(), 2);
        assert!(matches!(token.check(), Err(Error::Cancelled)));
        assert!(token.is_cancelled());
    }
}
