//! Wall-clock budget shared by all operations of a manager.
//!
//! The budget is only consulted between top-level calls: a running operation
//! is never interrupted.

use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct TimeBudget {
    start: Cell<Instant>,
    limit: Cell<Option<Duration>>,
}

impl TimeBudget {
    /// An unlimited budget starting now.
    pub fn new() -> Self {
        Self {
            start: Cell::new(Instant::now()),
            limit: Cell::new(None),
        }
    }

    pub fn set_limit(&self, limit: Duration) {
        self.limit.set(Some(limit));
    }

    pub fn unset_limit(&self) {
        self.limit.set(None);
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit.get()
    }

    /// Restart the clock.
    pub fn reset_start(&self) {
        self.start.set(Instant::now());
    }

    pub fn elapsed(&self) -> Duration {
        self.start.get().elapsed()
    }

    /// Fail with [`Error::TimeLimitExceeded`] once the limit has passed.
    pub fn check(&self) -> Result<()> {
        if let Some(limit) = self.limit.get() {
            let elapsed = self.elapsed();
            if elapsed > limit {
                log::warn!(
                    "Time limit exceeded: {} ms elapsed, limit is {} ms",
                    elapsed.as_millis(),
                    limit.as_millis()
                );
                return Err(Error::TimeLimitExceeded { limit, elapsed });
            }
        }
        Ok(())
    }
}

impl Default for TimeBudget {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;

    use super::*;

    #[test]
    fn test_unlimited() {
        let budget = TimeBudget::new();
        assert_eq!(budget.limit(), None);
        assert!(budget.check().is_ok());
    }

    #[test]
    fn test_expired() {
        let budget = TimeBudget::new();
        budget.set_limit(Duration::from_millis(1));
        sleep(Duration::from_millis(5));
        match budget.check() {
            Err(Error::TimeLimitExceeded { limit, elapsed }) => {
                assert_eq!(limit, Duration::from_millis(1));
                assert!(elapsed > limit);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reset_and_unset() {
        let budget = TimeBudget::new();
        budget.set_limit(Duration::from_millis(1));
        sleep(Duration::from_millis(5));
        assert!(budget.check().is_err());

        budget.set_limit(Duration::from_secs(3600));
        budget.reset_start();
        assert!(budget.check().is_ok());

        budget.set_limit(Duration::ZERO);
        sleep(Duration::from_millis(1));
        assert!(budget.check().is_err());
        budget.unset_limit();
        assert!(budget.check().is_ok());
    }
}
