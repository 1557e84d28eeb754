use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::{Error, Result};

/// Failures tolerated by [`Fail::default`].
pub const DEFAULT_MAX_FAILURES: u32 = 10;

/// Counts consecutive failures of a retry loop and tells it when to give up.
///
/// ```
/// use std::time::Duration;
/// use fanfou::Fail;
///
/// let mut fail = Fail::new(2);
/// assert!(fail.wait(Duration::from_millis(0)).is_ok());
/// assert!(fail.wait(Duration::from_millis(0)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fail {
    max: u32,
    remaining: u32,
}

impl Fail {
    pub fn new(max: u32) -> Self {
        Fail {
            max,
            remaining: max,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Record one failure.
    ///
    /// # Errors
    ///
    /// [`Error::TooManyFailures`] once the budget is used up.
    pub fn count(&mut self) -> Result<()> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            return Err(Error::TooManyFailures(self.max));
        }
        Ok(())
    }

    /// Record one failure, then sleep for `delay` before the next attempt.
    pub fn wait(&mut self, delay: Duration) -> Result<()> {
        self.count()?;
        warn!(
            remaining = self.remaining,
            delay_ms = delay.as_millis() as u64,
            "retrying after failure"
        );
        thread::sleep(delay);
        Ok(())
    }

    /// Start over after a success.
    pub fn reset(&mut self) {
        self.remaining = self.max;
    }
}

impl Default for Fail {
    fn default() -> Self {
        Fail::new(DEFAULT_MAX_FAILURES)
    }
}
