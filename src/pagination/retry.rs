use std::time::Duration;

use super::{FALLBACK_COLUMN_WIDTH, LAYOUT_RETRY_DELAY, MAX_LAYOUT_RETRIES};

/// Bounded remeasurement policy for an unmeasurable viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    /// Width used provisionally while retrying and permanently once retries run out
    pub fallback_width: f32,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based), or `None` when the budget is spent
    #[must_use]
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then_some(self.delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_LAYOUT_RETRIES,
            delay: LAYOUT_RETRY_DELAY,
            fallback_width: FALLBACK_COLUMN_WIDTH,
        }
    }
}
