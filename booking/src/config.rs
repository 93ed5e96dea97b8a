//! Booking service configuration.
//!
//! Booking *rules* (notice, buffers, caps) live on each offering; this
//! configuration only carries the shell's infrastructure knobs.

use mentorbook_runtime::retry::RetryPolicy;
use std::time::Duration;

/// Configuration for the booking service shell.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Deadline applied to every provider call.
    ///
    /// Default: 5 seconds
    pub provider_deadline: Duration,

    /// Retry policy for provider reads. Writes, in particular the
    /// conflict-checked booking insert, are never retried.
    ///
    /// Default: one retry with backoff
    pub read_retry: RetryPolicy,
}

impl BookingConfig {
    /// Create a configuration with the default knobs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider_deadline: Duration::from_secs(5),
            read_retry: RetryPolicy::default(),
        }
    }

    /// Set the provider call deadline.
    #[must_use]
    pub const fn with_provider_deadline(mut self, deadline: Duration) -> Self {
        self.provider_deadline = deadline;
        self
    }

    /// Set the read retry policy.
    #[must_use]
    pub fn with_read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self::new()
    }
}
