//! # Mentorbook Testing
//!
//! Testing utilities and helpers for the Mentorbook booking platform.
//!
//! This crate provides:
//! - Mock implementations of the shared environment traits
//! - A fluent Given-When-Then harness for reducers
//! - Assertion helpers for effects
//!
//! Domain-specific in-memory providers (catalog, repositories) live in the
//! `booking` crate's `mocks` module next to the traits they fake; this crate
//! only carries what every reducer test needs.
//!
//! ## Example
//!
//! ```ignore
//! use mentorbook_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(ScheduleReducer::new())
//!     .with_env(test_env())
//!     .given_state(ScheduleState::new())
//!     .when_action(ScheduleAction::ConfirmBooking { booking_id, actor })
//!     .then_state(|state| assert!(state.booking(&booking_id).is_some()))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use mentorbook_core::environment::Clock;

pub mod reducer_test;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making notice-period and
    /// advance-window checks reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::Utc;
    /// use mentorbook_core::environment::Clock;
    /// use mentorbook_testing::mocks::FixedClock;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-06-02 09:00:00 UTC, a Monday)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-06-02T09:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_fixed() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }
}
