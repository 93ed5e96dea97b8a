//! Availability store trait.

use crate::error::Result;
use crate::types::{AvailabilitySlot, UserId};
use std::future::Future;

/// Weekly availability windows per mentor.
pub trait AvailabilityStore: Send + Sync {
    /// The mentor's windows, ordered by `(day_of_week, start_time)`.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn slots_for_mentor(&self, mentor: UserId)
    -> impl Future<Output = Result<Vec<AvailabilitySlot>>> + Send;

    /// Replace the mentor's windows wholesale and return the stored set.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn replace_slots(
        &self,
        mentor: UserId,
        slots: Vec<AvailabilitySlot>,
    ) -> impl Future<Output = Result<Vec<AvailabilitySlot>>> + Send;
}
