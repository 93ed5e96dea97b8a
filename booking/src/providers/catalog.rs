//! Offering catalog trait.

use crate::error::Result;
use crate::types::{Offering, OfferingId, UserId};
use std::future::Future;

/// Offering catalog.
///
/// Read-only from the booking core's perspective: offerings are authored
/// elsewhere; this core only consults their booking rules.
pub trait OfferingCatalog: Send + Sync {
    /// Look up a single offering.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn offering(&self, id: OfferingId) -> impl Future<Output = Result<Option<Offering>>> + Send;

    /// All offerings owned by a mentor (any status). Conflict detection
    /// needs the buffers of every offering the mentor's open bookings
    /// reference.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn offerings_for_mentor(&self, mentor: UserId)
    -> impl Future<Output = Result<Vec<Offering>>> + Send;
}
