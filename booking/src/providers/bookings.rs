//! Booking repository trait.

use crate::error::Result;
use crate::schedule::BufferedSpan;
use crate::types::{Booking, BookingId, BookingStatus, UserId};
use std::future::Future;

/// Booking persistence.
///
/// The conflict invariant is the *store's* to enforce: `insert_booking`
/// must be atomic with respect to concurrent inserts for the same mentor, so two
/// racing creations for overlapping buffered spans resolve to one row and
/// one `SlotConflict`. An application-level check-then-insert is not an
/// acceptable implementation.
pub trait BookingRepository: Send + Sync {
    /// Look up a single booking.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn booking(&self, id: BookingId) -> impl Future<Output = Result<Option<Booking>>> + Send;

    /// The mentor's pending and confirmed bookings (the set that occupies
    /// calendar slots).
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn active_for_mentor(&self, mentor: UserId)
    -> impl Future<Output = Result<Vec<Booking>>> + Send;

    /// Every booking the user participates in, as mentor or mentee,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn bookings_for_user(&self, user: UserId)
    -> impl Future<Output = Result<Vec<Booking>>> + Send;

    /// Insert a new booking together with its buffered span.
    ///
    /// # Errors
    ///
    /// Returns `SlotConflict` when the span overlaps an existing pending
    /// or confirmed booking for the same mentor (storage constraint), and
    /// `Unavailable`/`Timeout` for infrastructure failures.
    fn insert_booking(
        &self,
        booking: &Booking,
        span: BufferedSpan,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Persist an updated booking, guarded by the status the caller read.
    ///
    /// Returns `false` when no row matched `(id, expected_status)`: a
    /// concurrent transition won and the caller must re-evaluate against
    /// fresh state.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn update_booking(
        &self,
        booking: &Booking,
        expected_status: BookingStatus,
    ) -> impl Future<Output = Result<bool>> + Send;
}
