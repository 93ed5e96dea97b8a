//! In-memory booking repository.

use crate::error::{BookingError, Result};
use crate::providers::BookingRepository;
use crate::schedule::BufferedSpan;
use crate::types::{Booking, BookingId, BookingStatus, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory [`BookingRepository`].
///
/// `insert` performs the overlap check and the insert under one lock,
/// which is exactly the atomicity the Postgres exclusion constraint
/// provides: two racing creations resolve to one row and one
/// `SlotConflict`.
#[derive(Clone, Default)]
pub struct InMemoryBookings {
    rows: Arc<Mutex<HashMap<BookingId, (Booking, BufferedSpan)>>>,
}

impl InMemoryBookings {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bookings.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn len(&self) -> usize {
        self.rows.lock().expect("booking lock").len()
    }

    /// Whether the repository is empty.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn is_empty(&self) -> bool {
        self.rows.lock().expect("booking lock").is_empty()
    }

    /// The stored spans for a mentor's slot-occupying bookings.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn occupied_spans(&self, mentor: UserId) -> Vec<BufferedSpan> {
        self.rows
            .lock()
            .expect("booking lock")
            .values()
            .filter(|(b, _)| b.mentor_id == mentor && b.occupies_slot())
            .map(|(_, span)| *span)
            .collect()
    }
}

impl BookingRepository for InMemoryBookings {
    #[allow(clippy::expect_used)]
    async fn booking(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.rows.lock().expect("booking lock").get(&id).map(|(b, _)| b.clone()))
    }

    #[allow(clippy::expect_used)]
    async fn active_for_mentor(&self, mentor: UserId) -> Result<Vec<Booking>> {
        Ok(self
            .rows
            .lock()
            .expect("booking lock")
            .values()
            .filter(|(b, _)| b.mentor_id == mentor && b.occupies_slot())
            .map(|(b, _)| b.clone())
            .collect())
    }

    #[allow(clippy::expect_used)]
    async fn bookings_for_user(&self, user: UserId) -> Result<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .rows
            .lock()
            .expect("booking lock")
            .values()
            .filter(|(b, _)| b.mentor_id == user || b.mentee_id == user)
            .map(|(b, _)| b.clone())
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    #[allow(clippy::expect_used)]
    async fn insert_booking(&self, booking: &Booking, span: BufferedSpan) -> Result<()> {
        let mut rows = self.rows.lock().expect("booking lock");

        let conflict = rows.values().any(|(existing, existing_span)| {
            existing.mentor_id == booking.mentor_id
                && existing.occupies_slot()
                && existing_span.overlaps(&span)
        });
        if conflict {
            return Err(BookingError::SlotConflict);
        }

        rows.insert(booking.id, (booking.clone(), span));
        Ok(())
    }

    #[allow(clippy::expect_used)]
    async fn update_booking(&self, booking: &Booking, expected_status: BookingStatus) -> Result<bool> {
        let mut rows = self.rows.lock().expect("booking lock");
        match rows.get_mut(&booking.id) {
            Some((stored, _)) if stored.status == expected_status => {
                *stored = booking.clone();
                Ok(true)
            },
            Some(_) => Ok(false),
            None => Ok(false),
        }
    }
}
