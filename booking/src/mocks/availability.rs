//! In-memory availability store.

use crate::error::Result;
use crate::providers::AvailabilityStore;
use crate::types::{AvailabilitySlot, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory [`AvailabilityStore`].
#[derive(Clone, Default)]
pub struct InMemoryAvailability {
    slots: Arc<Mutex<HashMap<UserId, Vec<AvailabilitySlot>>>>,
}

impl InMemoryAvailability {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a mentor's availability.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[allow(clippy::expect_used)]
    pub fn put(&self, mentor: UserId, slots: Vec<AvailabilitySlot>) {
        self.slots.lock().expect("availability lock").insert(mentor, slots);
    }
}

fn ordered(mut slots: Vec<AvailabilitySlot>) -> Vec<AvailabilitySlot> {
    slots.sort_by_key(|s| (s.day_of_week, s.start_time));
    slots
}

impl AvailabilityStore for InMemoryAvailability {
    #[allow(clippy::expect_used)]
    async fn slots_for_mentor(&self, mentor: UserId) -> Result<Vec<AvailabilitySlot>> {
        Ok(ordered(
            self.slots
                .lock()
                .expect("availability lock")
                .get(&mentor)
                .cloned()
                .unwrap_or_default(),
        ))
    }

    #[allow(clippy::expect_used)]
    async fn replace_slots(
        &self,
        mentor: UserId,
        slots: Vec<AvailabilitySlot>,
    ) -> Result<Vec<AvailabilitySlot>> {
        let stored = ordered(slots);
        self.slots.lock().expect("availability lock").insert(mentor, stored.clone());
        Ok(stored)
    }
}
