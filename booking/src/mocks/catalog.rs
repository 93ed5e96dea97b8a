//! In-memory offering catalog.

use crate::error::Result;
use crate::providers::OfferingCatalog;
use crate::types::{Offering, OfferingId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory [`OfferingCatalog`].
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    offerings: Arc<Mutex<HashMap<OfferingId, Offering>>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an offering.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[allow(clippy::expect_used)]
    pub fn put(&self, offering: Offering) {
        self.offerings.lock().expect("catalog lock").insert(offering.id, offering);
    }
}

impl OfferingCatalog for InMemoryCatalog {
    #[allow(clippy::expect_used)]
    async fn offering(&self, id: OfferingId) -> Result<Option<Offering>> {
        Ok(self.offerings.lock().expect("catalog lock").get(&id).cloned())
    }

    #[allow(clippy::expect_used)]
    async fn offerings_for_mentor(&self, mentor: UserId) -> Result<Vec<Offering>> {
        Ok(self
            .offerings
            .lock()
            .expect("catalog lock")
            .values()
            .filter(|o| o.mentor_id == mentor)
            .cloned()
            .collect())
    }
}
