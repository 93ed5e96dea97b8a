//! In-memory feedback repository.

use crate::error::{BookingError, Result};
use crate::providers::{FeedbackFilter, FeedbackRepository};
use crate::types::{Feedback, FeedbackId, FeedbackKind, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct Store {
    rows: HashMap<FeedbackId, Feedback>,
    // Mirrors the storage unique constraint on (user, kind, reference).
    unique: HashSet<(UserId, FeedbackKind, Uuid)>,
    // Content ownership index for the inbox query.
    owners: HashMap<(FeedbackKind, Uuid), UserId>,
}

/// In-memory [`FeedbackRepository`].
///
/// Inserts check-and-record the uniqueness key under one lock, the same
/// atomicity the Postgres unique index provides.
#[derive(Clone, Default)]
pub struct InMemoryFeedback {
    store: Arc<Mutex<Store>>,
}

impl InMemoryFeedback {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register who owns a piece of referenced content, so
    /// `list_for_owner` can answer inbox queries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[allow(clippy::expect_used)]
    pub fn register_owner(&self, kind: FeedbackKind, reference_id: Uuid, owner: UserId) {
        self.store.lock().expect("feedback lock").owners.insert((kind, reference_id), owner);
    }

    /// Number of stored rows.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn len(&self) -> usize {
        self.store.lock().expect("feedback lock").rows.len()
    }

    /// Whether the repository is empty.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn is_empty(&self) -> bool {
        self.store.lock().expect("feedback lock").rows.is_empty()
    }
}

fn newest_first(mut rows: Vec<Feedback>) -> Vec<Feedback> {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

impl FeedbackRepository for InMemoryFeedback {
    #[allow(clippy::expect_used)]
    async fn feedback(&self, id: FeedbackId) -> Result<Option<Feedback>> {
        Ok(self.store.lock().expect("feedback lock").rows.get(&id).cloned())
    }

    #[allow(clippy::expect_used)]
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<()> {
        let mut store = self.store.lock().expect("feedback lock");
        let key = (feedback.user_id, feedback.kind, feedback.reference_id);
        if !store.unique.insert(key) {
            return Err(BookingError::DuplicateFeedback);
        }
        store.rows.insert(feedback.id, feedback.clone());
        Ok(())
    }

    #[allow(clippy::expect_used)]
    async fn update_feedback(&self, feedback: &Feedback) -> Result<()> {
        let mut store = self.store.lock().expect("feedback lock");
        match store.rows.get_mut(&feedback.id) {
            Some(stored) => {
                *stored = feedback.clone();
                Ok(())
            },
            None => Err(BookingError::NotFound { entity: "feedback" }),
        }
    }

    #[allow(clippy::expect_used)]
    async fn list(&self, filter: FeedbackFilter) -> Result<Vec<Feedback>> {
        let store = self.store.lock().expect("feedback lock");
        let rows = store
            .rows
            .values()
            .filter(|f| filter.kind.is_none_or(|k| f.kind == k))
            .filter(|f| filter.reference_id.is_none_or(|r| f.reference_id == r))
            .filter(|f| filter.status.is_none_or(|s| f.status == s))
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }

    #[allow(clippy::expect_used)]
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Feedback>> {
        let store = self.store.lock().expect("feedback lock");
        let rows = store
            .rows
            .values()
            .filter(|f| store.owners.get(&(f.kind, f.reference_id)) == Some(&owner))
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }
}
