//! In-memory content and profile directories.

use crate::error::Result;
use crate::providers::{ContentDirectory, ProfileDirectory};
use crate::types::{FeedbackKind, UserId, UserProfile};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory [`ContentDirectory`] and [`ProfileDirectory`].
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    owners: Arc<Mutex<HashMap<(FeedbackKind, Uuid), UserId>>>,
    profiles: Arc<Mutex<HashMap<UserId, UserProfile>>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a referenceable item and its owner.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[allow(clippy::expect_used)]
    pub fn register(&self, kind: FeedbackKind, reference_id: Uuid, owner: UserId) {
        self.owners.lock().expect("directory lock").insert((kind, reference_id), owner);
    }

    /// Register a display profile.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[allow(clippy::expect_used)]
    pub fn put_profile(&self, profile: UserProfile) {
        self.profiles.lock().expect("directory lock").insert(profile.user_id, profile);
    }
}

impl ContentDirectory for InMemoryDirectory {
    #[allow(clippy::expect_used)]
    async fn reference_exists(&self, kind: FeedbackKind, reference_id: Uuid) -> Result<bool> {
        Ok(self.owners.lock().expect("directory lock").contains_key(&(kind, reference_id)))
    }

    #[allow(clippy::expect_used)]
    async fn owner_of(&self, kind: FeedbackKind, reference_id: Uuid) -> Result<Option<UserId>> {
        Ok(self.owners.lock().expect("directory lock").get(&(kind, reference_id)).copied())
    }
}

impl ProfileDirectory for InMemoryDirectory {
    #[allow(clippy::expect_used)]
    async fn profile(&self, user: UserId) -> Result<Option<UserProfile>> {
        Ok(self.profiles.lock().expect("directory lock").get(&user).cloned())
    }
}
