//! Reference and profile directories.

use crate::error::Result;
use crate::types::{FeedbackKind, UserId, UserProfile};
use uuid::Uuid;
use std::future::Future;

/// Resolves feedback references (bookings, articles, events) to existence
/// and ownership: one polymorphic lookup at the boundary instead of
/// per-call-site table probing.
pub trait ContentDirectory: Send + Sync {
    /// Whether the referenced item exists.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn reference_exists(
        &self,
        kind: FeedbackKind,
        reference_id: Uuid,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Who owns the referenced content: the booking's mentor, the
    /// article's author, or the event's creator.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn owner_of(
        &self,
        kind: FeedbackKind,
        reference_id: Uuid,
    ) -> impl Future<Output = Result<Option<UserId>>> + Send;
}

/// Resolves display profiles for users.
pub trait ProfileDirectory: Send + Sync {
    /// The user's display profile, when one exists.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn profile(&self, user: UserId) -> impl Future<Output = Result<Option<UserProfile>>> + Send;
}
