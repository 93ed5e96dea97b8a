//! Feedback repository trait.

use crate::error::Result;
use crate::types::{Feedback, FeedbackId, FeedbackKind, FeedbackStatus, UserId};
use uuid::Uuid;
use std::future::Future;

/// Filters for feedback queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    /// Restrict to one feedback kind
    pub kind: Option<FeedbackKind>,
    /// Restrict to one referenced item
    pub reference_id: Option<Uuid>,
    /// Restrict to a visibility status
    pub status: Option<FeedbackStatus>,
}

/// Feedback persistence.
///
/// The `(user_id, kind, reference_id)` uniqueness invariant is the
/// store's to enforce atomically at write time; `insert_feedback` maps
/// the constraint violation to `DuplicateFeedback` so concurrent
/// duplicate submissions never produce two rows.
pub trait FeedbackRepository: Send + Sync {
    /// Look up a single feedback record.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn feedback(&self, id: FeedbackId) -> impl Future<Output = Result<Option<Feedback>>> + Send;

    /// Insert a new feedback record.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateFeedback` when a record for the same
    /// `(user, kind, reference)` already exists, and
    /// `Unavailable`/`Timeout` for infrastructure failures.
    fn insert_feedback(&self, feedback: &Feedback) -> impl Future<Output = Result<()>> + Send;

    /// Persist an updated feedback record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the record vanished and
    /// `Unavailable`/`Timeout` for infrastructure failures.
    fn update_feedback(&self, feedback: &Feedback) -> impl Future<Output = Result<()>> + Send;

    /// Query feedback, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn list(&self, filter: FeedbackFilter) -> impl Future<Output = Result<Vec<Feedback>>> + Send;

    /// All feedback attached to content the given user owns (their
    /// bookings as mentor, their articles, their events), newest first.
    /// One query at the storage layer, not a per-row table scan.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`/`Timeout` when the store cannot answer.
    fn list_for_owner(&self, owner: UserId)
    -> impl Future<Output = Result<Vec<Feedback>>> + Send;
}
