//! Feedback attachment rules.
//!
//! One feedback row exists per `(user, kind, reference)` triple; the
//! storage layer enforces that atomically. These rules cover the rest:
//! reference validity, who may respond (respond-once), author edits,
//! and archiving.

use crate::error::BookingError;
use crate::types::{Actor, Feedback, FeedbackKind, FeedbackStatus, Rating, UserId};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Build a new feedback record after the reference has been verified.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] for an out-of-range rating.
pub fn build_feedback(
    author: UserId,
    kind: FeedbackKind,
    reference_id: Uuid,
    rating: u8,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<Feedback, BookingError> {
    let rating = Rating::new(rating)?;
    Ok(Feedback {
        id: crate::types::FeedbackId::new(),
        user_id: author,
        kind,
        reference_id,
        rating,
        comment: normalize(comment),
        mentor_response: None,
        responded_by: None,
        responded_at: None,
        status: FeedbackStatus::Active,
        created_at: now,
        updated_at: now,
    })
}

/// Authorize a content-owner response.
///
/// Responses are write-once: the product intent is "respond once", so a
/// second attempt is rejected rather than silently overwriting.
///
/// # Errors
///
/// Returns `ResponseAlreadyRecorded` when a response exists, and
/// `Forbidden` when the actor neither owns the referenced content nor is
/// admin-equivalent.
pub fn authorize_response(
    feedback: &Feedback,
    content_owner: Option<UserId>,
    actor: Actor,
) -> Result<(), BookingError> {
    if feedback.mentor_response.is_some() {
        return Err(BookingError::ResponseAlreadyRecorded);
    }
    if actor.admin || content_owner == Some(actor.id) {
        Ok(())
    } else {
        Err(BookingError::forbidden(
            "only the owner of the referenced content can respond to feedback",
        ))
    }
}

/// Record a response on the feedback.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] for an empty response.
pub fn apply_response(
    feedback: &mut Feedback,
    responder: UserId,
    response: String,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    let response = response.trim().to_string();
    if response.is_empty() {
        return Err(BookingError::Validation("response cannot be empty".to_string()));
    }
    feedback.mentor_response = Some(response);
    feedback.responded_by = Some(responder);
    feedback.responded_at = Some(now);
    feedback.updated_at = now;
    Ok(())
}

/// Authorize the author editing their own rating/comment.
///
/// # Errors
///
/// Returns `Forbidden` when the actor is not the feedback's author.
pub fn authorize_author_edit(feedback: &Feedback, actor: UserId) -> Result<(), BookingError> {
    if feedback.user_id == actor {
        Ok(())
    } else {
        Err(BookingError::forbidden("only the author can edit their feedback"))
    }
}

/// Apply an author edit to rating and/or comment.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] for an out-of-range rating or
/// when the edit changes nothing.
pub fn apply_author_edit(
    feedback: &mut Feedback,
    rating: Option<u8>,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    if rating.is_none() && comment.is_none() {
        return Err(BookingError::Validation("no feedback changes requested".to_string()));
    }
    if let Some(raw) = rating {
        feedback.rating = Rating::new(raw)?;
    }
    if let Some(text) = comment {
        feedback.comment = normalize(Some(text));
    }
    feedback.updated_at = now;
    Ok(())
}

/// Authorize archiving: content owner or admin.
///
/// # Errors
///
/// Returns `Forbidden` otherwise.
pub fn authorize_archive(content_owner: Option<UserId>, actor: Actor) -> Result<(), BookingError> {
    if actor.admin || content_owner == Some(actor.id) {
        Ok(())
    } else {
        Err(BookingError::forbidden("only the content owner can archive feedback"))
    }
}

fn normalize(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
