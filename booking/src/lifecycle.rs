//! The booking lifecycle state machine.
//!
//! The entire transition table lives in this module so the machine is
//! auditable from one place, including the payment-settlement path that
//! the gateway webhook triggers. Transitions are keyed by *source*: a
//! party to the booking (mentor or mentee) or the payment system.
//!
//! ```text
//!            mentor | payment
//!  pending ────────────────────► confirmed
//!     │                             │
//!     │ mentor | mentee             │ mentor
//!     ▼                             ▼
//!  cancelled ◄──────────────── completed / no_show
//!            mentor | mentee
//! ```
//!
//! `completed`, `cancelled`, and `no_show` are terminal.

use crate::error::BookingError;
use crate::types::{Booking, BookingStatus, CancelledBy, Rating, UserId};
use serde::{Deserialize, Serialize};

/// Which side of a booking an actor is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// The booking's mentor
    Mentor,
    /// The booking's mentee
    Mentee,
}

impl From<Party> for CancelledBy {
    fn from(party: Party) -> Self {
        match party {
            Party::Mentor => Self::Mentor,
            Party::Mentee => Self::Mentee,
        }
    }
}

/// The source requesting a transition: an authenticated party, or the
/// payment system settling a successful charge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionSource {
    /// A party to the booking
    Party(Party),
    /// The payment gateway (webhook settlement)
    Payment,
}

/// Resolve which party of the booking the actor is.
///
/// # Errors
///
/// Returns [`BookingError::Forbidden`] when the actor is neither the
/// booking's mentor nor its mentee.
pub fn resolve_party(booking: &Booking, actor: UserId) -> Result<Party, BookingError> {
    if actor == booking.mentor_id {
        Ok(Party::Mentor)
    } else if actor == booking.mentee_id {
        Ok(Party::Mentee)
    } else {
        Err(BookingError::forbidden("not a party to this booking"))
    }
}

/// Check a requested transition against the lifecycle table.
///
/// Structural validity and permission are distinct failures: a transition
/// that is not an edge of the table is [`BookingError::InvalidTransition`]
/// regardless of who asks; an edge requested by a source the table does
/// not grant is [`BookingError::Forbidden`].
///
/// # Errors
///
/// Returns `InvalidTransition` for absent edges (including anything out
/// of a terminal state) and `Forbidden` for a disallowed source.
pub fn authorize_transition(
    from: BookingStatus,
    to: BookingStatus,
    source: TransitionSource,
) -> Result<(), BookingError> {
    use BookingStatus::{Cancelled, Completed, Confirmed, NoShow, Pending};
    use TransitionSource::{Party as By, Payment};

    let permitted: &[TransitionSource] = match (from, to) {
        (Pending, Confirmed) => &[By(Party::Mentor), Payment],
        (Pending, Cancelled) | (Confirmed, Cancelled) => {
            &[By(Party::Mentor), By(Party::Mentee)]
        },
        (Confirmed, Completed) | (Confirmed, NoShow) => &[By(Party::Mentor)],
        _ => return Err(BookingError::InvalidTransition { from, to }),
    };

    if permitted.contains(&source) {
        Ok(())
    } else {
        Err(BookingError::forbidden(format!(
            "transition {from} -> {to} is not permitted for this actor"
        )))
    }
}

/// Guard for writing `meeting_link`: mentor only, at any non-terminal
/// status (a link is only meaningful before the session resolves).
///
/// # Errors
///
/// Returns `Forbidden` for non-mentors and `Validation` when the booking
/// is already terminal.
pub fn authorize_meeting_link(booking: &Booking, party: Party) -> Result<(), BookingError> {
    if party != Party::Mentor {
        return Err(BookingError::forbidden("only the mentor can set the meeting link"));
    }
    if booking.status.is_terminal() {
        return Err(BookingError::Validation(
            "the meeting link can no longer be changed once the booking is settled".to_string(),
        ));
    }
    Ok(())
}

/// Guard for writing `mentor_notes`: mentor only, at any status.
///
/// # Errors
///
/// Returns `Forbidden` for non-mentors.
pub fn authorize_mentor_notes(party: Party) -> Result<(), BookingError> {
    if party == Party::Mentor {
        Ok(())
    } else {
        Err(BookingError::forbidden("only the mentor can edit mentor notes"))
    }
}

/// Guard for the mentee rating: mentee only, only while the booking is
/// `completed`, and write-once.
///
/// # Errors
///
/// Returns `Forbidden` for non-mentees and `Validation` when the booking
/// is not completed or a rating was already submitted.
pub fn authorize_session_rating(booking: &Booking, party: Party) -> Result<(), BookingError> {
    if party != Party::Mentee {
        return Err(BookingError::forbidden("only the mentee can rate the session"));
    }
    if booking.status != BookingStatus::Completed {
        return Err(BookingError::Validation(
            "a session can only be rated once it is completed".to_string(),
        ));
    }
    if booking.mentee_rating.is_some() {
        return Err(BookingError::Validation(
            "a rating has already been submitted for this session".to_string(),
        ));
    }
    Ok(())
}

/// Parse and validate a raw rating value.
///
/// # Errors
///
/// Returns `Validation` when the value is outside 1..=5.
pub fn parse_rating(raw: u8) -> Result<Rating, BookingError> {
    Rating::new(raw)
}
