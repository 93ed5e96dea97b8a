//! Error taxonomy for booking and feedback operations.

use crate::types::BookingStatus;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Error taxonomy for the booking core.
///
/// Every business-rule failure is a deterministic outcome of valid input
/// against current state and maps to a distinct, specific message so the
/// client can explain exactly why a booking or transition failed. Only
/// `Unavailable` and `Timeout` describe transient infrastructure trouble.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Lookup & permission
    // ═══════════════════════════════════════════════════════════
    /// Referenced booking/offering/feedback does not exist.
    #[error("{entity} not found")]
    NotFound {
        /// What kind of entity was looked up
        entity: &'static str,
    },

    /// Actor lacks permission for the requested mutation (wrong role, or
    /// not a party to the booking at all).
    #[error("forbidden: {reason}")]
    Forbidden {
        /// Why the actor may not perform this mutation
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════
    /// Requested status change is not an edge of the lifecycle table.
    #[error("cannot change status from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: BookingStatus,
        /// Requested status
        to: BookingStatus,
    },

    /// Malformed input (rating out of range, missing required field).
    #[error("{0}")]
    Validation(String),

    // ═══════════════════════════════════════════════════════════
    // Creation preconditions
    // ═══════════════════════════════════════════════════════════
    /// The offering exists but is not currently bookable.
    #[error("offering is not open for booking")]
    OfferingUnavailable,

    /// Requested start is earlier than the offering's notice period allows.
    #[error("bookings require at least {required_hours} hours notice")]
    InsufficientNotice {
        /// The offering's minimum notice in hours
        required_hours: u32,
    },

    /// Requested start is beyond the offering's advance window.
    #[error("bookings can be made at most {max_days} days in advance")]
    TooFarInAdvance {
        /// The offering's advance window in days
        max_days: u32,
    },

    /// Requested start does not fall inside any availability window.
    #[error("requested time is outside the mentor's availability")]
    OutsideAvailability,

    /// The buffered interval overlaps another pending or confirmed booking.
    #[error("requested time conflicts with an existing booking")]
    SlotConflict,

    /// The mentor's per-day booking cap is already reached.
    #[error("the mentor is fully booked that day (limit {limit})")]
    DailyLimitReached {
        /// The offering's daily cap
        limit: u32,
    },

    // ═══════════════════════════════════════════════════════════
    // Feedback
    // ═══════════════════════════════════════════════════════════
    /// One feedback row per (user, type, reference): the second submission
    /// resolves to this error, never to a second row.
    #[error("feedback already exists for this item")]
    DuplicateFeedback,

    /// The content owner already responded; responses are write-once.
    #[error("a response has already been recorded for this feedback")]
    ResponseAlreadyRecorded,

    // ═══════════════════════════════════════════════════════════
    // Infrastructure
    // ═══════════════════════════════════════════════════════════
    /// An external collaborator (store, gateway) failed.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An external collaborator did not respond in time.
    #[error("operation timed out")]
    Timeout,
}

impl BookingError {
    /// Returns `true` if this error is a deterministic outcome of the
    /// request against current state (as opposed to infrastructure
    /// trouble). User errors are reported directly and never retried.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(self, Self::Unavailable(_) | Self::Timeout)
    }

    /// Returns `true` if a retry (with backoff) may help.
    ///
    /// Deliberately excludes `SlotConflict`: retrying the conflict-checked
    /// insert is only safe when idempotency is guaranteed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout)
    }

    /// Stable machine-readable code for API responses and logs.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::OfferingUnavailable => "OFFERING_UNAVAILABLE",
            Self::InsufficientNotice { .. } => "INSUFFICIENT_NOTICE",
            Self::TooFarInAdvance { .. } => "TOO_FAR_IN_ADVANCE",
            Self::OutsideAvailability => "OUTSIDE_AVAILABILITY",
            Self::SlotConflict => "SLOT_CONFLICT",
            Self::DailyLimitReached { .. } => "DAILY_LIMIT_REACHED",
            Self::DuplicateFeedback => "DUPLICATE_FEEDBACK",
            Self::ResponseAlreadyRecorded => "RESPONSE_ALREADY_RECORDED",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Timeout => "TIMEOUT",
        }
    }

    /// Shorthand for a forbidden error with a reason.
    #[must_use]
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden { reason: reason.into() }
    }
}
