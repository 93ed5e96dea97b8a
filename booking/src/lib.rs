//! # Mentorbook Booking
//!
//! The booking lifecycle core of the Mentorbook mentorship marketplace:
//! booking state, status-transition validation, permission checks for who
//! may trigger each transition, creation conflict validation, and
//! feedback attachment rules.
//!
//! # Architecture
//!
//! The crate follows Functional Core, Imperative Shell:
//!
//! - [`lifecycle`] holds the entire transition table in one pure module,
//!   including the payment-settlement source the gateway webhook uses.
//! - [`schedule`] is the buffered-interval and availability-window math.
//! - [`reducer`] validates commands against one mentor's schedule
//!   aggregate and applies events.
//! - [`service`] is the shell: it loads state from the [`providers`],
//!   runs the reducer, persists through the repositories (whose storage
//!   constraints are the authority for the slot-conflict and
//!   feedback-uniqueness invariants), and fires best-effort
//!   notifications.
//!
//! # Example
//!
//! ```ignore
//! use mentorbook_booking::prelude::*;
//!
//! let service = BookingService::new(
//!     catalog, availability, bookings, feedback, directory, profiles,
//!     Arc::new(SystemClock), Arc::new(LoggingDispatcher),
//!     BookingConfig::new(),
//! );
//!
//! let booking = service.create_booking(mentee, offering_id, start).await?;
//! let confirmed = service
//!     .patch_booking(mentor, booking.id, BookingPatch {
//!         status: Some(BookingStatus::Confirmed),
//!         ..BookingPatch::default()
//!     })
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod feedback;
pub mod lifecycle;
pub mod mocks;
pub mod providers;
pub mod reducer;
pub mod schedule;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::BookingConfig;
pub use error::{BookingError, Result};
pub use lifecycle::{Party, TransitionSource};
pub use reducer::{BookingAction, BookingEnvironment, BookingReducer, BookingState};
pub use service::{BookingPatch, BookingService, order_reference, parse_order_reference};
pub use types::{
    Actor, AvailabilitySlot, Booking, BookingId, BookingStatus, CancelledBy, Feedback,
    FeedbackId, FeedbackKind, FeedbackStatus, Money, Offering, OfferingId, OfferingStatus,
    PaymentOutcome, PaymentStatus, Rating, UserId, UserProfile,
};

/// Convenience re-exports for downstream crates.
pub mod prelude {
    pub use crate::config::BookingConfig;
    pub use crate::error::{BookingError, Result};
    pub use crate::lifecycle::{Party, TransitionSource};
    pub use crate::providers::{
        AvailabilityStore, BookingRepository, ContentDirectory, FeedbackFilter,
        FeedbackRepository, LoggingDispatcher, Notification, NotificationDispatcher,
        NotificationKind, OfferingCatalog, ProfileDirectory,
    };
    pub use crate::service::{BookingPatch, BookingService};
    pub use crate::types::{
        Actor, AvailabilitySlot, Booking, BookingId, BookingStatus, CancelledBy, Feedback,
        FeedbackId, FeedbackKind, FeedbackStatus, Money, Offering, OfferingId, OfferingStatus,
        PaymentOutcome, PaymentStatus, Rating, UserId, UserProfile,
    };
}
