//! Notification dispatch trait.
//!
//! Dispatched fire-and-forget after a transition is persisted; a delivery
//! failure is logged and never rolls back or fails the transition itself.

use crate::types::{BookingId, CancelledBy, UserId};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// What happened to a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A mentee requested a session
    BookingRequested,
    /// The booking was confirmed
    BookingConfirmed,
    /// The booking was cancelled
    BookingCancelled {
        /// Which side cancelled
        by: CancelledBy,
    },
    /// The session was marked completed
    BookingCompleted,
    /// The mentee did not attend
    BookingNoShow,
    /// The gateway settled the payment
    PaymentSettled,
    /// The gateway reported a failed payment
    PaymentFailed,
}

/// A notification about a booking, addressed to both parties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// The booking this notice concerns
    pub booking_id: BookingId,
    /// The mentor side
    pub mentor_id: UserId,
    /// The mentee side
    pub mentee_id: UserId,
    /// What happened
    pub kind: NotificationKind,
}

/// Notification dispatcher.
///
/// Object-safe (boxed futures) so reducers can carry it in their
/// environment and describe dispatch as an effect.
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver a notification, best-effort.
    fn dispatch(
        &self,
        notification: Notification,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<(), String>> + Send>>;
}

/// Dispatcher that only logs; the default when no delivery channel is
/// configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingDispatcher;

impl NotificationDispatcher for LoggingDispatcher {
    fn dispatch(
        &self,
        notification: Notification,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<(), String>> + Send>> {
        Box::pin(async move {
            tracing::info!(
                booking_id = %notification.booking_id,
                kind = ?notification.kind,
                "notification dispatched"
            );
            Ok(())
        })
    }
}
