//! Shared application state.

use mentorbook_booking::BookingService;
use mentorbook_postgres::PgBookingStore;
use std::sync::Arc;

/// The concrete booking service: one Postgres store behind every
/// provider trait.
pub type Service = BookingService<
    PgBookingStore,
    PgBookingStore,
    PgBookingStore,
    PgBookingStore,
    PgBookingStore,
    PgBookingStore,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The booking service
    pub service: Arc<Service>,
}

impl AppState {
    /// Wrap a service.
    #[must_use]
    pub fn new(service: Service) -> Self {
        Self { service: Arc::new(service) }
    }
}
