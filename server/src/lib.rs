//! Mentorbook HTTP API server.
//!
//! Thin axum shell over `mentorbook-booking`: handlers parse requests,
//! hand explicit actor identities to the service, and map domain errors
//! to precise HTTP responses.
//!
//! # API Endpoints
//!
//! - `POST /api/v1/bookings` - Create a booking (mentee)
//! - `GET /api/v1/bookings` - List the actor's bookings
//! - `GET /api/v1/bookings/:id` - Get one booking (parties only)
//! - `PATCH /api/v1/bookings/:id` - Transition and/or update fields
//! - `POST /api/v1/payments/webhook` - Payment gateway callback
//! - `GET /api/v1/availability` - Read weekly availability
//! - `PUT /api/v1/availability` - Replace weekly availability
//! - `POST /api/v1/feedback` - Attach feedback
//! - `GET /api/v1/feedback` - Query feedback / mentor inbox
//! - `PATCH /api/v1/feedback/:id` - Respond, edit, or archive
//! - `GET /health` - Health check

pub mod api;
pub mod config;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use router::app_router;
pub use state::{AppState, Service};
