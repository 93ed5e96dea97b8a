//! Axum integration for Mentorbook.
//!
//! This crate bridges the booking core and the HTTP surface,
//! implementing the "Functional Core, Imperative Shell" pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, headers
//! │  - Request parsing                      │  ← Actor identity, errors
//! │  - Response serialization               │  ← Logging
//! ├─────────────────────────────────────────┤
//! │         Functional Core                 │
//! │  - Booking lifecycle (reducers)         │  ← Testable at memory speed
//! │  - Conflict & feedback rules            │  ← No I/O, no side effects
//! └─────────────────────────────────────────┘
//! ```
//!
//! Every domain error kind maps to a distinct HTTP status and a stable
//! machine-readable code, so a booking failure always tells the caller
//! exactly *why*.

pub mod error;
pub mod extractors;
pub mod handlers;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{CorrelationId, RequestActor};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
