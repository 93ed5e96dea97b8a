//! # Mentorbook Postgres
//!
//! `PostgreSQL` implementations of the booking provider traits.
//!
//! The two concurrency-critical invariants are *constraints*, not
//! application logic:
//!
//! - `bookings_no_overlap`: a gist exclusion constraint over
//!   `(mentor_id, booked_span)` restricted to pending/confirmed rows.
//!   Two racing creations for overlapping buffered spans resolve to one
//!   row; the loser's SQLSTATE 23P01 surfaces as `SlotConflict`.
//! - `feedback_once_per_reference`: a unique constraint over
//!   `(user_id, feedback_type, reference_id)`; the duplicate's SQLSTATE
//!   23505 surfaces as `DuplicateFeedback`.
//!
//! All queries are runtime-checked (`sqlx::query`), so building this
//! crate needs no live database.

mod store;

pub use store::PgBookingStore;

/// Embedded migrations for the Mentorbook schema.
///
/// # Errors
///
/// Returns the underlying migration error when a step fails.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
