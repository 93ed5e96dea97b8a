//! # Mentorbook Runtime
//!
//! Resilience utilities wrapped around every external provider call the
//! booking core makes.
//!
//! Two concerns live here:
//!
//! - [`retry`]: exponential backoff for transient store failures. Reads may
//!   be retried; the conflict-sensitive booking insert must never be blindly
//!   retried (a lost response followed by a retry risks a double booking),
//!   so the caller decides per operation.
//! - [`deadline`]: no provider call is allowed to block indefinitely. Every
//!   read/write carries a deadline and surfaces a timeout error instead of
//!   hanging the request.

pub mod deadline;
pub mod retry;

pub use deadline::{DeadlineError, with_deadline};
pub use retry::{RetryPolicy, retry_with_backoff, retry_with_predicate};
