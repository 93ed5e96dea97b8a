//! HTTP router.
//!
//! Composes all API handlers into a single Axum router.

use crate::api;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use mentorbook_web::handlers::health::health_check;

/// Build the application router.
///
/// # Example
///
/// ```rust,ignore
/// let state = AppState::new(service);
/// let app = app_router(state);
/// axum::serve(listener, app).await?;
/// ```
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/bookings", post(api::bookings::create_booking).get(api::bookings::list_bookings))
        .route(
            "/bookings/:id",
            get(api::bookings::get_booking).patch(api::bookings::patch_booking),
        )
        .route("/payments/webhook", post(api::payments::payment_webhook))
        .route(
            "/availability",
            get(api::availability::get_availability).put(api::availability::put_availability),
        )
        .route("/feedback", post(api::feedback::create_feedback).get(api::feedback::list_feedback))
        .route("/feedback/:id", axum::routing::patch(api::feedback::patch_feedback))
        .with_state(state);

    Router::new().route("/health", get(health_check)).nest("/api/v1", api)
}
