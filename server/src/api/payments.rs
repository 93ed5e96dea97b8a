//! Payment gateway webhook.
//!
//! The gateway identifies bookings by the order reference embedded at
//! checkout time (`booking_{uuid}_{timestamp}`). A `SUCCESS` outcome
//! settles the payment and, through the payment row of the lifecycle
//! table, confirms a pending booking. `FAILED` records the failure;
//! anything else is acknowledged without touching state.

use crate::state::AppState;
use axum::{Json, extract::State};
use mentorbook_booking::types::PaymentOutcome;
use mentorbook_web::AppError;
use serde::{Deserialize, Serialize};

/// Webhook payload from the payment gateway.
#[derive(Debug, Deserialize)]
pub struct PaymentWebhookRequest {
    /// Order reference (`booking_{uuid}_{timestamp}`)
    pub order_id: String,
    /// Amount charged, in the gateway's units (unused; the booking is
    /// the source of truth)
    #[serde(default)]
    pub order_amount: Option<f64>,
    /// Gateway outcome: `SUCCESS`, `FAILED`, or an intermediate state
    pub payment_status: String,
    /// Human-readable gateway message
    #[serde(default)]
    pub payment_message: Option<String>,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct PaymentWebhookResponse {
    /// Always true when the webhook was processed
    pub success: bool,
}

/// Handle a payment gateway callback.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3000/api/v1/payments/webhook \
///   -H "Content-Type: application/json" \
///   -d '{
///     "order_id": "booking_660e8400-e29b-41d4-a716-446655440001_1749459600",
///     "order_amount": 25.00,
///     "payment_status": "SUCCESS"
///   }'
/// ```
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(request): Json<PaymentWebhookRequest>,
) -> Result<Json<PaymentWebhookResponse>, AppError> {
    let outcome = match request.payment_status.as_str() {
        "SUCCESS" => PaymentOutcome::Succeeded,
        "FAILED" => PaymentOutcome::Failed,
        other => {
            // Intermediate gateway states (USER_DROPPED, PENDING, ...)
            // leave the booking untouched.
            tracing::debug!(
                order_id = %request.order_id,
                status = other,
                "ignoring intermediate payment status"
            );
            return Ok(Json(PaymentWebhookResponse { success: true }));
        },
    };

    let booking = state.service.settle_payment(&request.order_id, outcome).await?;

    tracing::info!(
        booking_id = %booking.id,
        payment_status = %booking.payment_status,
        status = %booking.status,
        message = request.payment_message.as_deref().unwrap_or(""),
        "payment outcome recorded"
    );

    Ok(Json(PaymentWebhookResponse { success: true }))
}
