//! Booking API endpoints.
//!
//! - `POST /api/v1/bookings` - Create a booking (mentee)
//! - `GET /api/v1/bookings` - List the actor's bookings
//! - `GET /api/v1/bookings/:id` - Get one booking (parties only)
//! - `PATCH /api/v1/bookings/:id` - Transition and/or update fields
//!
//! Access control is party-based: only the booking's mentor or mentee
//! can read or mutate it, and the mentor's private notes are never
//! serialized for the mentee.

use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use mentorbook_booking::lifecycle::Party;
use mentorbook_booking::types::{Booking, BookingId, BookingStatus, OfferingId};
use mentorbook_booking::{BookingPatch, lifecycle::resolve_party};
use mentorbook_web::{AppError, CorrelationId, RequestActor};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a new booking.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// Offering to book
    pub offering_id: Uuid,
    /// Requested session start (RFC 3339, UTC)
    pub scheduled_at: DateTime<Utc>,
}

/// A booking as seen by one of its parties.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    /// Booking ID
    pub id: Uuid,
    /// Mentor side
    pub mentor_id: Uuid,
    /// Mentee side
    pub mentee_id: Uuid,
    /// Booked offering
    pub offering_id: Uuid,
    /// Session start (UTC)
    pub scheduled_at: DateTime<Utc>,
    /// Session length in minutes (copied from the offering at creation)
    pub duration_minutes: u32,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Payment axis
    pub payment_status: String,
    /// Meeting link, once the mentor set one
    pub meeting_link: Option<String>,
    /// Private mentor notes; omitted entirely for the mentee
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentor_notes: Option<String>,
    /// Cancellation reason, if cancelled
    pub cancellation_reason: Option<String>,
    /// Which side cancelled, if cancelled
    pub cancelled_by: Option<String>,
    /// Mentee rating, once submitted
    pub mentee_rating: Option<u8>,
    /// Mentee feedback text, once submitted
    pub mentee_feedback: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl BookingResponse {
    /// Serialize a booking for a given viewer. The mentor's private
    /// notes are stripped for everyone but the mentor.
    #[must_use]
    pub fn for_viewer(booking: Booking, viewer: Party) -> Self {
        let mentor_notes =
            if viewer == Party::Mentor { booking.mentor_notes.clone() } else { None };
        Self {
            id: *booking.id.as_uuid(),
            mentor_id: *booking.mentor_id.as_uuid(),
            mentee_id: *booking.mentee_id.as_uuid(),
            offering_id: *booking.offering_id.as_uuid(),
            scheduled_at: booking.scheduled_at,
            duration_minutes: booking.duration_minutes,
            status: booking.status,
            payment_status: booking.payment_status.as_str().to_string(),
            meeting_link: booking.meeting_link,
            mentor_notes,
            cancellation_reason: booking.cancellation_reason,
            cancelled_by: booking.cancelled_by.map(|c| c.as_str().to_string()),
            mentee_rating: booking.mentee_rating.map(|r| r.value()),
            mentee_feedback: booking.mentee_feedback,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// Request to transition and/or update a booking.
///
/// Field semantics follow JSON PATCH conventions: absent fields are left
/// alone; `meeting_link`/`mentor_notes` may be explicitly `null` to
/// clear.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBookingRequest {
    /// Requested status (stable snake_case form)
    pub status: Option<String>,
    /// Reason recorded on cancellation
    pub cancellation_reason: Option<String>,
    /// Set or clear the meeting link (mentor only)
    #[serde(default, deserialize_with = "double_option")]
    pub meeting_link: Option<Option<String>>,
    /// Set or clear the private notes (mentor only)
    #[serde(default, deserialize_with = "double_option")]
    pub mentor_notes: Option<Option<String>>,
    /// Submit the session rating (mentee, completed bookings, once)
    pub mentee_rating: Option<u8>,
    /// Feedback text accompanying the rating
    pub mentee_feedback: Option<String>,
}

/// Distinguish "absent" from "explicitly null" for clearable fields.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Response for booking lists.
#[derive(Debug, Serialize)]
pub struct ListBookingsResponse {
    /// The actor's bookings, newest first
    pub bookings: Vec<BookingResponse>,
    /// Total count
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new booking.
///
/// The actor is the mentee; preconditions (offering open, notice,
/// advance window, availability, slot conflict, daily cap) each fail
/// with their own error code.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3000/api/v1/bookings \
///   -H "x-actor-id: 770e8400-e29b-41d4-a716-446655440002" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "offering_id": "550e8400-e29b-41d4-a716-446655440000",
///     "scheduled_at": "2025-06-09T09:00:00Z"
///   }'
/// ```
pub async fn create_booking(
    actor: RequestActor,
    correlation_id: CorrelationId,
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    tracing::info!(
        correlation_id = %correlation_id.0,
        offering_id = %request.offering_id,
        "booking requested"
    );

    let booking = state
        .service
        .create_booking(
            actor.id(),
            OfferingId::from_uuid(request.offering_id),
            request.scheduled_at,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(BookingResponse::for_viewer(booking, Party::Mentee))))
}

/// Get booking details by ID. Parties only.
pub async fn get_booking(
    actor: RequestActor,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<BookingResponse>, AppError> {
    let (booking, party) =
        state.service.booking_for(actor.id(), BookingId::from_uuid(id)).await?;
    Ok(Json(BookingResponse::for_viewer(booking, party)))
}

/// List all bookings the actor participates in.
pub async fn list_bookings(
    actor: RequestActor,
    State(state): State<AppState>,
) -> Result<Json<ListBookingsResponse>, AppError> {
    let bookings = state.service.bookings_for_user(actor.id()).await?;
    let responses: Vec<BookingResponse> = bookings
        .into_iter()
        .filter_map(|booking| {
            resolve_party(&booking, actor.id())
                .ok()
                .map(|party| BookingResponse::for_viewer(booking, party))
        })
        .collect();

    let total = responses.len();
    Ok(Json(ListBookingsResponse { bookings: responses, total }))
}

/// Transition a booking and/or update its fields.
///
/// # Example
///
/// ```bash
/// curl -X PATCH http://localhost:3000/api/v1/bookings/<id> \
///   -H "x-actor-id: <mentor-id>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "status": "confirmed",
///     "meeting_link": "https://meet.example.com/abc"
///   }'
/// ```
pub async fn patch_booking(
    actor: RequestActor,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let status = request
        .status
        .as_deref()
        .map(BookingStatus::parse)
        .transpose()?;

    let patch = BookingPatch {
        status,
        cancellation_reason: request.cancellation_reason,
        meeting_link: request.meeting_link,
        mentor_notes: request.mentor_notes,
        mentee_rating: request.mentee_rating,
        mentee_feedback: request.mentee_feedback,
    };

    let booking =
        state.service.patch_booking(actor.id(), BookingId::from_uuid(id), patch).await?;
    let party = resolve_party(&booking, actor.id())?;
    Ok(Json(BookingResponse::for_viewer(booking, party)))
}
