//! Mentor availability endpoints.
//!
//! - `GET /api/v1/availability` - Read weekly windows (own, or any
//!   mentor's via `?mentor_id=`)
//! - `PUT /api/v1/availability` - Replace the acting mentor's windows
//!   wholesale

use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveTime;
use chrono_tz::Tz;
use mentorbook_booking::types::{AvailabilitySlot, UserId};
use mentorbook_web::{AppError, RequestActor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameters for reading availability.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Mentor to read; defaults to the acting user
    pub mentor_id: Option<Uuid>,
}

/// One weekly window in transport form.
#[derive(Debug, Serialize, Deserialize)]
pub struct SlotDto {
    /// Day of week, 0 = Sunday
    pub day_of_week: u8,
    /// Window start, `HH:MM` or `HH:MM:SS`
    pub start_time: String,
    /// Window end, `HH:MM` or `HH:MM:SS`
    pub end_time: String,
}

/// Request to replace the acting mentor's availability.
#[derive(Debug, Deserialize)]
pub struct PutAvailabilityRequest {
    /// The full new set of windows (an empty list clears availability)
    pub slots: Vec<SlotDto>,
    /// Timezone the windows are declared in
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Availability response.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Windows ordered by `(day_of_week, start_time)`
    pub slots: Vec<SlotWithTimezone>,
}

/// One stored window.
#[derive(Debug, Serialize)]
pub struct SlotWithTimezone {
    /// Day of week, 0 = Sunday
    pub day_of_week: u8,
    /// Window start (`HH:MM`)
    pub start_time: String,
    /// Window end (`HH:MM`)
    pub end_time: String,
    /// Declared timezone
    pub timezone: String,
}

fn to_response(slots: Vec<AvailabilitySlot>) -> AvailabilityResponse {
    AvailabilityResponse {
        slots: slots
            .into_iter()
            .map(|slot| SlotWithTimezone {
                day_of_week: slot.day_of_week,
                start_time: slot.start_time.format("%H:%M").to_string(),
                end_time: slot.end_time.format("%H:%M").to_string(),
                timezone: slot.timezone.name().to_string(),
            })
            .collect(),
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppError::validation(format!("invalid time: {raw}")))
}

/// Read weekly availability.
pub async fn get_availability(
    actor: RequestActor,
    Query(query): Query<AvailabilityQuery>,
    State(state): State<AppState>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let mentor = query.mentor_id.map_or_else(|| actor.id(), UserId::from_uuid);
    let slots = state.service.availability_for(mentor).await?;
    Ok(Json(to_response(slots)))
}

/// Replace the acting mentor's availability wholesale.
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:3000/api/v1/availability \
///   -H "x-actor-id: <mentor-id>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "timezone": "America/New_York",
///     "slots": [
///       {"day_of_week": 1, "start_time": "09:00", "end_time": "12:00"},
///       {"day_of_week": 3, "start_time": "14:00", "end_time": "17:00"}
///     ]
///   }'
/// ```
pub async fn put_availability(
    actor: RequestActor,
    State(state): State<AppState>,
    Json(request): Json<PutAvailabilityRequest>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let timezone: Tz = request
        .timezone
        .parse()
        .map_err(|_| AppError::validation(format!("invalid timezone: {}", request.timezone)))?;

    let mentor = actor.id();
    let mut slots = Vec::with_capacity(request.slots.len());
    for dto in request.slots {
        slots.push(AvailabilitySlot {
            mentor_id: mentor,
            day_of_week: dto.day_of_week,
            start_time: parse_time(&dto.start_time)?,
            end_time: parse_time(&dto.end_time)?,
            timezone,
        });
    }

    let stored = state.service.replace_availability(mentor, slots).await?;
    Ok(Json(to_response(stored)))
}
