//! Feedback endpoints.
//!
//! - `POST /api/v1/feedback` - Attach feedback to a booking/article/event
//! - `GET /api/v1/feedback` - Query feedback, or a mentor's inbox via
//!   `?mentor_id=`
//! - `PATCH /api/v1/feedback/:id` - Respond (owner/admin, write-once),
//!   edit rating/comment (author), or archive (owner/admin)

use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use mentorbook_booking::providers::FeedbackFilter;
use mentorbook_booking::types::{
    Feedback, FeedbackId, FeedbackKind, FeedbackStatus, UserId, UserProfile,
};
use mentorbook_web::{AppError, RequestActor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to attach feedback.
#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    /// What the feedback refers to: `booking`, `article`, or `event`
    pub feedback_type: String,
    /// The referenced item
    pub reference_id: Uuid,
    /// Star rating, 1..=5
    pub rating: u8,
    /// Optional comment
    #[serde(default)]
    pub comment: Option<String>,
}

/// Query parameters for feedback listing.
#[derive(Debug, Default, Deserialize)]
pub struct FeedbackQuery {
    /// Restrict to one kind (`booking`/`article`/`event`)
    #[serde(rename = "type")]
    pub feedback_type: Option<String>,
    /// Restrict to one referenced item
    pub reference_id: Option<Uuid>,
    /// Restrict to a status (`active`/`archived`); defaults to active
    pub status: Option<String>,
    /// Inbox mode: all feedback on content this mentor owns
    pub mentor_id: Option<Uuid>,
}

/// Request to update feedback: respond, edit, or archive.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateFeedbackRequest {
    /// Content-owner response (write-once)
    pub mentor_response: Option<String>,
    /// Author's new rating
    pub rating: Option<u8>,
    /// Author's new comment
    pub comment: Option<String>,
    /// `archived` to hide the feedback (owner/admin)
    pub status: Option<String>,
}

/// A feedback record, enriched with the author's display profile.
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    /// Feedback ID
    pub id: Uuid,
    /// Author
    pub user_id: Uuid,
    /// Referenced kind
    pub feedback_type: String,
    /// Referenced item
    pub reference_id: Uuid,
    /// Star rating
    pub rating: u8,
    /// Comment
    pub comment: Option<String>,
    /// Content-owner response
    pub mentor_response: Option<String>,
    /// Who responded
    pub responded_by: Option<Uuid>,
    /// When the response was recorded
    pub responded_at: Option<DateTime<Utc>>,
    /// Visibility status
    pub status: String,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Author display profile, when known
    pub user: Option<AuthorDto>,
}

/// Author display data.
#[derive(Debug, Serialize)]
pub struct AuthorDto {
    /// Display name
    pub name: String,
    /// Avatar URL
    pub avatar_url: Option<String>,
}

impl FeedbackResponse {
    fn new(feedback: Feedback, profile: Option<UserProfile>) -> Self {
        Self {
            id: *feedback.id.as_uuid(),
            user_id: *feedback.user_id.as_uuid(),
            feedback_type: feedback.kind.as_str().to_string(),
            reference_id: feedback.reference_id,
            rating: feedback.rating.value(),
            comment: feedback.comment,
            mentor_response: feedback.mentor_response,
            responded_by: feedback.responded_by.map(|u| *u.as_uuid()),
            responded_at: feedback.responded_at,
            status: feedback.status.as_str().to_string(),
            created_at: feedback.created_at,
            updated_at: feedback.updated_at,
            user: profile.map(|p| AuthorDto { name: p.name, avatar_url: p.avatar_url }),
        }
    }
}

/// Response for feedback lists.
#[derive(Debug, Serialize)]
pub struct ListFeedbackResponse {
    /// Matching feedback, newest first
    pub feedback: Vec<FeedbackResponse>,
    /// Total count
    pub total: usize,
}

fn parse_status(raw: &str) -> Result<FeedbackStatus, AppError> {
    match raw {
        "active" => Ok(FeedbackStatus::Active),
        "archived" => Ok(FeedbackStatus::Archived),
        other => Err(AppError::validation(format!("unknown feedback status: {other}"))),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Attach feedback to a booking, article, or event.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3000/api/v1/feedback \
///   -H "x-actor-id: <mentee-id>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "feedback_type": "booking",
///     "reference_id": "660e8400-e29b-41d4-a716-446655440001",
///     "rating": 5,
///     "comment": "Exactly the advice I needed"
///   }'
/// ```
pub async fn create_feedback(
    actor: RequestActor,
    State(state): State<AppState>,
    Json(request): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), AppError> {
    let kind = FeedbackKind::parse(&request.feedback_type)?;

    let feedback = state
        .service
        .submit_feedback(actor.id(), kind, request.reference_id, request.rating, request.comment)
        .await?;

    let profile = state.service.profile(feedback.user_id).await.unwrap_or(None);
    Ok((StatusCode::CREATED, Json(FeedbackResponse::new(feedback, profile))))
}

/// Query feedback, or a mentor's inbox via `?mentor_id=`.
pub async fn list_feedback(
    State(state): State<AppState>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<ListFeedbackResponse>, AppError> {
    let rows = match query.mentor_id {
        Some(mentor) => state.service.feedback_inbox(UserId::from_uuid(mentor)).await?,
        None => {
            let filter = FeedbackFilter {
                kind: query.feedback_type.as_deref().map(FeedbackKind::parse).transpose()?,
                reference_id: query.reference_id,
                status: Some(
                    query.status.as_deref().map_or(Ok(FeedbackStatus::Active), parse_status)?,
                ),
            };
            state.service.list_feedback(filter).await?
        },
    };

    let mut responses = Vec::with_capacity(rows.len());
    for feedback in rows {
        // Display data comes from the profile directory, resolved here
        // at the boundary.
        let profile = state.service.profile(feedback.user_id).await.unwrap_or(None);
        responses.push(FeedbackResponse::new(feedback, profile));
    }

    let total = responses.len();
    Ok(Json(ListFeedbackResponse { feedback: responses, total }))
}

/// Respond to, edit, or archive a feedback record.
///
/// The three mutations have different permission rules and may be
/// combined in one request: a response is owner/admin and write-once,
/// rating/comment edits are author-only, archiving is owner/admin.
pub async fn patch_feedback(
    actor: RequestActor,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UpdateFeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let id = FeedbackId::from_uuid(id);
    let mut updated = None;

    if let Some(response) = request.mentor_response {
        updated = Some(state.service.respond_to_feedback(actor.0, id, response).await?);
    }

    if request.rating.is_some() || request.comment.is_some() {
        updated = Some(
            state.service.edit_feedback(actor.id(), id, request.rating, request.comment).await?,
        );
    }

    if let Some(status) = request.status.as_deref() {
        if parse_status(status)? == FeedbackStatus::Archived {
            updated = Some(state.service.archive_feedback(actor.0, id).await?);
        }
    }

    let feedback =
        updated.ok_or_else(|| AppError::validation("no feedback changes requested"))?;
    let profile = state.service.profile(feedback.user_id).await.unwrap_or(None);
    Ok(Json(FeedbackResponse::new(feedback, profile)))
}
