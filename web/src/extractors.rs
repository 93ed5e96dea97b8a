//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: extract or generate request correlation IDs
//! - [`RequestActor`]: the explicit actor identity every booking
//!   operation requires
//!
//! Actor identity is never read from ambient session state: the fronting
//! identity layer authenticates the caller and injects `x-actor-id`
//! (and, for admin-equivalent callers, `x-actor-role: admin`). Handlers
//! receive the identity as a value and pass it into the core.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use mentorbook_booking::types::{Actor, UserId};
use uuid::Uuid;

use crate::error::AppError;

/// Correlation ID for request tracing.
///
/// Extracts the correlation ID from the `X-Correlation-ID` header,
/// or generates a new UUID v4 if not present.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .headers
            .get("X-Correlation-ID")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// The authenticated actor behind a request.
///
/// Rejects with 401 when the `x-actor-id` header is missing or not a
/// UUID.
#[derive(Debug, Clone, Copy)]
pub struct RequestActor(pub Actor);

impl RequestActor {
    /// The actor's user id.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.0.id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-actor-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(UserId::from_uuid)
            .ok_or_else(|| AppError::unauthorized("missing or invalid actor identity"))?;

        let admin = parts
            .headers
            .get("x-actor-role")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|role| role.eq_ignore_ascii_case("admin"));

        Ok(Self(if admin { Actor::admin(id) } else { Actor::user(id) }))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let req = Request::builder()
            .header("X-Correlation-ID", uuid.to_string())
            .body(())
            .expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn correlation_id_generates_new() {
        let req = Request::builder().body(()).expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_ne!(correlation_id.0, Uuid::nil());
    }

    #[tokio::test]
    async fn actor_from_header() {
        let uuid = Uuid::new_v4();
        let req = Request::builder()
            .header("x-actor-id", uuid.to_string())
            .body(())
            .expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let actor = RequestActor::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(actor.id(), UserId::from_uuid(uuid));
        assert!(!actor.0.admin);
    }

    #[tokio::test]
    async fn admin_role_is_recognized() {
        let req = Request::builder()
            .header("x-actor-id", Uuid::new_v4().to_string())
            .header("x-actor-role", "admin")
            .body(())
            .expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let actor = RequestActor::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert!(actor.0.admin);
    }

    #[tokio::test]
    async fn missing_actor_is_unauthorized() {
        let req = Request::builder().body(()).expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let result = RequestActor::from_request_parts(&mut parts, &()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn malformed_actor_is_unauthorized() {
        let req = Request::builder()
            .header("x-actor-id", "not-a-uuid")
            .body(())
            .expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let result = RequestActor::from_request_parts(&mut parts, &()).await;

        assert!(result.is_err());
    }
}
