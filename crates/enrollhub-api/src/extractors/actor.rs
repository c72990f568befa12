//! `Actor` extractor: reads the gateway-resolved identity headers.
//!
//! Authentication happens upstream. The gateway forwards the caller's
//! user ID and role, and every handler that acts on behalf of someone
//! takes an [`Actor`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use enrollhub_core::error::AppError;
use enrollhub_core::types::UserId;
use enrollhub_entity::actor::ActorRole;
use enrollhub_service::context::RequestContext;

use crate::error::ApiError;

/// Header carrying the acting user's UUID.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the acting user's role.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The acting user, available in handlers.
#[derive(Debug, Clone)]
pub struct Actor(pub RequestContext);

impl Actor {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for Actor {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = header(parts, ACTOR_ID_HEADER)?
            .parse::<UserId>()
            .map_err(|_| AppError::authentication("X-Actor-Id is not a valid UUID"))?;

        let role = header(parts, ACTOR_ROLE_HEADER)?
            .parse::<ActorRole>()
            .map_err(|e| AppError::authentication(e.message))?;

        Ok(Actor(RequestContext::new(actor_id, role)))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::authentication(format!("Missing {name} header")))
}
