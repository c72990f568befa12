//! Request context carrying the acting user and role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use enrollhub_core::types::UserId;
use enrollhub_entity::actor::ActorRole;

/// Context for the current request.
///
/// Built by the API layer from gateway headers (or by the CLI for
/// maintenance tasks) and passed into every service method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub actor_id: UserId,
    /// The role the actor is acting under.
    pub role: ActorRole,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(actor_id: UserId, role: ActorRole) -> Self {
        Self {
            actor_id,
            role,
            request_time: Utc::now(),
        }
    }

    /// Context for internal maintenance work.
    pub fn system() -> Self {
        Self::new(UserId::new(), ActorRole::System)
    }

    /// Returns whether the current actor is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Returns whether the actor has the given role.
    pub fn has_role(&self, role: ActorRole) -> bool {
        self.role == role
    }
}
