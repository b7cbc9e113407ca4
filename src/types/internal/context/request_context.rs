use crate::errors::AdminError;
use crate::types::internal::User;

use super::{request_id::RequestId, request_source::RequestSource};

/// Request context that flows through services and providers
///
/// The actor is resolved upstream (session, token, CLI) and handed in as a
/// `User` value. Nothing in this crate re-derives it from raw credentials.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (for tracing across layers)
    pub request_id: RequestId,

    /// Source of the request (API, CLI, or System)
    pub source: RequestSource,

    /// Authenticated actor, if any
    pub actor: Option<User>,
}

impl RequestContext {
    /// Context for an API request made by an authenticated user
    pub fn for_actor(actor: User) -> Self {
        Self {
            request_id: RequestId::new(),
            source: RequestSource::API,
            actor: Some(actor),
        }
    }

    /// Context for CLI operations acting on behalf of a user
    pub fn for_cli(actor: User) -> Self {
        Self {
            request_id: RequestId::new(),
            source: RequestSource::CLI,
            actor: Some(actor),
        }
    }

    /// Context for system operations without an actor
    pub fn for_system() -> Self {
        Self {
            request_id: RequestId::new(),
            source: RequestSource::System,
            actor: None,
        }
    }

    pub fn actor(&self) -> Result<&User, AdminError> {
        self.actor.as_ref().ok_or(AdminError::Unauthenticated)
    }
}
