use shopfront_auth::Actor;
use shopfront_core::{SessionId, UserId};

/// Who is making the request.
///
/// Inserted by the auth middleware on every route. Anonymous requests carry no
/// actor; whether that is acceptable is decided per action by the policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerContext {
    actor: Option<Actor>,
    session_id: Option<SessionId>,
}

impl ViewerContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(actor: Actor, session_id: SessionId) -> Self {
        Self {
            actor: Some(actor),
            session_id: Some(session_id),
        }
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.actor.as_ref().map(|a| a.user_id)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }
}
