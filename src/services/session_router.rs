//! Maps a caller's (possibly absent) session id to a conversation and runs
//! one exchange on it.

use std::{str::FromStr, sync::Arc};

use uuid::Uuid;

use super::{
    generation::{ConversationHandle, GenerationClient},
    session_store::SessionStore,
};
use crate::{
    error::{RouterError, ValidationError},
    message::{GenerateRequest, GenerateResponse},
};

/// Longest caller-supplied session id accepted under [`SessionIdPolicy::Any`].
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Which caller-supplied session ids may become store keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionIdPolicy {
    /// Any non-blank id up to [`MAX_SESSION_ID_LEN`] bytes.
    #[default]
    Any,
    /// Only UUIDs in the lowercase hyphenated form that `resolve` generates.
    Strict,
}

impl FromStr for SessionIdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "strict" | "uuid" => Ok(Self::Strict),
            other => Err(format!("unknown session id policy `{other}` (expected `any` or `strict`)")),
        }
    }
}

impl SessionIdPolicy {
    pub fn check(self, id: &str) -> Result<(), ValidationError> {
        match self {
            Self::Any if id.len() > MAX_SESSION_ID_LEN => Err(ValidationError::new(
                "sessionId",
                format!("sessionId must be at most {MAX_SESSION_ID_LEN} bytes"),
            )),
            Self::Any => Ok(()),
            // Only the hyphenated lowercase form the router itself generates,
            // so one UUID cannot be spelled into several keys.
            Self::Strict => match Uuid::parse_str(id) {
                Ok(uuid) if uuid.hyphenated().to_string() == id => Ok(()),
                _ => Err(ValidationError::new(
                    "sessionId",
                    "sessionId must be a lowercase hyphenated UUID",
                )),
            },
        }
    }
}

/// A resolved session: the id to echo back and its handle.
#[derive(Clone)]
pub struct ResolvedSession {
    pub id: String,
    pub handle: ConversationHandle,
    pub created: bool,
}

#[derive(Clone)]
pub struct SessionRouter {
    client: Arc<dyn GenerationClient>,
    store: Arc<dyn SessionStore>,
    policy: SessionIdPolicy,
}

impl std::fmt::Debug for SessionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRouter")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SessionRouter {
    pub fn new(client: Arc<dyn GenerationClient>, store: Arc<dyn SessionStore>) -> Self {
        Self { client, store, policy: SessionIdPolicy::default() }
    }

    pub fn with_policy(mut self, policy: SessionIdPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Return the handle for `session_id`, creating one when the id is
    /// unseen or absent. Absent ids get a fresh UUID v4.
    pub async fn resolve(&self, session_id: Option<&str>) -> Result<ResolvedSession, RouterError> {
        let id = match session_id {
            Some(id) => {
                self.policy.check(id)?;
                id.to_string()
            }
            None => Uuid::new_v4().to_string(),
        };

        let client = Arc::clone(&self.client);
        let create = move || client.new_conversation();
        let stored = self.store.get_or_create(&id, &create).await;
        if stored.created {
            tracing::debug!(session_id = %id, "started new conversation");
        }

        Ok(ResolvedSession { id, handle: stored.handle, created: stored.created })
    }

    /// Run one exchange. Upstream failures are logged and returned; the
    /// session created during resolution is kept either way.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, RouterError> {
        let session = self.resolve(request.session_id.as_deref()).await?;

        match session.handle.send_message(&request.prompt).await {
            Ok(result) => Ok(GenerateResponse { result, session_id: session.id }),
            Err(err) => {
                tracing::error!(session_id = %session.id, error = %err, "error sending message to generation API");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses() {
        assert_eq!("any".parse::<SessionIdPolicy>(), Ok(SessionIdPolicy::Any));
        assert_eq!(" Strict ".parse::<SessionIdPolicy>(), Ok(SessionIdPolicy::Strict));
        assert!("loose".parse::<SessionIdPolicy>().is_err());
    }

    #[test]
    fn any_policy_limits_length() {
        assert!(SessionIdPolicy::Any.check("abc").is_ok());
        let long = "x".repeat(MAX_SESSION_ID_LEN + 1);
        let err = SessionIdPolicy::Any.check(&long).unwrap_err();
        assert_eq!(err.field, "sessionId");
    }

    #[test]
    fn strict_policy_requires_uuid() {
        assert!(SessionIdPolicy::Strict.check("abc").is_err());
        assert!(SessionIdPolicy::Strict.check(&Uuid::new_v4().to_string()).is_ok());
    }
}
