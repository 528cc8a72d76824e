//! Explicit session context handed to every authenticated call.

use std::{fmt, future::Future, sync::Arc};

use anyhow::Result;
use shared::{domain::UserProfile, protocol::LoginResponse};
use storage::SessionStore;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::RequestError;

/// Opaque credential; never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated {
        token: BearerToken,
        user: Option<UserProfile>,
    },
}

/// In-memory session mirrored to the persisted `token`/`user` keys.
pub struct Session {
    store: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
}

impl Session {
    /// Loads whatever the store holds; a missing or blank token means unauthenticated.
    pub async fn restore(store: Arc<dyn SessionStore>) -> Result<Self> {
        let state = match store.token().await? {
            Some(token) => SessionState::Authenticated {
                token: BearerToken::new(token),
                user: store.cached_user().await?,
            },
            None => SessionState::Unauthenticated,
        };
        Ok(Self {
            store,
            state: RwLock::new(state),
        })
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(
            *self.state.read().await,
            SessionState::Authenticated { .. }
        )
    }

    pub async fn bearer(&self) -> Option<BearerToken> {
        match &*self.state.read().await {
            SessionState::Authenticated { token, .. } => Some(token.clone()),
            SessionState::Unauthenticated => None,
        }
    }

    pub async fn cached_user(&self) -> Option<UserProfile> {
        match &*self.state.read().await {
            SessionState::Authenticated { user, .. } => user.clone(),
            SessionState::Unauthenticated => None,
        }
    }

    /// Unauthenticated -> Authenticated after a successful login.
    pub async fn establish(&self, login: &LoginResponse) -> Result<()> {
        self.store.save_token(&login.token).await?;
        if let Some(user) = &login.user {
            self.store.save_user(user).await?;
        }
        *self.state.write().await = SessionState::Authenticated {
            token: BearerToken::new(login.token.clone()),
            user: login.user.clone(),
        };
        info!("session established");
        Ok(())
    }

    /// Refreshes the cached profile without touching the token.
    pub async fn remember_user(&self, profile: &UserProfile) -> Result<()> {
        let mut state = self.state.write().await;
        if let SessionState::Authenticated { user, .. } = &mut *state {
            self.store.save_user(profile).await?;
            *user = Some(profile.clone());
        }
        Ok(())
    }

    /// Explicit logout.
    pub async fn logout(&self) -> Result<()> {
        *self.state.write().await = SessionState::Unauthenticated;
        self.store.clear_token().await?;
        self.store.clear_user().await?;
        info!("session closed by user");
        Ok(())
    }

    /// Drops the session after the server refused the token. Storage failures are
    /// logged; the in-memory state is cleared regardless.
    pub async fn invalidate(&self, reason: &str) {
        *self.state.write().await = SessionState::Unauthenticated;
        if let Err(err) = self.store.clear_token().await {
            warn!(error = %err, "failed to clear persisted token");
        }
        if let Err(err) = self.store.clear_user().await {
            warn!(error = %err, "failed to clear cached user");
        }
        warn!(reason, "session invalidated");
    }

    /// Runs an authenticated call and intercepts its outcome.
    ///
    /// Without a token the call is never issued. A 401/403 answer drops the
    /// session; every other failure leaves it intact.
    pub async fn authorized<T, F, Fut>(
        &self,
        endpoint: &'static str,
        call: F,
    ) -> Result<T, RequestError>
    where
        F: FnOnce(BearerToken) -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let Some(token) = self.bearer().await else {
            return Err(RequestError::MissingSession { endpoint });
        };
        let result = call(token).await;
        if let Err(err @ RequestError::SessionInvalid { .. }) = &result {
            self.invalidate(&err.to_string()).await;
        }
        result
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
