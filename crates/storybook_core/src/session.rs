//! crates/storybook_core/src/session.rs
//!
//! The persisted login session and the login/register/logout flows built on it.

use crate::domain::Session;
use crate::ports::{AuthService, KeyValueStorage, PortError, PortResult, TokenProvider};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Storage key of the single session record.
pub const SESSION_KEY: &str = "storyUser";

//=========================================================================================
// SessionStore
//=========================================================================================

/// Reads and writes the single persisted session record.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// The current session, if one is stored and usable.
    ///
    /// A record that fails to parse, or that carries an empty token, is
    /// removed and treated as no session.
    pub async fn current(&self) -> PortResult<Option<Session>> {
        let Some(raw) = self.storage.get(SESSION_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if !session.token.trim().is_empty() => Ok(Some(session)),
            Ok(_) => {
                warn!("Stored session has no token, discarding it.");
                self.clear().await?;
                Ok(None)
            }
            Err(e) => {
                error!("Error parsing saved session: {}", e);
                self.clear().await?;
                Ok(None)
            }
        }
    }

    /// Overwrites the stored record.
    pub async fn save(&self, session: &Session) -> PortResult<()> {
        let raw = serde_json::to_string(session)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.storage.set(SESSION_KEY, raw).await
    }

    pub async fn clear(&self) -> PortResult<()> {
        self.storage.remove(SESSION_KEY).await
    }
}

#[async_trait]
impl TokenProvider for SessionStore {
    async fn bearer_token(&self) -> Option<String> {
        match self.current().await {
            Ok(session) => session.map(|s| s.token),
            Err(e) => {
                error!("Failed to read the stored session: {}", e);
                None
            }
        }
    }
}

//=========================================================================================
// SessionManager
//=========================================================================================

/// Login, registration and logout on top of the [`SessionStore`].
#[derive(Clone)]
pub struct SessionManager {
    auth: Arc<dyn AuthService>,
    store: SessionStore,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthService>, store: SessionStore) -> Self {
        Self { auth, store }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Logs in and overwrites the persisted session.
    pub async fn login(&self, email: &str, password: &str) -> PortResult<Session> {
        let user = self.auth.login(email, password).await?;

        let name = user
            .full_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| email_local_part(&user.email));
        let session = Session {
            id: user.id,
            email: user.email,
            name,
            token: user.token,
        };

        self.store.save(&session).await?;
        info!(user_id = %session.id, "Logged in.");
        Ok(session)
    }

    /// Registers a new account, then logs in with the same credentials.
    pub async fn register(&self, email: &str, password: &str, username: &str) -> PortResult<Session> {
        self.auth.register(email, password, username).await?;
        info!(email, "Registered new account.");
        self.login(email, password).await
    }

    /// Notifies the server (best effort) and always clears the local session.
    pub async fn logout(&self) -> PortResult<()> {
        if let Err(e) = self.auth.logout().await {
            error!("Logout error: {}", e);
        }
        self.store.clear().await?;
        info!("Logged out.");
        Ok(())
    }
}

fn email_local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
