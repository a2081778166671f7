//! Session state shared by every client service.
//!
//! The access token and cached identity are mirrored to durable storage;
//! the refresh token only to session-scoped storage. Any value that looks
//! like a stringified absent value is treated as no token at all.

use std::sync::Arc;

use medconsole_core::{Identity, LoginResponse};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::{ClientError, Result};
use crate::storage::{KeyValueStorage, MemoryStorage, StorageError};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

/// Returns the trimmed token when it can be sent as a bearer credential.
pub fn usable_token(raw: Option<&str>) -> Option<&str> {
    let token = raw?.trim();
    if token.is_empty() || token == "undefined" || token == "null" {
        return None;
    }
    Some(token)
}

#[derive(Debug, Default)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    identity: Option<Identity>,
}

pub struct SessionStore {
    durable: Arc<dyn KeyValueStorage>,
    ephemeral: Arc<dyn KeyValueStorage>,
    state: RwLock<SessionState>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SessionStore")
            .field("authenticated", &state.access_token.is_some())
            .field("identity", &state.identity)
            .finish()
    }
}

impl SessionStore {
    /// Restores whatever session the storages hold. Unreadable entries are
    /// logged and treated as absent.
    pub fn open(durable: Arc<dyn KeyValueStorage>, ephemeral: Arc<dyn KeyValueStorage>) -> Self {
        let access_token = read_logged(durable.as_ref(), ACCESS_TOKEN_KEY)
            .and_then(|t| usable_token(Some(&t)).map(str::to_string));
        let refresh_token = read_logged(ephemeral.as_ref(), REFRESH_TOKEN_KEY)
            .and_then(|t| usable_token(Some(&t)).map(str::to_string));
        let identity = read_logged(durable.as_ref(), USER_KEY).and_then(|raw| {
            serde_json::from_str::<Identity>(&raw)
                .inspect_err(|e| warn!(error = %e, "Ignoring unreadable cached identity"))
                .ok()
        });

        Self {
            durable,
            ephemeral,
            state: RwLock::new(SessionState {
                access_token,
                refresh_token,
                identity,
            }),
        }
    }

    /// A session that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.read().refresh_token.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.read().identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().access_token.is_some()
    }

    /// Stores a new access token. Anything unusable clears the stored
    /// token instead.
    pub fn set_token(&self, token: Option<&str>) {
        let mut state = self.state.write();
        match usable_token(token) {
            Some(token) => {
                state.access_token = Some(token.to_string());
                log_failure(self.durable.set(ACCESS_TOKEN_KEY, token));
            }
            None => {
                if token.is_some() {
                    warn!("Rejected unusable access token; clearing session token");
                }
                state.access_token = None;
                log_failure(self.durable.remove(ACCESS_TOKEN_KEY));
            }
        }
    }

    pub fn set_refresh_token(&self, token: Option<&str>) {
        let mut state = self.state.write();
        match usable_token(token) {
            Some(token) => {
                state.refresh_token = Some(token.to_string());
                log_failure(self.ephemeral.set(REFRESH_TOKEN_KEY, token));
            }
            None => {
                state.refresh_token = None;
                log_failure(self.ephemeral.remove(REFRESH_TOKEN_KEY));
            }
        }
    }

    /// Starts a session from a login response in one step.
    pub fn begin(&self, response: LoginResponse) -> Result<Option<Identity>> {
        let Some(token) = usable_token(response.token.as_deref()) else {
            self.clear();
            return Err(ClientError::invalid_response(
                "login response did not contain a token",
            ));
        };

        self.set_token(Some(token));
        self.set_refresh_token(response.refresh_token.as_deref());

        let mut state = self.state.write();
        match &response.user {
            Some(identity) => {
                let raw = serde_json::to_string(identity).map_err(StorageError::from)?;
                log_failure(self.durable.set(USER_KEY, &raw));
            }
            None => log_failure(self.durable.remove(USER_KEY)),
        }
        state.identity = response.user.clone();

        info!(
            user = response.user.as_ref().map(|u| u.username.as_str()),
            "Session started"
        );
        Ok(response.user)
    }

    /// Drops the access token, refresh token and identity. Idempotent.
    pub fn clear(&self) {
        let mut state = self.state.write();
        let had_session = state.access_token.is_some();
        *state = SessionState::default();
        log_failure(self.durable.remove(ACCESS_TOKEN_KEY));
        log_failure(self.durable.remove(USER_KEY));
        log_failure(self.ephemeral.remove(REFRESH_TOKEN_KEY));
        if had_session {
            info!("Session cleared");
        }
    }
}

fn read_logged(storage: &dyn KeyValueStorage, key: &str) -> Option<String> {
    storage
        .get(key)
        .inspect_err(|e| warn!(key, error = %e, "Failed to read session storage"))
        .ok()
        .flatten()
}

fn log_failure(result: std::result::Result<(), StorageError>) {
    if let Err(e) = result {
        warn!(error = %e, "Failed to update session storage");
    }
}
