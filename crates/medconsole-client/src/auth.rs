use std::sync::Arc;

use medconsole_core::{
    Identity, LoginRequest, LoginResponse, RefreshResponse, RegisterRequest, validate_login,
    validate_registration,
};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{ClientError, Result};
use crate::gateway::{self, ApiClient, LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH, REGISTER_PATH};

/// Login, registration and token lifecycle.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Validates the credentials, logs in and starts the session.
    pub async fn login(&self, request: &LoginRequest) -> Result<Option<Identity>> {
        validate_login(request)?;
        let request = request.normalized();

        let response: LoginResponse = self.api.post_json(LOGIN_PATH, &request).await?;
        let identity = self.api.session().begin(response)?;
        info!(username = %request.username, "Logged in");
        Ok(identity)
    }

    /// Creates an account. Returns the backend's confirmation message.
    pub async fn register(&self, request: &RegisterRequest) -> Result<String> {
        validate_registration(request)?;
        let request = request.normalized();

        let response: Value = self
            .api
            .post_json(REGISTER_PATH, &request)
            .await
            .or_else(|e| match e {
                ClientError::InvalidResponse(_) => Ok(Value::Null),
                other => Err(other),
            })?;
        Ok(response
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Registration successful")
            .to_string())
    }

    /// Trades the refresh token for a new access token.
    pub async fn refresh(&self) -> Result<()> {
        let session = self.api.session();
        let refresh_token = session.refresh_token().ok_or(ClientError::NotAuthenticated)?;

        let req = self
            .api
            .request(Method::POST, REFRESH_PATH)
            .header("Refresh-Token", refresh_token)
            .json(&json!({}));
        let resp = self.api.execute(req, REFRESH_PATH).await?;
        let response: RefreshResponse = gateway::read_json(resp).await?;

        if response.token.is_none() {
            return Err(ClientError::invalid_response(
                "refresh response did not contain a token",
            ));
        }
        session.set_token(response.token.as_deref());
        if response.refresh_token.is_some() {
            session.set_refresh_token(response.refresh_token.as_deref());
        }
        if !session.is_authenticated() {
            return Err(ClientError::invalid_response(
                "refresh response contained an unusable token",
            ));
        }
        info!("Access token refreshed");
        Ok(())
    }

    /// Tells the backend, then always clears the local session.
    pub async fn logout(&self) -> Result<()> {
        let session = self.api.session();
        if session.is_authenticated() {
            let req = self.api.request(Method::POST, LOGOUT_PATH);
            if let Err(e) = self.api.execute(req, LOGOUT_PATH).await {
                warn!(
                    error = %e,
                    category = %e.category(),
                    "Logout request failed; clearing local session anyway"
                );
            }
        }
        session.clear();
        Ok(())
    }
}
