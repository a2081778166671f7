//! Request wrapper shared by the feature services.
//!
//! Every request gets the session's bearer token, except the endpoints
//! that create a session. Any 401 ends the session and sends the user to
//! the login route.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::navigation::{Navigator, Route};
use crate::session::SessionStore;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

/// Paths that must never carry a bearer token.
const PUBLIC_PATHS: [&str; 3] = [LOGIN_PATH, REGISTER_PATH, REFRESH_PATH];

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            session,
            navigator,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, self.url(path))
            .header("Accept", "application/json");
        if !is_public_path(path)
            && let Some(token) = self.session.token()
        {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Sends the request and turns any non-success status into an error.
    pub(crate) async fn execute(&self, req: RequestBuilder, path: &str) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        debug!(path, status = status.as_u16(), "Backend responded");

        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.on_unauthorized(path);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ClientError::from_status(
            status.as_u16(),
            error_message(status, &body),
        ))
    }

    fn on_unauthorized(&self, path: &str) {
        warn!(path, "Backend rejected credentials; ending session");
        self.session.clear();
        if self.navigator.current() != Route::Login {
            self.navigator.redirect(Route::Login);
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let mut req = self.request(Method::GET, path);
        if !query.is_empty() {
            req = req.query(query);
        }
        let resp = self.execute(req, path).await?;
        read_json(resp).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::POST, path).json(body);
        let resp = self.execute(req, path).await?;
        read_json(resp).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::PUT, path).json(body);
        let resp = self.execute(req, path).await?;
        read_json(resp).await
    }

    /// Returns the response body, which may be empty.
    pub async fn delete(&self, path: &str) -> Result<String> {
        let req = self.request(Method::DELETE, path);
        let resp = self.execute(req, path).await?;
        Ok(resp.text().await?)
    }

    /// Returns the raw body so callers can accept empty responses.
    pub async fn post_multipart(&self, path: &str, form: reqwest::multipart::Form) -> Result<String> {
        let req = self.request(Method::POST, path).multipart(form);
        let resp = self.execute(req, path).await?;
        Ok(resp.text().await?)
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::invalid_response(e.to_string()))
}

/// Unwraps a `{"data": ...}` envelope; other values pass through.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Human message for a failed response: `message`, then `error`, then the
/// raw body, then the status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(message) = json.get(key).and_then(Value::as_str)
                && !message.trim().is_empty()
            {
                return message.trim().to_string();
            }
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}
