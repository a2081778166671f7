use std::time::Duration;

/// Backend the console talks to when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Settings shared by every client service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without the `/api` or `/hospital` prefix.
    pub base_url: String,

    /// HTTP request timeout (default: 30 seconds).
    pub request_timeout: Duration,

    /// How long a torn-down image resource stays alive while the engine
    /// may still be reading it (default: 10 seconds).
    pub release_grace: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            release_grace: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration pointing at `base_url` with default timings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the grace delay before releasing a torn-down image resource.
    #[must_use]
    pub fn with_release_grace(mut self, grace: Duration) -> Self {
        self.release_grace = grace;
        self
    }
}
