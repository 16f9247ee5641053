use std::time::Duration;

use reqwest::Url;

use crate::errors::SandboxError;

/// Environment variable holding the service base URL.
pub const API_URL_ENV: &str = "SANDBOX_API_URL";
/// Environment variable holding the optional bearer token.
pub const API_KEY_ENV: &str = "SANDBOX_API_KEY";

/// Configuration for [`SandboxClient`](crate::SandboxClient).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the sandbox service, without a trailing path.
    pub base_url: String,
    /// Optional API key sent as a bearer token.
    pub api_key: Option<String>,
    /// Per-request timeout for non-streaming calls.
    ///
    /// Streaming executions are bounded only by the request's own
    /// `timeout_secs` (if any), since output may arrive for a long time.
    pub timeout: Duration,
    /// TCP connect timeout applied to every request.
    pub connect_timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a config for the given base URL with default timeouts and no
    /// API key.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("sandbox-sdk/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Builds a config from `SANDBOX_API_URL` and `SANDBOX_API_KEY`.
    pub fn from_env() -> Result<Self, SandboxError> {
        let base_url = std::env::var(API_URL_ENV).unwrap_or_default();
        if base_url.trim().is_empty() {
            return Err(SandboxError::Config(format!(
                "missing {API_URL_ENV} for sandbox client"
            )));
        }
        let mut config = Self::new(base_url.trim());
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            config.api_key = Some(key.trim().to_string());
        }
        Ok(config)
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Overrides the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Overrides the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub(crate) fn validate(&self) -> Result<(), SandboxError> {
        self.parsed_base_url()?;
        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(SandboxError::Config("api_key must not be blank".into()));
        }
        Ok(())
    }

    fn parsed_base_url(&self) -> Result<Url, SandboxError> {
        let raw = self.base_url.trim();
        if raw.is_empty() {
            return Err(SandboxError::Config("base_url must not be empty".into()));
        }
        let url = Url::parse(raw)
            .map_err(|e| SandboxError::Config(format!("invalid base_url {raw}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SandboxError::Config(format!(
                "base_url must use http or https (got {raw})"
            )));
        }
        Ok(url)
    }

    /// Builds the URL for an API path given as individual segments.
    ///
    /// Segments are percent-encoded, so ids and file names can't escape
    /// their position in the path.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, SandboxError> {
        let mut url = self.parsed_base_url()?;
        url.path_segments_mut()
            .map_err(|_| SandboxError::Config(format!("base_url {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
