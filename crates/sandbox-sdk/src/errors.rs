use std::fmt;

/// Broad category of a [`SandboxError`], useful for matching without
/// destructuring the error payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Validation,
    Api,
    Transport,
    Decode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Validation => "validation",
            Self::Api => "api",
            Self::Transport => "transport",
            Self::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Top-level error type for the public client API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid caller input, rejected before any request is sent.
    #[error("validation error: {0}")]
    Validation(String),
    /// The service answered with a non-success HTTP status.
    #[error("sandbox API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// Connection, timeout, or body read failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// A response body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

impl SandboxError {
    /// Creates an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a response decoding error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Api { .. } => ErrorKind::Api,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(message)
            | Self::Validation(message)
            | Self::Transport(message)
            | Self::Decode(message)
            | Self::Api { message, .. } => message,
        }
    }

    /// Returns the HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the service reported the resource as missing (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Extracts a readable message from an error response body.
///
/// JSON bodies of the form `{"error": "..."}`, `{"error": {"message": "..."}}`
/// or `{"message": "..."}` yield the inner text; anything else is returned
/// trimmed as-is.
pub(crate) fn api_error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return trimmed.to_string();
    };
    value
        .get("error")
        .and_then(|e| e.as_str().or_else(|| e.get("message").and_then(|m| m.as_str())))
        .or_else(|| value.get("message").and_then(|v| v.as_str()))
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| trimmed.to_string())
}
