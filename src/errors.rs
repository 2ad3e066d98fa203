use thiserror::Error;

/// Movie Explorer errors.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// The base URL provided is not a valid http(s) URL.
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API rejected the credentials or the bearer token.
    /// Returned for 401 and 403 responses.
    #[error("Invalid email or password.")]
    Auth,

    /// Field level violations. Server-sourced messages are kept verbatim.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    /// Failed to reach the API, or the API answered with an unexpected status.
    /// This is a catch-all for transport and server failures.
    #[error("Request to the Movie Explorer API failed: {0}")]
    Network(String),

    /// The API returned a 404: Not Found status code.
    #[error("{0} not found.")]
    NotFound(String),

    /// A local session or token was required but is absent.
    #[error("{0}")]
    State(String),

    /// The API answered with a body that could not be decoded.
    #[error("Failed to decode API response: {0}")]
    Decode(String),

    /// The local key-value store could not be read or written.
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl ExplorerError {
    /// Shorthand for the missing-token case shared by every privileged call.
    pub fn missing_token() -> Self {
        ExplorerError::State("You need to sign in first.".to_string())
    }

    /// Messages suitable for a form: the server strings for validation failures,
    /// the display text otherwise.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ExplorerError::Validation(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl From<reqwest::Error> for ExplorerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ExplorerError::Decode(err.to_string())
        } else {
            ExplorerError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for ExplorerError {
    fn from(err: std::io::Error) -> Self {
        ExplorerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
