use std::error::Error as StdError;

use thiserror::Error;

/// Failure modes of a single handshake component.
///
/// Each variant is returned unchanged to the caller; the orchestrator only
/// tags it with the step that produced it (see [`crate::error::LoginError`]).
#[derive(Debug, Error)]
pub enum AuthError {
    /// The transport call itself failed (DNS, refused connection, timeout).
    #[error("{0}")]
    Request(String),
    #[error("unexpected http status code: {status} {body}")]
    HttpStatus { status: u16, body: String },
    #[error("{0}")]
    Decode(String),
    #[error("could not open browser: {0}")]
    Platform(String),
    #[error("login was not completed after {attempts} poll attempts over {waited_ms}ms")]
    Timeout { attempts: u32, waited_ms: u64 },
    #[error("login cancelled")]
    Cancelled,
    #[error("{0}")]
    Validation(String),
    #[error("could not save profile: {0}")]
    Persistence(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AuthError {
    /// Whether this error came from the poll deadline rather than a failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error_chain(&error))
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Persistence(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Persistence(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Persistence(error.to_string())
    }
}

/// Flatten an error and its sources into one line.
///
/// reqwest hides the OS-level cause ("Connection refused") behind its own
/// top-level message, so the whole chain is surfaced.
fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
