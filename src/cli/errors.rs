//! CLI-specific error formatting for user-facing messages.

use thiserror::Error;

use crate::auth::AuthError;
use crate::error::{LoginError, LoginStep};

/// Anything a CLI command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Login(#[from] LoginError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Map a [`CliError`] to a single user-facing line with actionable guidance.
pub fn format_error_help(err: &CliError) -> String {
    match err {
        CliError::Login(err) => match (err.step, err.kind()) {
            (_, AuthError::Cancelled) => "Login cancelled.".to_string(),
            (_, AuthError::Timeout { .. }) => {
                "Timed out waiting for the browser login. Run: device-login login".to_string()
            }
            (LoginStep::OpenBrowser, AuthError::Platform(msg)) => format!(
                "Could not open a browser ({msg}). Run: device-login login --no-browser"
            ),
            (LoginStep::RequestLinks, AuthError::Request(msg)) => {
                format!("Could not reach the login service: {msg}")
            }
            (LoginStep::Validate, inner) => {
                format!("The issued key was rejected: {inner}")
            }
            _ => format!("Login failed: {err}"),
        },
        CliError::Auth(AuthError::InvalidConfig(msg)) => {
            format!("Configuration error: {msg}. Check your .env or command-line flags")
        }
        CliError::Auth(other) => format!("{other}"),
    }
}
