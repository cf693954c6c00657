//! Top-level error type for a login run.

use strum::Display;
use thiserror::Error;

use crate::auth::AuthError;

/// Step of the login sequence that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LoginStep {
    #[strum(serialize = "request login links")]
    RequestLinks,
    #[strum(serialize = "open browser")]
    OpenBrowser,
    #[strum(serialize = "poll for key")]
    Poll,
    #[strum(serialize = "validate key")]
    Validate,
    #[strum(serialize = "save profile")]
    Persist,
}

/// A login failure: the untouched component error plus the step it came from.
#[derive(Debug, Error)]
#[error("{step}: {source}")]
pub struct LoginError {
    pub step: LoginStep,
    #[source]
    pub source: AuthError,
}

impl LoginError {
    pub fn new(step: LoginStep, source: AuthError) -> Self {
        Self { step, source }
    }

    /// The component error, unchanged.
    pub fn kind(&self) -> &AuthError {
        &self.source
    }

    pub fn into_inner(self) -> AuthError {
        self.source
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, AuthError::Cancelled)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LoginError>;

/// Attach a [`LoginStep`] to a component result.
pub(crate) trait AtStep<T> {
    fn at_step(self, step: LoginStep) -> Result<T>;
}

impl<T> AtStep<T> for std::result::Result<T, AuthError> {
    fn at_step(self, step: LoginStep) -> Result<T> {
        self.map_err(|source| LoginError::new(step, source))
    }
}
