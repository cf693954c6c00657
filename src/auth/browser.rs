//! Opening the login link in the user's browser.

use super::error::AuthError;

/// Capability to open a URL for the user.
///
/// Injected into [`crate::auth::LoginFlow`] so tests can substitute a fake.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> Result<(), AuthError>;
}

/// Opens URLs with the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), AuthError> {
        tracing::debug!(url, "opening browser");
        webbrowser::open(url).map_err(|err| AuthError::Platform(err.to_string()))
    }
}

/// Launcher that opens nothing; the user follows the printed link instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualBrowser;

impl BrowserLauncher for ManualBrowser {
    fn open(&self, url: &str) -> Result<(), AuthError> {
        tracing::debug!(url, "browser launch skipped");
        Ok(())
    }
}
