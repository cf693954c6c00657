use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::error::AuthError;
use super::http::{decode, send_expecting_ok};

/// Endpoint used when the caller does not supply an authorization URL.
pub const DEFAULT_AUTH_URL: &str = "https://dashboard.stripe.com/stripecli/auth";

/// URLs and code returned by the authorization endpoint.
///
/// # Example
/// ```
/// use device_login::auth::LoginLinks;
///
/// let links = LoginLinks {
///     browser_url: "https://example.com/browser".to_string(),
///     poll_url: "https://example.com/poll".to_string(),
///     verification_code: "dinosaur-pineapple-polkadot".to_string(),
/// };
/// assert!(links.ensure_complete().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginLinks {
    pub browser_url: String,
    pub poll_url: String,
    pub verification_code: String,
}

impl LoginLinks {
    /// Reject a response that decoded but left a field empty.
    pub fn ensure_complete(&self) -> Result<(), AuthError> {
        for (name, value) in [
            ("browser_url", &self.browser_url),
            ("poll_url", &self.poll_url),
            ("verification_code", &self.verification_code),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::Decode(format!(
                    "login links response has an empty {name}"
                )));
            }
        }
        Ok(())
    }
}

/// Ask the authorization endpoint for a fresh set of login links.
///
/// Makes exactly one form-encoded POST with `device_name` as the only field.
/// An empty `auth_url` falls back to [`DEFAULT_AUTH_URL`].
pub async fn request_links(
    client: &reqwest::Client,
    auth_url: &str,
    device_name: &str,
    cancel: &CancellationToken,
) -> Result<LoginLinks, AuthError> {
    let auth_url = if auth_url.is_empty() {
        DEFAULT_AUTH_URL
    } else {
        auth_url
    };
    tracing::debug!(auth_url, device_name, "requesting login links");

    let request = client
        .post(auth_url)
        .header("Accept", "application/json")
        .form(&[("device_name", device_name)]);
    let body = send_expecting_ok(request, cancel).await?;
    let links: LoginLinks = decode(&body)?;
    links.ensure_complete()?;
    Ok(links)
}
