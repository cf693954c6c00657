//! Shared request plumbing for the handshake endpoints.

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::error::AuthError;

/// User agent sent with every handshake request.
pub const USER_AGENT: &str = concat!("device-login/", env!("CARGO_PKG_VERSION"));

/// Build the client used when the caller does not supply one.
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Send a request, drain the body and require HTTP 200.
///
/// Both the send and the body read race `cancel`; a fired token drops the
/// in-flight request.
pub async fn send_expecting_ok(
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> Result<String, AuthError> {
    let exchange = async {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok::<_, AuthError>((status, body))
    };
    let (status, body) = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(AuthError::Cancelled),
        result = exchange => result?,
    };
    if status != StatusCode::OK {
        tracing::debug!(status = status.as_u16(), "handshake endpoint rejected request");
        return Err(AuthError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Decode a JSON body, mapping shape mismatches to [`AuthError::Decode`].
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, AuthError> {
    Ok(serde_json::from_str(body)?)
}
