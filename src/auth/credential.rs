use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::error::AuthError;

/// Which environment an issued secret key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KeyMode {
    Test,
    Live,
}

/// A secret key tagged with the mode it was issued for.
///
/// The poll response names the field after the mode (`testmode_key_secret`
/// or `livemode_key_secret`), so the mode travels with the secret rather
/// than being inferred from the key text.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "secret", rename_all = "snake_case")]
pub enum ApiKey {
    Test(String),
    Live(String),
}

impl ApiKey {
    pub fn mode(&self) -> KeyMode {
        match self {
            Self::Test(_) => KeyMode::Test,
            Self::Live(_) => KeyMode::Live,
        }
    }

    pub fn secret(&self) -> &str {
        match self {
            Self::Test(secret) | Self::Live(secret) => secret,
        }
    }

    /// Secret with most of its final `_` segment masked, safe for logs and
    /// status output. At most four characters and never more than half of
    /// that segment stay visible.
    pub fn redacted(&self) -> String {
        let secret = self.secret();
        let keep = secret.rfind('_').map(|idx| idx + 1).unwrap_or(0);
        let tail = &secret[keep..];
        let shown = (tail.chars().count() / 2).min(4);
        let visible: String = tail.chars().take(shown).collect();
        format!("{}{}****", &secret[..keep], visible)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(match self {
            Self::Test(_) => "Test",
            Self::Live(_) => "Live",
        })
        .field(&self.redacted())
        .finish()
    }
}

/// Credential handed back once the browser login has been redeemed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub account_id: String,
    pub account_display_name: Option<String>,
    pub api_key: ApiKey,
}

/// One response from the poll endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollResult {
    pub redeemed: bool,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub account_display_name: Option<String>,
    #[serde(default)]
    pub testmode_key_secret: Option<String>,
    #[serde(default)]
    pub livemode_key_secret: Option<String>,
}

impl PollResult {
    /// The issued key, preferring test mode when both are present.
    pub fn api_key(&self) -> Option<ApiKey> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|secret| !secret.is_empty())
                .map(str::to_string)
        };
        present(&self.testmode_key_secret)
            .map(ApiKey::Test)
            .or_else(|| present(&self.livemode_key_secret).map(ApiKey::Live))
    }

    /// Convert a redeemed response into a [`Credential`].
    pub fn into_credential(self) -> Result<Credential, AuthError> {
        if !self.redeemed {
            return Err(AuthError::Decode(
                "poll response has not been redeemed".to_string(),
            ));
        }
        let api_key = self.api_key().ok_or_else(|| {
            AuthError::Decode("redeemed poll response carried no key secret".to_string())
        })?;
        let account_id = self
            .account_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                AuthError::Decode("redeemed poll response carried no account_id".to_string())
            })?;
        Ok(Credential {
            account_id,
            account_display_name: self.account_display_name,
            api_key,
        })
    }
}
