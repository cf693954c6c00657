//! Configuration (layered: command-line flag > environment > built-in default).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::store::{default_config_dir, default_device_name};
use crate::auth::{AuthError, FileProfileStore, PollConfig, Profile};

pub const ENV_AUTH_URL: &str = "DEVICE_LOGIN_AUTH_URL";
pub const ENV_DEVICE_NAME: &str = "DEVICE_LOGIN_DEVICE_NAME";
pub const ENV_PROFILE: &str = "DEVICE_LOGIN_PROFILE";
pub const ENV_CONFIG_DIR: &str = "DEVICE_LOGIN_CONFIG_DIR";
pub const ENV_POLL_INTERVAL_MS: &str = "DEVICE_LOGIN_POLL_INTERVAL_MS";
pub const ENV_POLL_MAX_INTERVAL_MS: &str = "DEVICE_LOGIN_POLL_MAX_INTERVAL_MS";
pub const ENV_POLL_MULTIPLIER: &str = "DEVICE_LOGIN_POLL_MULTIPLIER";
pub const ENV_POLL_TIMEOUT_SECS: &str = "DEVICE_LOGIN_POLL_TIMEOUT_SECS";

/// Settings for a login run, before command-line overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginConfig {
    /// Authorization endpoint; `None` selects the built-in default.
    pub auth_url: Option<String>,
    pub device_name: Option<String>,
    pub profile: Option<String>,
    pub config_dir: Option<PathBuf>,
    pub poll: PollConfig,
}

impl LoginConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, AuthError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut poll = PollConfig::default();
        if let Some(ms) = parse_var::<u64>(&text, ENV_POLL_INTERVAL_MS)? {
            poll.initial_interval = Duration::from_millis(ms);
            poll.max_interval = poll.max_interval.max(poll.initial_interval);
        }
        if let Some(ms) = parse_var::<u64>(&text, ENV_POLL_MAX_INTERVAL_MS)? {
            poll.max_interval = Duration::from_millis(ms);
        }
        if let Some(multiplier) = parse_var::<f64>(&text, ENV_POLL_MULTIPLIER)? {
            poll.backoff_multiplier = multiplier;
        }
        if let Some(secs) = parse_var::<u64>(&text, ENV_POLL_TIMEOUT_SECS)? {
            poll.max_total_wait = Duration::from_secs(secs);
        }
        poll.validate()?;

        Ok(Self {
            auth_url: text(ENV_AUTH_URL),
            device_name: text(ENV_DEVICE_NAME),
            profile: text(ENV_PROFILE),
            config_dir: text(ENV_CONFIG_DIR).map(PathBuf::from),
            poll,
        })
    }

    /// Profile context, falling back to `default` and the host name.
    pub fn profile(&self) -> Profile {
        Profile::new(
            self.profile.clone().unwrap_or_else(|| "default".to_string()),
            self.device_name.clone().unwrap_or_else(default_device_name),
        )
    }

    pub fn store(&self) -> FileProfileStore {
        FileProfileStore::new(self.config_dir.clone().unwrap_or_else(default_config_dir))
    }

    /// Authorization URL to pass to the link request (empty means default).
    pub fn auth_url(&self) -> &str {
        self.auth_url.as_deref().unwrap_or_default()
    }
}

fn parse_var<T: FromStr>(
    text: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, AuthError> {
    text(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| AuthError::InvalidConfig(format!("{key} has invalid value {raw:?}")))
        })
        .transpose()
}
