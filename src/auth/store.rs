use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credential::{ApiKey, Credential, KeyMode};
use super::error::AuthError;

const PROFILE_FILE_VERSION: u32 = 1;

/// Device and profile context for one login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub device_name: String,
}

impl Profile {
    pub fn new(name: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_name: device_name.into(),
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new("default", default_device_name())
    }
}

/// Host name from the environment, used to label the issued key.
pub fn default_device_name() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown-device".to_string())
}

/// Record written for a profile after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProfile {
    pub version: u32,
    pub profile: String,
    pub device_name: String,
    pub account_id: String,
    pub account_display_name: Option<String>,
    pub mode: KeyMode,
    pub secret: String,
    pub saved_at: DateTime<Utc>,
}

impl StoredProfile {
    pub fn api_key(&self) -> ApiKey {
        match self.mode {
            KeyMode::Test => ApiKey::Test(self.secret.clone()),
            KeyMode::Live => ApiKey::Live(self.secret.clone()),
        }
    }
}

/// Persistence sink for credentials obtained by a login.
pub trait ProfileStore: Send + Sync {
    fn load(&self, profile: &str) -> Result<Option<StoredProfile>, AuthError>;
    fn save(&self, profile: &Profile, credential: &Credential) -> Result<(), AuthError>;
    fn clear(&self, profile: &str) -> Result<(), AuthError>;
}

/// File-backed profile store, one TOML file per profile.
///
/// # Example
/// ```no_run
/// use device_login::auth::{FileProfileStore, ProfileStore};
///
/// let store = FileProfileStore::new_default();
/// let stored = store.load("default")?;
/// # Ok::<(), device_login::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    base_dir: PathBuf,
}

impl FileProfileStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn new_default() -> Self {
        Self::new(default_config_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn profile_path(&self, profile: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.toml", normalize_label(profile)))
    }
}

impl ProfileStore for FileProfileStore {
    fn load(&self, profile: &str) -> Result<Option<StoredProfile>, AuthError> {
        let path = self.profile_path(profile);
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let stored: StoredProfile = toml::from_str(&raw)?;
        if stored.version != PROFILE_FILE_VERSION {
            return Err(AuthError::Persistence(format!(
                "unsupported profile file version {} at {}",
                stored.version,
                path.display()
            )));
        }
        Ok(Some(stored))
    }

    fn save(&self, profile: &Profile, credential: &Credential) -> Result<(), AuthError> {
        let path = self.profile_path(&profile.name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored = StoredProfile {
            version: PROFILE_FILE_VERSION,
            profile: profile.name.clone(),
            device_name: profile.device_name.clone(),
            account_id: credential.account_id.clone(),
            account_display_name: credential.account_display_name.clone(),
            mode: credential.api_key.mode(),
            secret: credential.api_key.secret().to_string(),
            saved_at: Utc::now(),
        };
        let serialized = toml::to_string(&stored)?;
        write_private(&path, &serialized)?;
        tracing::debug!(path = %path.display(), "profile saved");
        Ok(())
    }

    fn clear(&self, profile: &str) -> Result<(), AuthError> {
        match fs::remove_file(self.profile_path(profile)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Write `contents` to a file only the owner can read. The mode is set at
/// creation and tightened on an existing file before the secret lands.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())?;
    file.flush()
}

/// `~/.device-login`, or `.device-login` when no home directory is known.
pub fn default_config_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".device-login"))
        .unwrap_or_else(|| PathBuf::from(".device-login"))
}

fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    let out: String = trimmed
        .chars()
        .map(|ch| {
            let lower = ch.to_ascii_lowercase();
            if lower.is_ascii_alphanumeric() || lower == '-' {
                lower
            } else {
                '-'
            }
        })
        .collect();
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}
