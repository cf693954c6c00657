//! Browser-delegated login handshake and its collaborators.

pub mod browser;
pub mod credential;
pub mod error;
pub mod http;
pub mod links;
pub mod login;
pub mod poll;
pub mod store;
pub mod validate;

pub use browser::{BrowserLauncher, ManualBrowser, SystemBrowser};
pub use credential::{ApiKey, Credential, KeyMode, PollResult};
pub use error::AuthError;
pub use links::{request_links, LoginLinks, DEFAULT_AUTH_URL};
pub use login::{LoginEvent, LoginEventSink, LoginFlow};
pub use poll::{KeyPoller, PollConfig, PollEvent, PollState};
pub use store::{FileProfileStore, Profile, ProfileStore, StoredProfile};
pub use validate::{KeyValidator, SecretKeyValidator};
