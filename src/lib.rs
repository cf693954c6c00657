//! device-login: log a command-line tool in through the browser.
//!
//! The handshake asks an authorization endpoint for a browser URL, a poll
//! URL and a verification code, opens the browser URL for the user, then
//! polls until the browser session is redeemed and a secret key is issued.
//! The key is validated and stored in a profile.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use device_login::auth::{
//!     FileProfileStore, LoginFlow, Profile, SecretKeyValidator, SystemBrowser,
//! };
//!
//! # async fn example() -> device_login::error::Result<()> {
//! let flow = LoginFlow::new(
//!     Arc::new(SystemBrowser),
//!     Arc::new(SecretKeyValidator),
//!     Arc::new(FileProfileStore::new_default()),
//! );
//! let credential = flow.run(&Profile::new("default", "my-laptop")).await?;
//! println!("{} mode key stored", credential.api_key.mode());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
