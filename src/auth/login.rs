//! The full login handshake: links, browser, poll, validate, persist.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::browser::BrowserLauncher;
use super::credential::{Credential, KeyMode};
use super::http::default_client;
use super::links::{request_links, LoginLinks};
use super::poll::{KeyPoller, PollConfig};
use super::store::{Profile, ProfileStore};
use super::validate::KeyValidator;
use crate::error::{AtStep, LoginStep, Result};

/// Progress notifications emitted while a login runs.
#[derive(Debug, Clone)]
pub enum LoginEvent {
    /// Links are available; the user should be shown the URL and code.
    LinksReady { links: LoginLinks },
    /// The browser launcher accepted the URL.
    BrowserOpened { url: String },
    /// The login was redeemed and the key passed validation.
    Redeemed { account_id: String, mode: KeyMode },
    /// The credential was written to the profile store.
    Saved { profile: String },
}

/// Callback receiving [`LoginEvent`]s.
pub type LoginEventSink = Arc<dyn Fn(LoginEvent) + Send + Sync>;

/// Sequences one login attempt.
///
/// Every step must succeed before the next begins. The first failure ends
/// the run with a [`crate::error::LoginError`] naming the step; nothing is
/// retried here.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use device_login::auth::{
///     FileProfileStore, LoginFlow, Profile, SecretKeyValidator, SystemBrowser,
/// };
///
/// # async fn example() -> device_login::error::Result<()> {
/// let flow = LoginFlow::new(
///     Arc::new(SystemBrowser),
///     Arc::new(SecretKeyValidator),
///     Arc::new(FileProfileStore::new_default()),
/// );
/// let credential = flow.run(&Profile::default()).await?;
/// println!("logged in to {}", credential.account_id);
/// # Ok(())
/// # }
/// ```
pub struct LoginFlow {
    client: reqwest::Client,
    auth_url: String,
    poll_config: PollConfig,
    launcher: Arc<dyn BrowserLauncher>,
    validator: Arc<dyn KeyValidator>,
    store: Arc<dyn ProfileStore>,
    cancel: CancellationToken,
    event_sink: LoginEventSink,
}

impl LoginFlow {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        validator: Arc<dyn KeyValidator>,
        store: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            client: default_client(),
            auth_url: String::new(),
            poll_config: PollConfig::default(),
            launcher,
            validator,
            store,
            cancel: CancellationToken::new(),
            event_sink: Arc::new(print_event),
        }
    }

    /// Authorization endpoint. Empty selects the built-in default.
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn with_poll_config(mut self, config: PollConfig) -> Self {
        self.poll_config = config;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_event_sink(mut self, sink: LoginEventSink) -> Self {
        self.event_sink = sink;
        self
    }

    /// Run the handshake for `profile` and return the stored credential.
    ///
    /// The poll policy is checked before any request, so a flow that can
    /// never finish does not send the user to the browser.
    pub async fn run(&self, profile: &Profile) -> Result<Credential> {
        self.poll_config.validate().at_step(LoginStep::Poll)?;

        let links = request_links(
            &self.client,
            &self.auth_url,
            &profile.device_name,
            &self.cancel,
        )
        .await
        .at_step(LoginStep::RequestLinks)?;

        (self.event_sink)(LoginEvent::LinksReady {
            links: links.clone(),
        });

        self.launcher
            .open(&links.browser_url)
            .at_step(LoginStep::OpenBrowser)?;
        (self.event_sink)(LoginEvent::BrowserOpened {
            url: links.browser_url.clone(),
        });

        let credential = KeyPoller::new(self.client.clone(), self.poll_config.clone())
            .with_cancellation(self.cancel.clone())
            .poll(&links.poll_url)
            .await
            .at_step(LoginStep::Poll)?;

        self.validator
            .validate(credential.api_key.secret())
            .at_step(LoginStep::Validate)?;
        (self.event_sink)(LoginEvent::Redeemed {
            account_id: credential.account_id.clone(),
            mode: credential.api_key.mode(),
        });

        self.store
            .save(profile, &credential)
            .at_step(LoginStep::Persist)?;
        tracing::info!(
            profile = %profile.name,
            account_id = %credential.account_id,
            mode = %credential.api_key.mode(),
            "login complete"
        );
        (self.event_sink)(LoginEvent::Saved {
            profile: profile.name.clone(),
        });

        Ok(credential)
    }
}

/// Default sink: tell the user where to go and what code to expect.
pub fn print_event(event: LoginEvent) {
    if let LoginEvent::LinksReady { links } = event {
        println!(
            "Opening login link {} in your browser.\nVerification code is {}",
            links.browser_url, links.verification_code
        );
    }
}
