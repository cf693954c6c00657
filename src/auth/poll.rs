//! Polling the login endpoint until the browser session is redeemed.

use std::time::Duration;

use strum::Display;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::credential::{Credential, PollResult};
use super::error::AuthError;
use super::http::{decode, default_client, send_expecting_ok};
use crate::util::backoff::Backoff;

const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.5;
const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_MAX_TOTAL_WAIT: Duration = Duration::from_secs(5 * 60);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timing policy for [`KeyPoller`].
///
/// `PollConfig::default()` selects the built-in policy. Every field is
/// taken literally: a zero interval means "do not wait between attempts",
/// not "use the default".
///
/// # Example
/// ```
/// use std::time::Duration;
/// use device_login::auth::PollConfig;
///
/// let config = PollConfig::default()
///     .with_initial_interval(Duration::from_millis(500))
///     .with_max_total_wait(Duration::from_secs(60));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Wait before the second attempt. The first attempt is immediate.
    pub initial_interval: Duration,
    /// Growth factor applied to the interval after each wait.
    pub backoff_multiplier: f64,
    /// Upper bound for any single wait.
    pub max_interval: Duration,
    /// Give up once this much time has passed since the first attempt.
    pub max_total_wait: Duration,
    /// Optional cap on the number of attempts.
    pub max_attempts: Option<u32>,
    /// Per-request timeout for each poll.
    pub request_timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_interval: DEFAULT_MAX_INTERVAL,
            max_total_wait: DEFAULT_MAX_TOTAL_WAIT,
            max_attempts: None,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl PollConfig {
    /// Poll at a constant interval until `max_total_wait` elapses.
    pub fn fixed(interval: Duration, max_total_wait: Duration) -> Self {
        Self {
            initial_interval: interval,
            backoff_multiplier: 1.0,
            max_interval: interval,
            max_total_wait,
            ..Self::default()
        }
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    pub fn with_max_total_wait(mut self, wait: Duration) -> Self {
        self.max_total_wait = wait;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(AuthError::InvalidConfig(format!(
                "backoff multiplier must be a finite value >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        if self.max_interval < self.initial_interval {
            return Err(AuthError::InvalidConfig(format!(
                "max interval {:?} is shorter than initial interval {:?}",
                self.max_interval, self.initial_interval
            )));
        }
        if self.max_attempts == Some(0) {
            return Err(AuthError::InvalidConfig(
                "max attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn backoff(&self) -> Backoff {
        Backoff::new(
            self.initial_interval,
            self.backoff_multiplier,
            self.max_interval,
        )
    }
}

/// Lifecycle of one poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PollState {
    Polling,
    Redeemed,
    TimedOut,
    Cancelled,
    Failed,
}

/// Input that moves a [`PollState`] forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvent {
    Response { redeemed: bool },
    DeadlineExceeded,
    CancelRequested,
    Error,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Polling)
    }

    /// Apply an event. Terminal states absorb every event.
    pub fn next(self, event: PollEvent) -> Self {
        if self.is_terminal() {
            return self;
        }
        match event {
            PollEvent::Response { redeemed: true } => Self::Redeemed,
            PollEvent::Response { redeemed: false } => Self::Polling,
            PollEvent::DeadlineExceeded => Self::TimedOut,
            PollEvent::CancelRequested => Self::Cancelled,
            PollEvent::Error => Self::Failed,
        }
    }
}

/// Polls a login's poll URL until the user finishes the browser flow.
///
/// # Example
/// ```no_run
/// use device_login::auth::{KeyPoller, PollConfig};
///
/// # async fn example() -> Result<(), device_login::auth::AuthError> {
/// let poller = KeyPoller::new(reqwest::Client::new(), PollConfig::default());
/// let credential = poller.poll("https://example.com/poll/abc").await?;
/// println!("logged in to {}", credential.account_id);
/// # Ok(())
/// # }
/// ```
pub struct KeyPoller {
    client: reqwest::Client,
    config: PollConfig,
    cancel: CancellationToken,
}

impl KeyPoller {
    pub fn new(client: reqwest::Client, config: PollConfig) -> Self {
        Self {
            client,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Poller with the default client and [`PollConfig::default`].
    pub fn with_defaults() -> Self {
        Self::new(default_client(), PollConfig::default())
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll until redeemed, timed out, cancelled or failed.
    ///
    /// The first request is sent immediately. Only "not yet redeemed"
    /// responses are retried; transport, status and decode errors end the
    /// loop at once.
    pub async fn poll(&self, poll_url: &str) -> Result<Credential, AuthError> {
        self.config.validate()?;

        let started = Instant::now();
        // A total wait past the clock's range polls until redeemed or cancelled.
        let deadline = started.checked_add(self.config.max_total_wait);
        let mut backoff = self.config.backoff();
        let mut state = PollState::Polling;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let result = match self.poll_once(poll_url).await {
                Ok(result) => result,
                Err(err) => {
                    let event = if matches!(err, AuthError::Cancelled) {
                        PollEvent::CancelRequested
                    } else {
                        PollEvent::Error
                    };
                    log_transition(&mut state, event, attempts);
                    return Err(err);
                }
            };

            log_transition(
                &mut state,
                PollEvent::Response {
                    redeemed: result.redeemed,
                },
                attempts,
            );
            if state == PollState::Redeemed {
                let credential = result.into_credential();
                if let Err(err) = &credential {
                    tracing::debug!(error = %err, attempts, "redeemed response was unusable");
                }
                return credential;
            }

            let now = Instant::now();
            let attempts_exhausted = self
                .config
                .max_attempts
                .is_some_and(|max| attempts >= max);
            let deadline_passed = deadline.is_some_and(|deadline| now >= deadline);
            if attempts_exhausted || deadline_passed {
                log_transition(&mut state, PollEvent::DeadlineExceeded, attempts);
                return Err(AuthError::Timeout {
                    attempts,
                    waited_ms: u64::try_from((now - started).as_millis()).unwrap_or(u64::MAX),
                });
            }

            let mut wait = backoff.next_interval();
            if let Some(deadline) = deadline {
                wait = wait.min(deadline - now);
            }
            tracing::trace!(
                attempt = attempts,
                interval_ms = wait.as_millis() as u64,
                "login not redeemed yet"
            );
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    log_transition(&mut state, PollEvent::CancelRequested, attempts);
                    return Err(AuthError::Cancelled);
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    async fn poll_once(&self, poll_url: &str) -> Result<PollResult, AuthError> {
        let mut request = self
            .client
            .get(poll_url)
            .header("Accept", "application/json");
        if let Some(timeout) = self.config.request_timeout {
            request = request.timeout(timeout);
        }
        let body = send_expecting_ok(request, &self.cancel).await?;
        decode(&body)
    }
}

fn log_transition(state: &mut PollState, event: PollEvent, attempts: u32) {
    let next = state.next(event);
    if next != *state {
        tracing::debug!(from = %state, to = %next, attempts, "poll state changed");
    }
    *state = next;
}
