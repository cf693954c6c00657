#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use device_login::auth::{
    AuthError, BrowserLauncher, Credential, LoginEvent, LoginEventSink, PollConfig, Profile,
    ProfileStore, StoredProfile,
};
use serde_json::json;
use wiremock::MockServer;

/// Launcher that records every URL instead of opening it.
#[derive(Default)]
pub struct RecordingLauncher {
    opened: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("launcher lock poisoned").clone()
    }
}

impl BrowserLauncher for RecordingLauncher {
    fn open(&self, url: &str) -> Result<(), AuthError> {
        self.opened
            .lock()
            .expect("launcher lock poisoned")
            .push(url.to_string());
        match &self.fail_with {
            Some(message) => Err(AuthError::Platform(message.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<String, StoredProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, profile: &str) -> Option<StoredProfile> {
        self.profiles
            .lock()
            .expect("store lock poisoned")
            .get(profile)
            .cloned()
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn load(&self, profile: &str) -> Result<Option<StoredProfile>, AuthError> {
        Ok(self.get(profile))
    }

    fn save(&self, profile: &Profile, credential: &Credential) -> Result<(), AuthError> {
        let stored = StoredProfile {
            version: 1,
            profile: profile.name.clone(),
            device_name: profile.device_name.clone(),
            account_id: credential.account_id.clone(),
            account_display_name: credential.account_display_name.clone(),
            mode: credential.api_key.mode(),
            secret: credential.api_key.secret().to_string(),
            saved_at: Utc::now(),
        };
        self.profiles
            .lock()
            .expect("store lock poisoned")
            .insert(profile.name.clone(), stored);
        Ok(())
    }

    fn clear(&self, profile: &str) -> Result<(), AuthError> {
        self.profiles
            .lock()
            .expect("store lock poisoned")
            .remove(profile);
        Ok(())
    }
}

/// Store whose writes always fail.
pub struct FailingStore;

impl ProfileStore for FailingStore {
    fn load(&self, _profile: &str) -> Result<Option<StoredProfile>, AuthError> {
        Ok(None)
    }

    fn save(&self, _profile: &Profile, _credential: &Credential) -> Result<(), AuthError> {
        Err(AuthError::Persistence("read-only file system".to_string()))
    }

    fn clear(&self, _profile: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Event sink that keeps every event for later assertions.
pub fn collecting_sink() -> (LoginEventSink, Arc<Mutex<Vec<LoginEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = events.clone();
    let sink: LoginEventSink = Arc::new(move |event| {
        captured.lock().expect("events lock poisoned").push(event);
    });
    (sink, events)
}

/// A URL on a port nothing is listening on.
pub fn unreachable_url(path: &str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}{path}")
}

pub fn links_body(server: &MockServer) -> serde_json::Value {
    json!({
        "browser_url": format!("{}/browser", server.uri()),
        "poll_url": format!("{}/poll", server.uri()),
        "verification_code": "dinosaur-pineapple-polkadot"
    })
}

pub fn redeemed_body() -> serde_json::Value {
    json!({
        "redeemed": true,
        "account_id": "acct_123",
        "testmode_key_secret": "sk_test_1234"
    })
}

pub fn pending_body() -> serde_json::Value {
    json!({ "redeemed": false })
}

/// Fast fixed-interval polling for tests.
pub fn quick_poll(max_total_wait: Duration) -> PollConfig {
    PollConfig::fixed(Duration::from_millis(10), max_total_wait)
}
