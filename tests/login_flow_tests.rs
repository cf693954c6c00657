mod login_support;

use std::sync::Arc;
use std::time::Duration;

use device_login::auth::{
    AuthError, FileProfileStore, KeyMode, LoginEvent, LoginFlow, PollConfig, Profile,
    ProfileStore, SecretKeyValidator,
};
use device_login::error::LoginStep;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use login_support::{
    collecting_sink, links_body, pending_body, quick_poll, redeemed_body, unreachable_url,
    FailingStore, InMemoryProfileStore, RecordingLauncher,
};

fn profile() -> Profile {
    Profile::new("tests", "st-testing")
}

async fn mount_links(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_string("device_name=st-testing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(links_body(server)))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_poll(server: &MockServer, body: serde_json::Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/poll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

fn flow(
    server: &MockServer,
    launcher: Arc<RecordingLauncher>,
    store: Arc<dyn ProfileStore>,
) -> LoginFlow {
    let (sink, _) = collecting_sink();
    LoginFlow::new(launcher, Arc::new(SecretKeyValidator), store)
        .with_auth_url(format!("{}/auth", server.uri()))
        .with_poll_config(quick_poll(Duration::from_secs(5)))
        .with_event_sink(sink)
}

#[tokio::test]
async fn login_stores_redeemed_test_key() {
    let server = MockServer::start().await;
    mount_links(&server).await;
    mount_poll(&server, redeemed_body(), 1).await;

    let launcher = Arc::new(RecordingLauncher::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let (sink, events) = collecting_sink();
    let flow = flow(&server, launcher.clone(), store.clone()).with_event_sink(sink);

    let credential = flow.run(&profile()).await.expect("login");

    assert_eq!(credential.api_key.secret(), "sk_test_1234");
    assert_eq!(launcher.opened(), vec![format!("{}/browser", server.uri())]);

    let stored = store.get("tests").expect("stored profile");
    assert_eq!(stored.secret, "sk_test_1234");
    assert_eq!(stored.mode, KeyMode::Test);
    assert_eq!(stored.account_id, "acct_123");
    assert_eq!(stored.device_name, "st-testing");

    let events = events.lock().unwrap();
    assert!(matches!(
        &events[0],
        LoginEvent::LinksReady { links } if links.verification_code == "dinosaur-pineapple-polkadot"
    ));
    assert!(matches!(events.last(), Some(LoginEvent::Saved { profile }) if profile == "tests"));
}

#[tokio::test]
async fn login_waits_through_pending_polls() {
    let server = MockServer::start().await;
    mount_links(&server).await;
    Mock::given(method("GET"))
        .and(path("/poll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending_body()))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    mount_poll(&server, redeemed_body(), 1).await;

    let store = Arc::new(InMemoryProfileStore::new());
    let flow = flow(&server, Arc::new(RecordingLauncher::new()), store.clone());

    flow.run(&profile()).await.expect("login");
    assert!(store.get("tests").is_some());
}

#[tokio::test]
async fn login_writes_profile_file() {
    let server = MockServer::start().await;
    mount_links(&server).await;
    mount_poll(&server, redeemed_body(), 1).await;

    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileProfileStore::new(dir.path().to_path_buf()));
    let flow = flow(&server, Arc::new(RecordingLauncher::new()), store.clone());

    flow.run(&profile()).await.expect("login");

    let stored = store.load("tests").unwrap().expect("profile on disk");
    assert_eq!(stored.secret, "sk_test_1234");
}

#[tokio::test]
async fn unreachable_server_fails_before_browser_launch() {
    let launcher = Arc::new(RecordingLauncher::new());
    let store = Arc::new(InMemoryProfileStore::new());
    let (sink, events) = collecting_sink();
    let flow = LoginFlow::new(launcher.clone(), Arc::new(SecretKeyValidator), store.clone())
        .with_auth_url(unreachable_url("/auth"))
        .with_event_sink(sink);

    let err = flow.run(&profile()).await.unwrap_err();

    assert_eq!(err.step, LoginStep::RequestLinks);
    assert!(matches!(err.kind(), AuthError::Request(_)));
    assert!(launcher.opened().is_empty());
    assert!(events.lock().unwrap().is_empty());
    assert!(store.get("tests").is_none());
}

#[tokio::test]
async fn link_status_error_is_returned_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let launcher = Arc::new(RecordingLauncher::new());
    let flow = flow(&server, launcher.clone(), Arc::new(InMemoryProfileStore::new()));
    let err = flow.run(&profile()).await.unwrap_err();

    assert_eq!(err.step, LoginStep::RequestLinks);
    assert_eq!(err.kind().to_string(), "unexpected http status code: 500 ");
    assert!(launcher.opened().is_empty());
}

#[tokio::test]
async fn browser_failure_stops_before_polling() {
    let server = MockServer::start().await;
    mount_links(&server).await;
    mount_poll(&server, redeemed_body(), 0).await;

    let launcher = Arc::new(RecordingLauncher::failing("unsupported platform"));
    let store = Arc::new(InMemoryProfileStore::new());
    let flow = flow(&server, launcher, store.clone());

    let err = flow.run(&profile()).await.unwrap_err();

    assert_eq!(err.step, LoginStep::OpenBrowser);
    match err.kind() {
        AuthError::Platform(msg) => assert_eq!(msg, "unsupported platform"),
        other => panic!("expected Platform, got {other:?}"),
    }
    assert!(store.get("tests").is_none());
}

#[tokio::test]
async fn poll_timeout_is_reported_at_poll_step() {
    let server = MockServer::start().await;
    mount_links(&server).await;
    Mock::given(method("GET"))
        .and(path("/poll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending_body()))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryProfileStore::new());
    let flow = flow(&server, Arc::new(RecordingLauncher::new()), store.clone())
        .with_poll_config(quick_poll(Duration::from_millis(50)));

    let err = flow.run(&profile()).await.unwrap_err();

    assert_eq!(err.step, LoginStep::Poll);
    assert!(err.kind().is_timeout());
    assert!(store.get("tests").is_none());
}

#[tokio::test]
async fn invalid_poll_config_fails_before_requesting_links() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(links_body(&server)))
        .expect(0)
        .mount(&server)
        .await;

    let launcher = Arc::new(RecordingLauncher::new());
    let (sink, events) = collecting_sink();
    let flow = flow(&server, launcher.clone(), Arc::new(InMemoryProfileStore::new()))
        .with_poll_config(PollConfig::default().with_backoff_multiplier(0.5))
        .with_event_sink(sink);

    let err = flow.run(&profile()).await.unwrap_err();

    assert_eq!(err.step, LoginStep::Poll);
    assert!(matches!(err.kind(), AuthError::InvalidConfig(_)));
    assert!(launcher.opened().is_empty());
    assert!(events.lock().unwrap().is_empty());
    let received = server.received_requests().await.expect("recording enabled");
    assert!(received.is_empty());
}

#[tokio::test]
async fn malformed_key_fails_validation_and_is_not_stored() {
    let server = MockServer::start().await;
    mount_links(&server).await;
    mount_poll(
        &server,
        json!({
            "redeemed": true,
            "account_id": "acct_123",
            "testmode_key_secret": "pk_test_1234567"
        }),
        1,
    )
    .await;

    let store = Arc::new(InMemoryProfileStore::new());
    let flow = flow(&server, Arc::new(RecordingLauncher::new()), store.clone());

    let err = flow.run(&profile()).await.unwrap_err();

    assert_eq!(err.step, LoginStep::Validate);
    assert!(matches!(err.kind(), AuthError::Validation(_)));
    assert!(store.get("tests").is_none());
}

#[tokio::test]
async fn persistence_failure_is_reported_at_persist_step() {
    let server = MockServer::start().await;
    mount_links(&server).await;
    mount_poll(&server, redeemed_body(), 1).await;

    let flow = flow(&server, Arc::new(RecordingLauncher::new()), Arc::new(FailingStore));
    let err = flow.run(&profile()).await.unwrap_err();

    assert_eq!(err.step, LoginStep::Persist);
    assert!(matches!(err.kind(), AuthError::Persistence(_)));
}

#[tokio::test]
async fn cancelled_login_never_contacts_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(links_body(&server)))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let launcher = Arc::new(RecordingLauncher::new());
    let flow = flow(&server, launcher.clone(), Arc::new(InMemoryProfileStore::new()))
        .with_cancellation(cancel);

    let err = flow.run(&profile()).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.step, LoginStep::RequestLinks);
    assert!(launcher.opened().is_empty());
}

#[tokio::test]
async fn concurrent_logins_do_not_share_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(links_body(&server)))
        .expect(2)
        .mount(&server)
        .await;
    mount_poll(&server, redeemed_body(), 2).await;

    let store = Arc::new(InMemoryProfileStore::new());
    let first = flow(&server, Arc::new(RecordingLauncher::new()), store.clone());
    let second = flow(&server, Arc::new(RecordingLauncher::new()), store.clone());

    let profile_one = Profile::new("one", "st-testing");
    let profile_two = Profile::new("two", "st-testing");
    let (a, b) = tokio::join!(first.run(&profile_one), second.run(&profile_two));

    assert!(a.is_ok() && b.is_ok());
    assert!(store.get("one").is_some());
    assert!(store.get("two").is_some());
}
