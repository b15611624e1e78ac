//! End-to-end session lifecycle against a scripted server.

use assert_fs::TempDir;
use serde_json::{Value, json};
use shuttle_access::http::SESSION_TOKEN_HEADER;
use shuttle_access::prelude::*;
use shuttle_access::testing::MockTransport;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("shuttle_access=debug")
        .with_test_writer()
        .try_init();
}

fn anonymous() -> Value {
    json!({
        "identityRequired": false,
        "permissions": [{ "name": "access://anonymous" }]
    })
}

fn build(transport: &MockTransport, store: FileStore) -> Access {
    Access::builder()
        .base_url("http://access.test/api")
        .transport(transport.clone())
        .store(store)
        .build()
        .unwrap()
}

#[tokio::test]
async fn session_survives_restart_until_logout() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("credentials.json");

    // First run: anonymous, then explicit login.
    let transport = MockTransport::new();
    transport.reply(anonymous()).reply(json!({
        "registered": true,
        "token": "session-1",
        "permissions": [{ "name": "access://identity/manage" }]
    }));
    let mut first = build(&transport, FileStore::new(&path));

    first.initialize().await.unwrap();
    assert_eq!(first.login_status(), LoginStatus::NotLoggedIn);
    first
        .login(&Credentials::password("admin", "secret"))
        .await
        .unwrap();
    assert_eq!(first.login_status(), LoginStatus::LoggedIn);
    drop(first);

    // Second run: the persisted token is used to resume.
    let transport = MockTransport::new();
    transport.reply(anonymous()).reply(json!({
        "success": true,
        "token": "session-2",
        "permissions": [{ "name": "ACCESS://IDENTITY/MANAGE" }]
    }));
    let mut second = build(&transport, FileStore::new(&path));

    let initialized = second.initialize().await.unwrap();
    assert_eq!(initialized.login, Some(LoginOutcome::Authenticated));
    assert_eq!(second.identity_name(), "admin");
    assert_eq!(second.token(), "session-2");
    assert!(second.has_permission("access://identity/manage"));
    assert!(second.has_permission("access://anonymous"));

    let requests = transport.requests();
    assert_eq!(requests[1].url.as_str(), "http://access.test/api/sessions");
    assert_eq!(
        requests[1].body,
        Some(json!({ "identityName": "admin", "token": "session-1" }))
    );

    second.logout();
    assert!(!path.exists());
    drop(second);

    // Third run: nothing to resume.
    let transport = MockTransport::new();
    transport.reply(anonymous());
    let mut third = build(&transport, FileStore::new(&path));

    let initialized = third.initialize().await.unwrap();
    assert_eq!(initialized.login, None);
    assert_eq!(third.login_status(), LoginStatus::NotLoggedIn);
    assert_eq!(transport.request_count(), 1);
    assert_eq!(transport.requests()[0].header(SESSION_TOKEN_HEADER), None);
}

#[tokio::test]
async fn expired_token_degrades_to_anonymous() {
    init_tracing();
    let store = MemoryStore::with_items([("identity-name", "admin"), ("token", "expired")]);
    let transport = MockTransport::new();
    transport
        .reply(anonymous())
        .reply(json!({ "registered": false }));

    let mut access = Access::builder()
        .base_url("http://access.test")
        .transport(transport.clone())
        .store(store)
        .build()
        .unwrap();

    let initialized = access.initialize().await.unwrap();

    assert_eq!(initialized.login, Some(LoginOutcome::TokenRejected));
    assert!(!access.has_session());
    assert!(access.has_permission("access://anonymous"));
    assert_eq!(transport.pending_replies(), 0);
}

#[tokio::test]
async fn custom_storage_keys_from_config() {
    init_tracing();
    let mut config = AccessConfig::new("http://access.test");
    config.identity_key = "shuttle.identity".into();
    config.token_key = "shuttle.token".into();

    let store = std::sync::Arc::new(MemoryStore::new());
    let transport = MockTransport::new();
    transport.reply(json!({ "registered": true, "token": "t", "permissions": [] }));

    let mut access = Access::builder()
        .config(&config)
        .transport(transport)
        .shared_store(store.clone())
        .build()
        .unwrap();
    access
        .login(&Credentials::password("admin", "secret"))
        .await
        .unwrap();

    assert_eq!(
        store.get_item("shuttle.identity").unwrap().as_deref(),
        Some("admin")
    );
    assert_eq!(store.get_item("shuttle.token").unwrap().as_deref(), Some("t"));
    assert_eq!(store.get_item("token").unwrap(), None);
}

#[test]
fn from_config_validates_base_url() {
    let err = Access::from_config(&AccessConfig::default(), MemoryStore::new()).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Missing(_))));
}
