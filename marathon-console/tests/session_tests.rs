//! Session lifecycle tests against a fully wired console app
//!
//! The app is assembled from the in-memory stubs, so these cover login,
//! restore and logout together with how the runners controller reacts.

mod common;

use std::sync::Arc;

use common::{field, wait_for_event};

use marathon_console::app::ConsoleApp;
use marathon_console::domains::auth::{AuthState, SessionStore};
use marathon_console::domains::runners::RunnersEvent;
use marathon_console::domains::runners::live_feed::LocationHub;
use marathon_console::infra::config::ConsoleConfig;
use marathon_console::infra::errors::ConsoleError;
use marathon_console::infra::testing::stubs::{
    StubAuthService, StubRunnerService,
};

fn app(auth: &StubAuthService, runners: &StubRunnerService) -> ConsoleApp {
    ConsoleApp::from_parts(
        ConsoleConfig::default(),
        SessionStore::new(),
        Arc::new(auth.clone()),
        Arc::new(runners.clone()),
        Arc::new(LocationHub::new()),
    )
}

#[tokio::test]
async fn login_then_mount_loads_first_page() {
    let auth = StubAuthService::new();
    let runners = StubRunnerService::new().with_runners(field(12));
    let app = app(&auth, &runners);

    let user = app.auth().login("admin@example.com", "secret").await.unwrap();
    assert_eq!(user.email, "admin@example.com");
    assert!(app.session().is_authenticated());
    assert!(app.start_live_feed().is_none(), "stub wiring has no SSE pump");

    let (handle, mut events, task) = app.start_runners();
    handle.mount();
    let loaded = wait_for_event(&mut events, |e| {
        matches!(e, RunnersEvent::PageLoaded { .. })
    })
    .await;
    assert!(matches!(
        loaded,
        RunnersEvent::PageLoaded {
            page: 1,
            total_pages: 2,
            total: 12,
            shown: 10,
        }
    ));

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn logout_tells_the_runners_view() {
    let auth = StubAuthService::new();
    let runners = StubRunnerService::new().with_runners(field(3));
    let app = app(&auth, &runners);
    app.auth().login("admin@example.com", "secret").await.unwrap();

    let (handle, mut events, task) = app.start_runners();
    handle.mount();
    wait_for_event(&mut events, |e| matches!(e, RunnersEvent::PageLoaded { .. }))
        .await;

    app.auth().logout();
    wait_for_event(&mut events, |e| matches!(e, RunnersEvent::SessionExpired))
        .await;
    assert!(app.auth().current_user().is_none());

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn logout_after_rejected_token_reports_expiry_once() {
    let auth = StubAuthService::new();
    let runners = StubRunnerService::new().with_runners(field(3));
    let app = app(&auth, &runners);
    app.auth().login("admin@example.com", "secret").await.unwrap();

    let (handle, mut events, task) = app.start_runners();
    // The API client invalidates on a 401, then the user logs out
    assert!(app.session().invalidate());
    app.auth().logout();
    wait_for_event(&mut events, |e| matches!(e, RunnersEvent::SessionExpired))
        .await;

    handle.shutdown();
    task.await.unwrap();
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, RunnersEvent::SessionExpired));
    }
}

#[tokio::test]
async fn wrong_password_is_reported_as_invalid_credentials() {
    let auth = StubAuthService::new();
    let app = app(&auth, &StubRunnerService::new());

    let err = app
        .auth()
        .login("admin@example.com", "hunter2")
        .await
        .unwrap_err();

    assert!(matches!(err, ConsoleError::Api { status: Some(401), .. }));
    assert!(matches!(app.session().current(), AuthState::Unauthenticated));
}

#[tokio::test]
async fn restore_reuses_a_saved_token() {
    let auth = StubAuthService::new();
    let app = app(&auth, &StubRunnerService::new());

    let user = app.auth().restore(auth.token()).await.unwrap();

    assert_eq!(user, auth.user());
    assert_eq!(auth.me_calls(), 1);
    assert_eq!(
        app.session().token().map(|t| t.as_str().to_string()),
        Some("stub-token".to_string())
    );
}

#[tokio::test]
async fn custom_credentials_are_enforced() {
    let auth = StubAuthService::new()
        .with_credentials("director@race.example", "finish-line");
    let app = app(&auth, &StubRunnerService::new());

    assert!(app.auth().login("admin@example.com", "secret").await.is_err());
    assert!(
        app.auth()
            .login("director@race.example", "finish-line")
            .await
            .is_ok()
    );
}
