//! Session lifecycle scenarios against stub collaborators.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use retailcloud_client::session::{AuthError, SessionStore};
use retailcloud_client::storage::{CredentialStorage, MemoryStorage, keys};
use retailcloud_client::token;
use retailcloud_integration_tests::{
    StubAuth, StubNotifications, future_exp, identity_token, past_exp,
};

fn session_with(
    auth: Arc<StubAuth>,
    notifications: Arc<StubNotifications>,
    storage: Arc<MemoryStorage>,
) -> SessionStore {
    SessionStore::new(auth, notifications, storage)
}

#[tokio::test]
async fn login_decodes_identity_and_persists_credentials() {
    let token = identity_token("u1", Some("a@x.com"), future_exp());
    let auth = Arc::new(StubAuth::issuing(token.clone()));
    let storage = Arc::new(MemoryStorage::new());
    let session = session_with(auth, Arc::new(StubNotifications::accepting()), storage.clone());

    let identity = session.login("a@x.com", "pw").await.expect("login");

    assert_eq!(identity.subject_id, "u1");
    assert!(session.is_logged_in());
    assert_eq!(
        session.current_user().unwrap().email.as_deref(),
        Some("a@x.com")
    );

    // All four credential keys are persisted as a group.
    assert_eq!(storage.get(keys::ID_TOKEN).as_deref(), Some(token.as_str()));
    assert!(storage.get(keys::ACCESS_TOKEN).is_some());
    assert!(storage.get(keys::REFRESH_TOKEN).is_some());
    assert!(storage.get(keys::USER_INFO).is_some());
}

#[tokio::test]
async fn failed_login_leaves_session_logged_out() {
    let auth = Arc::new(StubAuth::issuing(identity_token(
        "u1",
        Some("a@x.com"),
        future_exp(),
    )));
    auth.fail_login.store(true, Ordering::SeqCst);
    let storage = Arc::new(MemoryStorage::new());
    let session = session_with(
        auth,
        Arc::new(StubNotifications::accepting()),
        storage.clone(),
    );

    let err = session.login("a@x.com", "wrong").await.unwrap_err();

    // Server-provided message passes through.
    assert!(matches!(err, AuthError::Remote(msg) if msg == "Invalid credentials"));
    assert!(!session.is_logged_in());
    assert!(storage.get(keys::ID_TOKEN).is_none());
}

#[tokio::test]
async fn malformed_email_is_rejected_before_any_remote_call() {
    let auth = Arc::new(StubAuth::issuing("unused"));
    let session = session_with(
        auth.clone(),
        Arc::new(StubNotifications::accepting()),
        Arc::new(MemoryStorage::new()),
    );

    let err = session.login("not-an-email", "pw").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidEmail(_)));
    assert_eq!(auth.login_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn logout_clears_state_even_when_remote_call_fails() {
    let token = identity_token("u1", Some("a@x.com"), future_exp());
    let auth = Arc::new(StubAuth::issuing(token));
    auth.fail_logout.store(true, Ordering::SeqCst);
    let storage = Arc::new(MemoryStorage::new());
    let session = session_with(
        auth.clone(),
        Arc::new(StubNotifications::accepting()),
        storage.clone(),
    );

    session.login("a@x.com", "pw").await.expect("login");
    assert!(session.is_logged_in());

    session.logout().await;

    assert_eq!(auth.logout_calls.load(Ordering::SeqCst), 1);
    assert!(!session.is_logged_in());
    assert!(session.current_user().is_none());
    for key in keys::ALL {
        assert!(storage.get(key).is_none(), "{key} should be cleared");
    }
}

#[tokio::test]
async fn restore_is_idempotent() {
    let token = identity_token("u1", Some("a@x.com"), future_exp());
    let storage = Arc::new(MemoryStorage::new());
    storage.put_group(&[(keys::ID_TOKEN, token.as_str())]);

    let session = session_with(
        Arc::new(StubAuth::issuing("unused")),
        Arc::new(StubNotifications::accepting()),
        storage,
    );

    session.restore_from_storage();
    let first = session.state();

    session.restore_from_storage();
    let second = session.state();

    assert!(first.is_authenticated && second.is_authenticated);
    assert_eq!(
        first.identity.unwrap().subject_id,
        second.identity.unwrap().subject_id
    );
}

#[tokio::test]
async fn restore_clears_expired_credentials() {
    let token = identity_token("u1", Some("a@x.com"), past_exp());
    let storage = Arc::new(MemoryStorage::new());
    storage.put_group(&[
        (keys::ID_TOKEN, token.as_str()),
        (keys::ACCESS_TOKEN, "stale"),
        (keys::REFRESH_TOKEN, "stale"),
        (keys::USER_INFO, "{}"),
    ]);

    let session = session_with(
        Arc::new(StubAuth::issuing("unused")),
        Arc::new(StubNotifications::accepting()),
        storage.clone(),
    );
    session.restore_from_storage();

    assert!(!session.is_logged_in());
    for key in keys::ALL {
        assert!(storage.get(key).is_none(), "{key} should be cleared");
    }
}

#[tokio::test]
async fn restore_clears_corrupt_credentials() {
    let storage = Arc::new(MemoryStorage::new());
    storage.put_group(&[(keys::ID_TOKEN, "garbage-not-a-token")]);

    let session = session_with(
        Arc::new(StubAuth::issuing("unused")),
        Arc::new(StubNotifications::accepting()),
        storage.clone(),
    );
    session.restore_from_storage();

    assert!(!session.is_logged_in());
    assert!(storage.get(keys::ID_TOKEN).is_none());
}

#[tokio::test]
async fn external_credential_agrees_with_direct_decode() {
    let token = identity_token("u1", Some("a@x.com"), future_exp());
    let session = session_with(
        Arc::new(StubAuth::issuing("unused")),
        Arc::new(StubNotifications::accepting()),
        Arc::new(MemoryStorage::new()),
    );

    session
        .set_token_from_external_credential(&token)
        .expect("valid external credential");

    let decoded = token::decode(&token).unwrap();
    assert_eq!(session.is_expired(), decoded.is_expired());
    assert!(session.is_logged_in());
    assert_eq!(
        session.current_user().unwrap().subject_id,
        decoded.subject_id
    );
}

#[tokio::test]
async fn expired_external_credential_is_rejected() {
    let token = identity_token("u1", Some("a@x.com"), past_exp());
    let storage = Arc::new(MemoryStorage::new());
    let session = session_with(
        Arc::new(StubAuth::issuing("unused")),
        Arc::new(StubNotifications::accepting()),
        storage.clone(),
    );

    let err = session.set_token_from_external_credential(&token).unwrap_err();

    assert!(matches!(err, AuthError::ExpiredCredential));
    assert!(!session.is_logged_in());
    assert!(storage.get(keys::ID_TOKEN).is_none());
    assert!(session.is_expired());
}

#[tokio::test]
async fn login_state_is_broadcast_to_observers() {
    let token = identity_token("u1", Some("a@x.com"), future_exp());
    let session = session_with(
        Arc::new(StubAuth::issuing(token)),
        Arc::new(StubNotifications::accepting()),
        Arc::new(MemoryStorage::new()),
    );

    let mut observer_a = session.subscribe();
    let mut observer_b = session.subscribe();
    assert!(!*observer_a.borrow_and_update());

    session.login("a@x.com", "pw").await.expect("login");
    assert!(*observer_a.borrow_and_update());
    assert!(*observer_b.borrow_and_update());

    session.logout().await;
    assert!(!*observer_a.borrow_and_update());
    assert!(!*observer_b.borrow_and_update());
}

#[tokio::test]
async fn register_reports_outcome_and_triggers_welcome_email() {
    let notifications = Arc::new(StubNotifications::accepting());
    let session = session_with(
        Arc::new(StubAuth::issuing("unused")),
        notifications.clone(),
        Arc::new(MemoryStorage::new()),
    );

    let outcome = session.register("new@x.com", "pw").await.expect("register");

    assert!(!outcome.confirmed);
    assert_eq!(outcome.user_sub.as_str(), "u-new");
    // Registration never logs the user in.
    assert!(!session.is_logged_in());

    // The welcome email is fire-and-forget.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(notifications.user_registered_calls.load(Ordering::SeqCst), 1);
}
