mod support;

use legal_client::domain::{
    Action, AuthError, ClientError, Credential, CredentialStore, RegistrationForm,
};
use legal_client::interface_adapters::storage::FileCredentialStore;
use std::sync::Arc;

// Durable store inside a temp dir so restarts can be simulated.
fn file_store(dir: &tempfile::TempDir) -> Arc<dyn CredentialStore> {
    Arc::new(FileCredentialStore::new(dir.path().join("session.json")))
}

#[tokio::test]
async fn when_login_succeeds_then_session_survives_restart_without_network() {
    let backend = support::spawn_backend().await;
    let dir = tempfile::tempdir().expect("expected temp dir");
    support::signed_in(&backend, file_store(&dir)).await;
    let logins = backend.state.hits("login");

    let restarted = support::api(&backend, file_store(&dir)).await;

    let identity = restarted
        .session()
        .current_identity()
        .expect("expected restored identity");
    assert_eq!(identity.name, "A");
    assert_eq!(
        restarted.session().credential(),
        Some(Credential::new(support::VALID_TOKEN))
    );
    assert_eq!(backend.state.hits("login"), logins);
}

#[tokio::test]
async fn when_password_is_wrong_then_rejection_message_comes_from_backend() {
    let backend = support::spawn_backend().await;
    let dir = tempfile::tempdir().expect("expected temp dir");
    let api = support::api(&backend, file_store(&dir)).await;

    let err = api
        .session()
        .login("a@b.com", "wrong-password")
        .await
        .expect_err("expected login to fail");

    assert_eq!(err.user_message(Action::Login), "Invalid email or password");
    assert!(!api.session().is_authenticated());
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test]
async fn when_logout_runs_then_stored_session_is_removed() {
    let backend = support::spawn_backend().await;
    let dir = tempfile::tempdir().expect("expected temp dir");
    let api = support::signed_in(&backend, file_store(&dir)).await;
    assert!(dir.path().join("session.json").exists());

    api.session().logout().await;

    assert!(!dir.path().join("session.json").exists());
    let restarted = support::api(&backend, file_store(&dir)).await;
    assert!(!restarted.session().is_authenticated());
}

#[tokio::test]
async fn when_backend_revokes_token_then_next_call_signs_out() {
    let backend = support::spawn_backend().await;
    let dir = tempfile::tempdir().expect("expected temp dir");
    let api = support::signed_in(&backend, file_store(&dir)).await;
    backend.state.revoke();

    let err = api.token_balance().await.expect_err("expected rejection");

    assert!(matches!(err, ClientError::AuthRejected { status: 401, .. }));
    assert!(!api.session().is_authenticated());
    assert!(!dir.path().join("session.json").exists());

    let follow_up = api.token_balance().await;
    assert_eq!(follow_up, Err(ClientError::SignInRequired));
    assert_eq!(backend.state.hits("tokens"), 1);
}

#[tokio::test]
async fn when_registration_returns_no_token_then_user_must_sign_in() {
    let backend = support::spawn_backend().await;
    let dir = tempfile::tempdir().expect("expected temp dir");
    let api = support::api(&backend, file_store(&dir)).await;
    let form = RegistrationForm {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "+44 20 7946 0000".to_string(),
        password: "secret1".to_string(),
        confirm_password: "secret1".to_string(),
        city: Some("London".to_string()),
        ..RegistrationForm::default()
    };

    let registration = api
        .session()
        .register(&form)
        .await
        .expect("expected registration to succeed");

    assert!(!registration.authenticated);
    assert_eq!(
        registration.identity.map(|identity| identity.name),
        Some("Ada Lovelace".to_string())
    );
    assert!(!api.session().is_authenticated());
}

#[tokio::test]
async fn when_email_is_taken_then_registration_shows_backend_detail() {
    let backend = support::spawn_backend().await;
    let dir = tempfile::tempdir().expect("expected temp dir");
    let api = support::api(&backend, file_store(&dir)).await;
    let form = RegistrationForm {
        name: "Ada Lovelace".to_string(),
        email: "taken@example.com".to_string(),
        phone: "555-0100".to_string(),
        password: "secret1".to_string(),
        confirm_password: "secret1".to_string(),
        ..RegistrationForm::default()
    };

    let err = api
        .session()
        .register(&form)
        .await
        .expect_err("expected registration to fail");

    assert!(matches!(err, AuthError::Rejected { status: 400, .. }));
    assert_eq!(err.user_message(Action::Register), "Email already registered");
}

#[tokio::test]
async fn when_backend_is_unreachable_then_login_reports_network_error() {
    let backend = support::spawn_backend().await;
    let dir = tempfile::tempdir().expect("expected temp dir");
    let mut base = backend.base_url.clone();
    // Port 9 (discard) is not served by the mock.
    base.set_port(Some(9)).expect("expected port to be settable");
    let transport: Arc<dyn legal_client::domain::Transport> = Arc::new(
        legal_client::interface_adapters::clients::HttpTransport::new(
            base,
            std::time::Duration::from_secs(2),
        )
        .expect("http client should build"),
    );
    let session =
        legal_client::use_cases::SessionManager::restore(transport, file_store(&dir)).await;

    let err = session
        .login("a@b.com", support::PASSWORD)
        .await
        .expect_err("expected login to fail");

    assert!(matches!(err, AuthError::Network(_)));
    assert_eq!(err.user_message(Action::Login), "Login failed");
}
