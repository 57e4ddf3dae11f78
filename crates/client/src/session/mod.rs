//! Session management.
//!
//! [`SessionStore`] owns the process-wide session state: the persisted
//! credential strings, the decoded identity, and the login flag. It is the
//! single writer of the credential storage keys; every other component reads
//! identity through its accessors so the expiry-check invariant stays in one
//! place.
//!
//! State machine: `LoggedOut` -> `LoggedIn(Identity)` on a successful login
//! or accepted external credential; back to `LoggedOut` on logout or
//! detected expiry. Restoring from storage is idempotent and self-healing -
//! corrupt or stale storage never produces a logged-in state.

mod error;

pub use error::AuthError;

use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use retailcloud_core::{Email, UserId};

use crate::api::{AuthApi, NotificationApi};
use crate::storage::{CredentialStorage, keys};
use crate::token::{self, Identity};

/// Observable session state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Identity decoded from the most recently accepted credential.
    pub identity: Option<Identity>,
    /// Whether a valid credential backs this session.
    pub is_authenticated: bool,
}

/// Result of a registration call.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    /// Backend-assigned subject identifier for the new account.
    pub user_sub: UserId,
    /// `true` when the account is usable immediately; `false` when a
    /// confirmation code has been emailed.
    pub confirmed: bool,
}

/// Owner of session credentials and login state.
pub struct SessionStore {
    auth: Arc<dyn AuthApi>,
    notifications: Arc<dyn NotificationApi>,
    storage: Arc<dyn CredentialStorage>,
    state: RwLock<SessionState>,
    logged_in_tx: watch::Sender<bool>,
}

impl SessionStore {
    /// Create a store in the `LoggedOut` state.
    ///
    /// Call [`Self::restore_from_storage`] once at process start to pick up
    /// a persisted session.
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthApi>,
        notifications: Arc<dyn NotificationApi>,
        storage: Arc<dyn CredentialStorage>,
    ) -> Self {
        let (logged_in_tx, _) = watch::channel(false);
        Self {
            auth,
            notifications,
            storage,
            state: RwLock::new(SessionState::default()),
            logged_in_tx,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Restore session state from persisted storage.
    ///
    /// Reads the persisted identity token, decodes it and checks expiry. If
    /// the token is absent, undecodable or expired, every credential key is
    /// cleared and the state stays `LoggedOut`. Calling this repeatedly with
    /// unchanged storage yields the same state every time.
    pub fn restore_from_storage(&self) {
        let Some(id_token) = self.storage.get(keys::ID_TOKEN) else {
            self.clear_local();
            return;
        };

        match token::decode(&id_token) {
            Ok(identity) if !identity.is_expired() => {
                tracing::debug!(subject = %identity.subject_id, "Session restored from storage");
                self.set_logged_in(identity);
            }
            Ok(_) => {
                tracing::info!("Persisted session credential expired");
                self.clear_local();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable session credential");
                self.clear_local();
            }
        }
    }

    /// Login with email and password.
    ///
    /// On success, persists all three credential strings plus the decoded
    /// identity as one group and transitions to `LoggedIn`. On any failure
    /// the state remains `LoggedOut` and nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEmail`] for a malformed email,
    /// [`AuthError::Remote`] when the auth service rejects the credentials
    /// or is unreachable, and [`AuthError::InvalidCredential`] when the
    /// issued identity token cannot be decoded.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = Email::parse(email)?;

        let response = self
            .auth
            .login(&email, password)
            .await
            .map_err(|e| AuthError::Remote(e.user_message("Login failed")))?;

        let tokens = response.tokens;
        let identity = token::decode(&tokens.id_token).map_err(|e| {
            tracing::warn!(error = %e, "Login succeeded but identity token is undecodable");
            AuthError::InvalidCredential
        })?;

        let user_info =
            serde_json::to_string(&identity).map_err(|_| AuthError::InvalidCredential)?;
        self.storage.put_group(&[
            (keys::ACCESS_TOKEN, tokens.access_token.as_str()),
            (keys::ID_TOKEN, tokens.id_token.as_str()),
            (keys::REFRESH_TOKEN, tokens.refresh_token.as_str()),
            (keys::USER_INFO, user_info.as_str()),
        ]);

        self.set_logged_in(identity.clone());
        tracing::info!(subject = %identity.subject_id, "Login successful");

        Ok(identity)
    }

    /// Register a new account.
    ///
    /// Does not mutate session state; the caller decides whether to continue
    /// to confirmation or login. Triggers the welcome email fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEmail`] for a malformed email and
    /// [`AuthError::Remote`] when the auth service rejects the registration.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<RegistrationOutcome, AuthError> {
        let email = Email::parse(email)?;

        let response = self
            .auth
            .register(&email, password)
            .await
            .map_err(|e| AuthError::Remote(e.user_message("Registration failed")))?;

        let outcome = RegistrationOutcome {
            user_sub: UserId::new(response.user_sub),
            confirmed: response.user_confirmed,
        };

        let notifications = Arc::clone(&self.notifications);
        let user = outcome.user_sub.clone();
        tokio::spawn(async move {
            if let Err(e) = notifications.user_registered(&email, &user).await {
                tracing::warn!(error = %e, "Failed to trigger welcome email");
            }
        });

        Ok(outcome)
    }

    /// Confirm a freshly registered account with an emailed code.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEmail`] for a malformed email and
    /// [`AuthError::Remote`] when the confirmation is rejected.
    pub async fn confirm(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;

        self.auth
            .confirm(&email, code)
            .await
            .map_err(|e| AuthError::Remote(e.user_message("Confirmation failed")))?;

        Ok(())
    }

    /// Logout.
    ///
    /// Calls the remote logout endpoint best-effort, then unconditionally
    /// clears persisted credentials and session state. Local session
    /// termination is never blocked by a remote failure.
    pub async fn logout(&self) {
        if let Err(e) = self.auth.logout().await {
            tracing::warn!(error = %e, "Remote logout failed");
        }

        self.clear_local();
        tracing::info!("Logged out");
    }

    /// Accept an identity token from a federated-login callback.
    ///
    /// Applies the same validity checks as [`Self::restore_from_storage`]:
    /// an undecodable or expired token is rejected and nothing changes. On
    /// success the token is persisted (doubling as the access token - the
    /// federated flow hands back no separate one) and the state transitions
    /// to `LoggedIn`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] when the token cannot be
    /// decoded and [`AuthError::ExpiredCredential`] when it is already
    /// expired.
    pub fn set_token_from_external_credential(
        &self,
        id_token: &str,
    ) -> Result<Identity, AuthError> {
        let identity = token::decode(id_token).map_err(|e| {
            tracing::warn!(error = %e, "Rejecting undecodable external credential");
            AuthError::InvalidCredential
        })?;

        if identity.is_expired() {
            return Err(AuthError::ExpiredCredential);
        }

        let user_info =
            serde_json::to_string(&identity).map_err(|_| AuthError::InvalidCredential)?;
        self.storage.put_group(&[
            (keys::ACCESS_TOKEN, id_token),
            (keys::ID_TOKEN, id_token),
            (keys::USER_INFO, user_info.as_str()),
        ]);

        self.set_logged_in(identity.clone());
        tracing::info!(subject = %identity.subject_id, "External credential accepted");

        Ok(identity)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Whether the currently persisted identity token is expired.
    ///
    /// Pure function of the persisted token and wall-clock time; an absent
    /// or undecodable token counts as expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.storage
            .get(keys::ID_TOKEN)
            .and_then(|token| token::decode(&token).ok())
            .is_none_or(|identity| identity.is_expired())
    }

    /// Whether a valid credential backs this session.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.read_state().is_authenticated
    }

    /// The identity of the current user, if logged in.
    #[must_use]
    pub fn current_user(&self) -> Option<Identity> {
        self.read_state().identity
    }

    /// Snapshot of the observable session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.read_state()
    }

    /// The persisted access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.storage.get(keys::ACCESS_TOKEN)
    }

    /// The persisted identity token, if any.
    #[must_use]
    pub fn id_token(&self) -> Option<String> {
        self.storage.get(keys::ID_TOKEN)
    }

    /// Subscribe to login-state changes.
    ///
    /// Every observer sees the same value without re-querying storage.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.logged_in_tx.subscribe()
    }

    // =========================================================================
    // Internal state transitions
    // =========================================================================

    fn read_state(&self) -> SessionState {
        self.state
            .read()
            .expect("session state lock poisoned")
            .clone()
    }

    fn set_logged_in(&self, identity: Identity) {
        {
            let mut state = self.state.write().expect("session state lock poisoned");
            state.identity = Some(identity);
            state.is_authenticated = true;
        }
        self.logged_in_tx.send_replace(true);
    }

    fn clear_local(&self) {
        self.storage.remove_group(&keys::ALL);
        {
            let mut state = self.state.write().expect("session state lock poisoned");
            state.identity = None;
            state.is_authenticated = false;
        }
        self.logged_in_tx.send_replace(false);
    }
}
