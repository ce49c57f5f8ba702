//! Session lifecycle management.
//!
//! `SessionManager` owns every transition of the session state machine
//! (`Anonymous -> Authenticating -> Authenticated -> Anonymous`) and is the
//! only component allowed to drive the credential store through the shared
//! `SessionHandle`. At most one session-mutating operation may be in flight
//! at a time; a second call is rejected locally instead of queued.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::SessionHandle;
use crate::models::{RegisterRequest, User, UserUpdate};
use crate::sync::StaleGuard;

/// Transient user-visible outcome of a session operation, delivered on the
/// channel supplied at construction (toast-style feedback). Field-level
/// validation failures are returned inline to the caller instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Success(String),
    Error(String),
}

/// Wire shape of a successful `POST /login`.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    user: User,
}

/// Wire shape of `POST /auth/password-check`.
#[derive(Debug, Deserialize)]
struct PasswordCheckResponse {
    #[serde(default)]
    msg: Option<String>,
}

/// A 401 on the login endpoint means rejected credentials, not an expired
/// token.
fn classify_login(err: ApiError) -> ApiError {
    match err {
        ApiError::Unauthenticated => ApiError::InvalidCredentials,
        other => other,
    }
}

#[derive(Debug, Clone)]
pub struct SessionManager {
    api: ApiClient,
    session: SessionHandle,
    feedback: mpsc::UnboundedSender<Feedback>,
    /// Rejects overlapping session-mutating operations.
    op_gate: Arc<Mutex<()>>,
    /// Discards profile responses that lost the completion-order race.
    profile_guard: Arc<Mutex<StaleGuard<i64>>>,
}

impl SessionManager {
    pub fn new(
        api: ApiClient,
        session: SessionHandle,
        feedback: mpsc::UnboundedSender<Feedback>,
    ) -> Self {
        Self {
            api,
            session,
            feedback,
            op_gate: Arc::new(Mutex::new(())),
            profile_guard: Arc::new(Mutex::new(StaleGuard::new())),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn emit(&self, feedback: Feedback) {
        // A dropped receiver just means nobody is listening for toasts.
        let _ = self.feedback.send(feedback);
    }

    fn begin_op(&self) -> Result<tokio::sync::OwnedMutexGuard<()>, ApiError> {
        self.op_gate
            .clone()
            .try_lock_owned()
            .map_err(|_| ApiError::invalid_input("Another session operation is in progress"))
    }

    /// Authenticate with email and password. On success the token and user
    /// are installed atomically and persisted; on failure the prior state is
    /// untouched and the error is classified.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let _op = self.begin_op()?;
        self.login_inner(email, password).await
    }

    async fn login_inner(&self, email: &str, password: &str) -> Result<(), ApiError> {
        if !self.session.begin_authenticating().await {
            return Err(ApiError::invalid_input("Already logged in"));
        }
        self.authenticate(email, password).await
    }

    /// The network half of a login. Callers must have entered
    /// `Authenticating` already.
    async fn authenticate(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let body = json!({ "email": email, "password": password });
        match self
            .api
            .post_json::<LoginResponse, _>("/login", &body, false)
            .await
        {
            Ok(response) => {
                self.session
                    .install(response.access_token, response.user)
                    .await;
                info!("Login successful");
                self.emit(Feedback::Success("Login successful!".to_string()));
                Ok(())
            }
            Err(e) => {
                self.session.abort_authenticating().await;
                let e = classify_login(e);
                warn!(error = %e, "Login failed");
                self.emit(Feedback::Error(
                    "Login failed! Please check your credentials.".to_string(),
                ));
                Err(e)
            }
        }
    }

    /// Register a new account and, on success, immediately log in with the
    /// same credentials so registration never leaves a half-authenticated
    /// state. Form validation failures never reach the network; a server
    /// rejection is surfaced with the server's reason untouched.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        request.validate()?;
        let _op = self.begin_op()?;

        // Claim the Anonymous -> Authenticating transition before the
        // account is created, so a register call on a live session is
        // rejected without leaving an orphan account server-side.
        if !self.session.begin_authenticating().await {
            return Err(ApiError::invalid_input("Already logged in"));
        }

        if let Err(e) = self
            .api
            .post_empty("/register", Some(request), false)
            .await
        {
            self.session.abort_authenticating().await;
            warn!(error = %e, "Registration failed");
            self.emit(Feedback::Error(
                "Registration failed. Please try again.".to_string(),
            ));
            return Err(e);
        }

        self.emit(Feedback::Success(
            "Registration successful! Logging you in...".to_string(),
        ));
        self.authenticate(&request.email, &request.password).await
    }

    /// Tear down the session. The remote invalidation call is best-effort;
    /// local state and the credential store are cleared unconditionally.
    /// Idempotent: logging out while anonymous still clears local state.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let _op = self.begin_op()?;
        self.teardown().await;
        self.emit(Feedback::Success("Successfully logged out.".to_string()));
        Ok(())
    }

    /// Best-effort remote invalidation followed by unconditional local
    /// teardown. Quiet: each caller announces its own outcome.
    async fn teardown(&self) {
        if let Err(e) = self.api.post_empty::<()>("/logout", None, true).await {
            debug!(error = %e, "Best-effort remote logout failed");
        }
        self.session.invalidate().await;
    }

    /// Send only the provided fields and replace the cached user with the
    /// server's full returned representation - never a client-side merge, so
    /// the cache cannot drift from server-assigned fields.
    pub async fn update_profile(&self, update: &UserUpdate) -> Result<User, ApiError> {
        let _op = self.begin_op()?;
        if update.is_empty() {
            return Err(ApiError::invalid_input("Nothing to update"));
        }
        let user = self.session.user().await.ok_or(ApiError::Unauthenticated)?;

        let ticket = self.profile_guard.lock().await.begin(user.id);
        match self
            .api
            .put_json::<User, _>(&format!("/update_profile/{}", user.id), update, true)
            .await
        {
            Ok(updated) => {
                self.apply_profile(user.id, ticket, updated.clone()).await;
                self.emit(Feedback::Success(
                    "Profile updated successfully!".to_string(),
                ));
                Ok(updated)
            }
            Err(e) => {
                warn!(error = %e, "Profile update failed");
                self.emit(Feedback::Error(
                    "Profile update failed. Please try again.".to_string(),
                ));
                Err(e)
            }
        }
    }

    /// Verify the current password against the server, then update to the
    /// new one. The mismatch check is local and never reaches the network.
    /// Passwords are never written to the credential store.
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), ApiError> {
        if old_password.is_empty() || new_password.is_empty() {
            return Err(ApiError::invalid_input("Password is required"));
        }
        if new_password != confirm_password {
            return Err(ApiError::invalid_input("New passwords do not match"));
        }

        let _op = self.begin_op()?;
        let user = self.session.user().await.ok_or(ApiError::Unauthenticated)?;

        let check: PasswordCheckResponse = self
            .api
            .post_json("/auth/password-check", &json!({ "password": old_password }), true)
            .await?;
        if check.msg.as_deref() != Some("Login successful") {
            return Err(ApiError::invalid_input("Current password is incorrect"));
        }

        let update = UserUpdate {
            password: Some(new_password.to_string()),
            ..Default::default()
        };
        let ticket = self.profile_guard.lock().await.begin(user.id);
        match self
            .api
            .put_json::<User, _>(&format!("/update_profile/{}", user.id), &update, true)
            .await
        {
            Ok(updated) => {
                self.apply_profile(user.id, ticket, updated).await;
                self.emit(Feedback::Success(
                    "Password changed successfully!".to_string(),
                ));
                Ok(())
            }
            Err(e) => {
                self.emit(Feedback::Error(
                    "Password change failed. Please try again.".to_string(),
                ));
                Err(e)
            }
        }
    }

    /// Delete the account keyed by the current user id. Deletion is treated
    /// as irreversible from the moment of request: local teardown happens
    /// unconditionally, whatever the remote call's outcome.
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        let _op = self.begin_op()?;
        let user = self.session.user().await.ok_or(ApiError::Unauthenticated)?;

        let result = self
            .api
            .delete(&format!("/delete_account/{}", user.id), true)
            .await;
        self.teardown().await;

        match result {
            Ok(()) => {
                self.emit(Feedback::Success("Account deleted successfully!".to_string()));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Remote account deletion failed");
                self.emit(Feedback::Error(
                    "Failed to delete account. Please try again.".to_string(),
                ));
                Err(e)
            }
        }
    }

    /// Restore a persisted session at process start. When a token and user
    /// snapshot are present the session is installed optimistically and then
    /// revalidated in the background against `GET /profile`; a failed
    /// revalidation tears the session down so a token the server no longer
    /// recognizes is never trusted indefinitely. Returns whether a stored
    /// session was found.
    pub async fn restore_session(&self) -> Result<bool, ApiError> {
        let _op = self.begin_op()?;
        if self.session.is_authenticated().await {
            return Ok(true);
        }

        let stored = match self.session.store().load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(false),
            Err(e) => {
                warn!(error = %e, "Failed to read credential store");
                return Ok(false);
            }
        };

        let user_id = stored.user.id;
        let token = stored.token.clone();
        self.session.install(stored.token, stored.user).await;
        info!("Restored persisted session, revalidating");

        let ticket = self.profile_guard.lock().await.begin(user_id);
        let manager = self.clone();
        tokio::spawn(async move {
            manager.revalidate(user_id, ticket, token).await;
        });
        Ok(true)
    }

    /// Background check of a restored session against `GET /profile`.
    /// `token` is the restored token: a failure may only tear down the
    /// session that still carries it, never one installed since.
    async fn revalidate(&self, user_id: i64, ticket: crate::sync::Ticket, token: String) {
        match self.api.get_json::<User>("/profile", true).await {
            Ok(user) => {
                self.apply_profile(user_id, ticket, user).await;
            }
            Err(e @ ApiError::Validation { .. }) => {
                // Caller-class failure; not grounds to distrust the token.
                warn!(error = %e, "Profile revalidation rejected");
            }
            Err(e) => {
                warn!(error = %e, "Session revalidation failed");
                let torn_down = if e.is_auth_rejection() {
                    // The client already tore down whichever session
                    // carried the rejected token.
                    !self.session.is_authenticated().await
                } else {
                    self.expire_if_current(&token).await
                };
                if torn_down {
                    self.emit(Feedback::Error(
                        "Your session has expired. Please log in again.".to_string(),
                    ));
                } else {
                    debug!("Discarding revalidation failure for a superseded session");
                }
            }
        }
    }

    /// Tear down only if the session still carries `token`. Returns whether
    /// the teardown happened.
    async fn expire_if_current(&self, token: &str) -> bool {
        self.session.invalidate_if_token(token).await
    }

    /// Apply a profile response unless a newer one has already been applied
    /// for this user. Returns whether the response was applied.
    async fn apply_profile(&self, user_id: i64, ticket: crate::sync::Ticket, user: User) -> bool {
        if self.profile_guard.lock().await.commit(&user_id, ticket) {
            self.session.replace_user(user).await;
            true
        } else {
            debug!(user_id, "Discarding stale profile response");
            false
        }
    }
}
