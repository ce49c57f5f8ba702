use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::store::CredentialStore;
use crate::models::User;

/// In-memory session state.
///
/// The token and user live only inside the `Authenticated` variant, so
/// `authenticated == (token present AND user present)` holds by
/// construction; the two can never be set independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Anonymous,
    /// A login or registration is in flight. Entered only from `Anonymous`.
    Authenticating,
    Authenticated { token: String, user: User },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }
}

/// Shared, owned handle to the session state plus its credential store.
///
/// Cloned into the `SessionManager` (which drives every state transition)
/// and the `ApiClient` (which reads the token and invalidates on an auth
/// rejection so every view observes logout without polling). Views receive
/// read-only snapshots through the accessors.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: Arc<RwLock<SessionState>>,
    store: CredentialStore,
}

impl SessionHandle {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::Anonymous)),
            store,
        }
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token().map(str::to_string)
    }

    /// Read-only snapshot of the current user.
    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user().cloned()
    }

    pub(crate) fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Mark a login/registration in flight. Fails if not anonymous.
    pub(crate) async fn begin_authenticating(&self) -> bool {
        let mut state = self.state.write().await;
        if *state == SessionState::Anonymous {
            *state = SessionState::Authenticating;
            true
        } else {
            false
        }
    }

    /// Abort an in-flight authentication, restoring `Anonymous`.
    pub(crate) async fn abort_authenticating(&self) {
        let mut state = self.state.write().await;
        if *state == SessionState::Authenticating {
            *state = SessionState::Anonymous;
        }
    }

    /// Atomically install an authenticated session and persist it. A store
    /// write failure leaves the in-memory session valid and is only logged;
    /// the next successful login rewrites the file.
    pub(crate) async fn install(&self, token: String, user: User) {
        let mut state = self.state.write().await;
        if let Err(e) = self.store.save(&token, &user) {
            warn!(error = %e, "Failed to persist session to credential store");
        }
        *state = SessionState::Authenticated { token, user };
    }

    /// Replace the cached user with the server's returned representation,
    /// keeping the persisted snapshot in step. A no-op when the session was
    /// torn down while the response was in flight (lost identity).
    pub(crate) async fn replace_user(&self, user: User) {
        let mut state = self.state.write().await;
        match &mut *state {
            SessionState::Authenticated { token, user: cached } => {
                if let Err(e) = self.store.save(token, &user) {
                    warn!(error = %e, "Failed to persist updated user snapshot");
                }
                *cached = user;
            }
            _ => {
                debug!("Discarding user snapshot for torn-down session");
            }
        }
    }

    /// Tear down the session: clear memory and the credential store.
    /// Idempotent; invoked by logout, account deletion and the resource
    /// client's auth-rejection path.
    pub(crate) async fn invalidate(&self) {
        let mut state = self.state.write().await;
        *state = SessionState::Anonymous;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear credential store");
        }
    }

    /// Tear down only if the session still carries `token`. A response that
    /// outlived the session it was issued under must not touch whatever
    /// session replaced it. Returns whether the teardown happened.
    pub(crate) async fn invalidate_if_token(&self, token: &str) -> bool {
        let mut state = self.state.write().await;
        if state.token() != Some(token) {
            debug!("Ignoring teardown for a superseded session");
            return false;
        }
        *state = SessionState::Anonymous;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear credential store");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static DIR_SEQ: AtomicU64 = AtomicU64::new(0);

    fn handle() -> SessionHandle {
        let dir = std::env::temp_dir().join(format!(
            "drivehub-session-test-{}-{}",
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        SessionHandle::new(CredentialStore::new(dir))
    }

    fn user() -> User {
        User {
            id: 9,
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            organisation: Some("Navy Motors".to_string()),
        }
    }

    /// authenticated == (token present AND user present), in every state.
    #[test]
    fn test_authenticated_iff_token_and_user() {
        for state in [
            SessionState::Anonymous,
            SessionState::Authenticating,
            SessionState::Authenticated {
                token: "t".to_string(),
                user: user(),
            },
        ] {
            assert_eq!(
                state.is_authenticated(),
                state.token().is_some() && state.user().is_some()
            );
        }
    }

    #[tokio::test]
    async fn test_install_then_invalidate() {
        let h = handle();
        h.install("tok".to_string(), user()).await;
        assert!(h.is_authenticated().await);
        assert_eq!(h.token().await.as_deref(), Some("tok"));
        assert!(h.store().load().unwrap().is_some());

        h.invalidate().await;
        assert!(!h.is_authenticated().await);
        assert!(h.token().await.is_none());
        assert!(h.store().load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let h = handle();
        h.install("tok".to_string(), user()).await;
        h.invalidate().await;
        h.invalidate().await;
        assert_eq!(h.state().await, SessionState::Anonymous);
        assert!(h.store().load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticating_only_from_anonymous() {
        let h = handle();
        assert!(h.begin_authenticating().await);
        // Re-entry while already authenticating is rejected.
        assert!(!h.begin_authenticating().await);
        h.abort_authenticating().await;
        assert_eq!(h.state().await, SessionState::Anonymous);

        h.install("tok".to_string(), user()).await;
        assert!(!h.begin_authenticating().await);
        h.invalidate().await;
    }

    #[tokio::test]
    async fn test_invalidate_if_token_spares_a_replaced_session() {
        let h = handle();
        h.install("newer".to_string(), user()).await;

        // A teardown keyed to a token the session no longer carries is a
        // no-op.
        assert!(!h.invalidate_if_token("older").await);
        assert!(h.is_authenticated().await);
        assert!(h.store().load().unwrap().is_some());

        assert!(h.invalidate_if_token("newer").await);
        assert!(!h.is_authenticated().await);
        assert!(h.store().load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_user_after_teardown_is_noop() {
        let h = handle();
        h.replace_user(user()).await;
        assert_eq!(h.state().await, SessionState::Anonymous);
        assert!(h.store().load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_user_keeps_token_and_store_in_step() {
        let h = handle();
        h.install("tok".to_string(), user()).await;
        let mut updated = user();
        updated.first_name = "Amazing".to_string();
        h.replace_user(updated.clone()).await;

        assert_eq!(h.token().await.as_deref(), Some("tok"));
        assert_eq!(h.user().await.unwrap().first_name, "Amazing");
        let stored = h.store().load().unwrap().unwrap();
        assert_eq!(stored.user.first_name, "Amazing");
        h.invalidate().await;
    }
}
