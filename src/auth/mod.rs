//! Authentication module for managing the user session and credentials.
//!
//! This module provides:
//! - `SessionState` / `SessionHandle`: the owned, shared session state
//! - `CredentialStore`: durable token + user-snapshot persistence
//! - `SessionManager`: login, registration, logout, profile mutation and
//!   session restoration
//!
//! The session survives process restarts via the credential store and is
//! revalidated against the server on restore.

pub mod manager;
pub mod session;
pub mod store;

pub use manager::{Feedback, SessionManager};
pub use session::{SessionHandle, SessionState};
pub use store::{CredentialStore, StoredSession};
