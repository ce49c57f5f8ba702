//! DriveHub core - session lifecycle and authenticated-resource
//! synchronization for the dealership management console.
//!
//! This crate owns the credentials, the current-user cache, and the rules
//! by which every screen reads or mutates server-owned state:
//!
//! - [`auth`]: the session state machine, credential store and
//!   `SessionManager` operations (login, registration, logout, profile
//!   mutation, account deletion, session restore)
//! - [`api`]: the `ApiClient` policy wrapper that attaches the bearer
//!   token, classifies responses and tears the session down on an auth
//!   rejection
//! - [`views`]: per-resource local caches (inventory, notifications,
//!   referrals/commissions) reconciled against confirmed server responses
//! - [`sync`]: per-record response-recency guard so a late-arriving stale
//!   response never overwrites newer state
//!
//! Everything is cooperative async on tokio; there is no parallelism, only
//! interleaved continuations, and the session handle is the single shared
//! writer.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod sync;
pub mod views;

pub use api::{ApiClient, ApiError};
pub use auth::{CredentialStore, Feedback, SessionHandle, SessionManager, SessionState};
pub use config::Config;
