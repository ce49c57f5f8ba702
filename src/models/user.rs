use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// An authenticated DriveHub account holder.
///
/// Owned by the session layer. Views receive cloned snapshots and must
/// route every mutation through `SessionManager::update_profile`; a locally
/// edited copy is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organisation: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Partial profile update. Only the populated fields are sent on the wire;
/// the server's full returned representation replaces the cached user.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.organisation.is_none()
            && self.password.is_none()
    }
}

/// Registration form payload. `confirm_password` is checked locally and
/// never serialized to the wire.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm_password: String,
    pub organisation: Option<String>,
}

impl RegisterRequest {
    /// Form-level validation. Failures here never reach the network layer.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(ApiError::invalid_input("First and last name are required"));
        }
        if self.email.trim().is_empty() {
            return Err(ApiError::invalid_input("Email is required"));
        }
        if self.password.is_empty() {
            return Err(ApiError::invalid_input("Password is required"));
        }
        if self.password != self.confirm_password {
            return Err(ApiError::invalid_input("Passwords do not match"));
        }
        Ok(())
    }
}
