use thiserror::Error;

/// Classified failure for every API-facing operation. Each asynchronous
/// operation in this crate resolves to a payload or one of these; nothing
/// propagates an uncaught transport or decoding failure.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No valid token locally; the call was never sent.
    #[error("Not authenticated - please log in")]
    Unauthenticated,

    /// The server rejected the supplied login credentials.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// 4xx response or local form validation - the caller's fault, never
    /// retried automatically and never a reason to tear down the session.
    #[error("Request rejected: {message}")]
    Validation { status: u16, message: String },

    /// Transport failure (connection refused, timeout, TLS, ...).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 5xx response or a malformed success payload.
    #[error("Server error: {0}")]
    Server(String),
}

/// Maximum length for error response bodies carried in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid carrying excessive data around.
    /// The cut point backs off to a char boundary so multibyte bodies never
    /// split a character.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }

    /// Pull the server's `{"error": "..."}` reason out of a failure body,
    /// falling back to the (truncated) raw body.
    fn error_message(body: &str) -> String {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(reason) = value.get("error").and_then(|e| e.as_str()) {
                return reason.to_string();
            }
        }
        Self::truncate_body(body)
    }

    /// Classify a non-success HTTP response.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthenticated,
            400..=499 => ApiError::Validation {
                status: status.as_u16(),
                message: Self::error_message(body),
            },
            _ => ApiError::Server(format!("Status {}: {}", status, Self::truncate_body(body))),
        }
    }

    /// Local form-validation failure that never reaches the network.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::Validation {
            status: 400,
            message: message.into(),
        }
    }

    /// Whether this failure means the session is no longer valid server-side.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ApiError::Unauthenticated)
    }
}
