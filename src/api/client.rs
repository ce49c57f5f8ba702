//! Authenticated HTTP client for the DriveHub API.
//!
//! Every outbound call that requires identity goes through `ApiClient`: it
//! attaches the current bearer token, classifies the response into the
//! `ApiError` taxonomy, and on an auth rejection invalidates the shared
//! session so every view reflects logout without polling for expiry.

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::SessionHandle;

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
/// A timeout surfaces to callers as `ApiError::Network`.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the DriveHub backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionHandle,
}

impl ApiClient {
    /// Create a new API client bound to a session handle.
    pub fn new(base_url: impl Into<String>, session: SessionHandle) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Execute one request described by method, path, optional JSON body and
    /// the auth requirement. With `needs_auth` and no token present the call
    /// fails immediately with `Unauthenticated` and never touches the
    /// network. An auth-rejection response invalidates the session that
    /// issued the rejected token before the failure propagates.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        needs_auth: bool,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.client.request(method.clone(), self.url(path));

        let mut sent_token = None;
        if needs_auth {
            match self.session.token().await {
                Some(token) => {
                    request = request.bearer_auth(&token);
                    sent_token = Some(token);
                }
                None => return Err(ApiError::Unauthenticated),
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body_text = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status, &body_text);
        debug!(method = %method, path, status = %status, "Request failed");

        if err.is_auth_rejection() {
            if let Some(token) = sent_token {
                // Only tear down the session the rejected token belongs to;
                // a session replaced while this request was in flight is
                // left alone.
                warn!(path, "Token rejected by server, tearing down session");
                self.session.invalidate_if_token(&token).await;
            }
        }
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::Server(format!("Malformed response: {}", e)))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        needs_auth: bool,
    ) -> Result<T, ApiError> {
        let response = self
            .execute::<()>(Method::GET, path, None, needs_auth)
            .await?;
        Self::decode(response).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        needs_auth: bool,
    ) -> Result<T, ApiError> {
        let response = self
            .execute(Method::POST, path, Some(body), needs_auth)
            .await?;
        Self::decode(response).await
    }

    /// POST whose response body the caller does not care about
    /// (mark-read, logout, password check).
    pub async fn post_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        needs_auth: bool,
    ) -> Result<(), ApiError> {
        self.execute(Method::POST, path, body, needs_auth).await?;
        Ok(())
    }

    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        needs_auth: bool,
    ) -> Result<T, ApiError> {
        let response = self
            .execute(Method::PUT, path, Some(body), needs_auth)
            .await?;
        Self::decode(response).await
    }

    pub async fn delete(&self, path: &str, needs_auth: bool) -> Result<(), ApiError> {
        self.execute::<()>(Method::DELETE, path, None, needs_auth)
            .await?;
        Ok(())
    }
}
