//! REST API client module for the DriveHub backend.
//!
//! This module provides the `ApiClient` for communicating with the remote
//! API and the `ApiError` taxonomy every operation resolves into.
//!
//! The API uses bearer token authentication; the token is read from the
//! shared session handle on each request.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
