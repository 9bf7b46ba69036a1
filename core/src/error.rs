//! Error types for the todo API client.
//!
//! # Design
//! 404 and 400 get dedicated variants carrying the server's `errorMessage`,
//! since callers routinely branch on "no such todo" and "bad input". All
//! other unexpected statuses land in `HttpError` with the raw body.

use thiserror::Error;

/// Errors returned by `TodoClient` methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404; the todo does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server returned 400; the payload was rejected.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}
