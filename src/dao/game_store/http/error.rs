//! Error types shared by the league API storage implementation.

use reqwest::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`HttpStoreError`] failures.
pub type HttpStoreResult<T> = Result<T, HttpStoreError>;

/// Failures that can occur while talking to the league API.
#[derive(Debug, Error)]
pub enum HttpStoreError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build league API client")]
    ClientBuilder {
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent or did not complete.
    #[error("failed to send league API request to `{path}`")]
    RequestSend {
        /// Request path.
        path: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The API returned an unexpected status code.
    #[error("unexpected league API response status {status} for `{path}`")]
    RequestStatus {
        /// Request path.
        path: String,
        /// Status returned by the API.
        status: StatusCode,
    },
    /// The API refused the update itself (validation or conflict).
    #[error("league API refused update of game `{game_id}` with status {status}")]
    UpdateRefused {
        /// Game whose patch was refused.
        game_id: Uuid,
        /// Status returned by the API.
        status: StatusCode,
    },
    /// Response payload could not be parsed into the expected model.
    #[error("failed to decode league API response for `{path}`")]
    DecodeResponse {
        /// Request path.
        path: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

impl From<HttpStoreError> for StorageError {
    fn from(err: HttpStoreError) -> Self {
        match err {
            HttpStoreError::UpdateRefused { game_id, status } => StorageError::Rejected {
                game_id,
                message: format!("status {status}"),
            },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
