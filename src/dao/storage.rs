use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying transport.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or answered unexpectedly.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What the backend was doing.
        message: String,
        /// Transport or backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend refused the update itself.
    #[error("storage rejected update for game `{game_id}`: {message}")]
    Rejected {
        /// Game whose update was refused.
        game_id: uuid::Uuid,
        /// Backend explanation.
        message: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
