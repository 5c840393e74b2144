use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::scoring::ScoringError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The store did not confirm a scoring update; it was rolled back.
    #[error("{0}")]
    PersistenceFailed(String),
}

impl From<ScoringError> for ServiceError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::InvalidTransition(invalid) => {
                ServiceError::InvalidState(invalid.to_string())
            }
            err @ ScoringError::PersistenceFailure { .. } => {
                ServiceError::PersistenceFailed(err.to_string())
            }
            err @ ScoringError::OutOfRangeValue { .. } => ServiceError::InvalidInput(err.to_string()),
            err @ ScoringError::MissingGame(_) => ServiceError::NotFound(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::PersistenceFailed(message) => AppError::ServiceUnavailable(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::scoring::{InvalidTransition, game::GameStatus, lifecycle::ActionKind};

    fn status_of(err: ScoringError) -> StatusCode {
        AppError::from(ServiceError::from(err)).into_response().status()
    }

    #[test]
    fn scoring_errors_map_to_http_statuses() {
        assert_eq!(
            status_of(
                InvalidTransition {
                    from: GameStatus::Final,
                    action: ActionKind::RecordRuns,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ScoringError::OutOfRangeValue {
                field: "outs",
                value: 7
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ScoringError::PersistenceFailure {
                reason: "timeout".into()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(ScoringError::MissingGame(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
    }
}
