use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use batchtone_core::error::CoreError;
use batchtone_engine::{EngineError, StorageError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`EngineError`] for failures of
/// the engine's collaborators. Implements [`IntoResponse`] to produce
/// consistent `{ "error", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Any engine error other than [`EngineError::Core`], which is unwrapped
    /// into [`AppError::Core`] on conversion.
    #[error(transparent)]
    Engine(EngineError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(core) => Self::Core(core),
            other => Self::Engine(other),
        }
    }
}

fn internal(err: &dyn std::fmt::Display, context: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "{context}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Internal(msg) => internal(msg, "Internal core error"),
            },

            // --- Engine collaborators ---
            AppError::Engine(engine) => match engine {
                EngineError::BatchFull { .. } => {
                    (StatusCode::CONFLICT, "BATCH_FULL", engine.to_string())
                }
                EngineError::PartialPropagation { first, failed, attempted } => {
                    tracing::error!(error = %first, failed, attempted, "Propagation partially failed");
                    (
                        StatusCode::BAD_GATEWAY,
                        "PARTIAL_PROPAGATION",
                        format!("Failed to apply to all: {failed} of {attempted} photos were not updated"),
                    )
                }
                EngineError::Storage(StorageError::Rejected(msg)) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                EngineError::Storage(err) => internal(err, "Blob storage error"),
                EngineError::Store(err) => internal(err, "Row store error"),
                EngineError::Core(core) => internal(core, "Unconverted core error"),
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
