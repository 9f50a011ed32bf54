//! Leaderview server: error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use leaderview_core::error::{ControllerError, DomainError, InsertError, ServiceError};
use serde::Serialize;
use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Startup and runtime errors for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Tracing or trace export could not be set up.
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::Controller(ControllerError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            DomainError::Controller(ControllerError::Forbidden(_)) => {
                (StatusCode::FORBIDDEN, "forbidden")
            }
            DomainError::Controller(ControllerError::NotFound(_))
            | DomainError::SubscriptionNotRegistered(_) => (StatusCode::NOT_FOUND, "not_found"),
            DomainError::Insert(InsertError::AlreadyExists(_)) => {
                (StatusCode::CONFLICT, "already_exists")
            }
            DomainError::Service(ServiceError::SyncProcessing { .. }) => {
                (StatusCode::BAD_GATEWAY, "upstream_error")
            }
            DomainError::Service(ServiceError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            DomainError::Insert(InsertError::Storage(_))
            | DomainError::Service(ServiceError::Storage(_))
            | DomainError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
