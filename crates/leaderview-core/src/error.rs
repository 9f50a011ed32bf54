//! Domain error types.
//!
//! Errors flow outward in layers: `ClientError` from the external game APIs
//! becomes a `ServiceError` at the resolver/synchronizer boundary,
//! repositories raise `InsertError`, the write side raises `ControllerError`,
//! and processors return the umbrella `DomainError`.

use thiserror::Error;

use crate::retry::Retryable;

/// Transport or decoding failure talking to an external game API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The API answered with a non-success status.
    #[error("http error (status {status}): {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("json parse error: {0}")]
    JsonParse(String),
}

impl ClientError {
    /// Short name of the variant, used as the `kind` of a `ServiceError`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "HttpError",
            Self::Network(_) => "NetworkError",
            Self::JsonParse(_) => "JsonParseError",
        }
    }

    /// Returns true when the API reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

impl Retryable for ClientError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { status, .. } if *status >= 500 || *status == 429)
    }
}

/// Failure of a resolver, synchronizer or updater operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// A call to an external API failed while processing an entity.
    #[error("sync processing error ({kind}): {message}")]
    SyncProcessing {
        /// The underlying failure kind (e.g. `HttpError`).
        kind: String,
        /// Human-readable error message.
        message: String,
    },

    /// A referenced entity or character does not exist anywhere.
    #[error("not found: {0}")]
    NotFound(String),

    /// Reading or writing local storage failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<ClientError> for ServiceError {
    fn from(err: ClientError) -> Self {
        Self::SyncProcessing {
            kind: err.kind().to_owned(),
            message: err.to_string(),
        }
    }
}

/// Failure inserting entities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InsertError {
    /// An entity with the same external identity already exists.
    #[error("entity already exists: {0}")]
    AlreadyExists(String),

    /// Any other storage failure.
    #[error("insert failed: {0}")]
    Storage(String),
}

/// Validation or authorization failure at the write boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControllerError {
    /// The request is malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller may not act on the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Write-side validation or authorization failure.
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Entity insertion failure.
    #[error(transparent)]
    Insert(#[from] InsertError),

    /// Resolver or synchronizer failure.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A subscription was polled before being registered.
    #[error("subscription not registered: {0}")]
    SubscriptionNotRegistered(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Infrastructure(format!("serialization failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_and_throttling_are_retryable() {
        for status in [500, 502, 503, 429] {
            let err = ClientError::Http {
                status,
                body: String::new(),
            };
            assert!(err.is_retryable(), "status {status} should be retryable");
        }
    }

    #[test]
    fn test_client_errors_and_parse_failures_are_not_retryable() {
        let not_found = ClientError::Http {
            status: 404,
            body: String::new(),
        };
        assert!(!not_found.is_retryable());
        assert!(!ClientError::JsonParse("eof".into()).is_retryable());
        assert!(!ClientError::Network("reset".into()).is_retryable());
    }

    #[test]
    fn test_client_error_maps_to_sync_processing_error() {
        let err: ServiceError = ClientError::Network("connection reset".into()).into();

        match err {
            ServiceError::SyncProcessing { kind, message } => {
                assert_eq!(kind, "NetworkError");
                assert_eq!(message, "network error: connection reset");
            }
            other => panic!("expected SyncProcessing, got {other:?}"),
        }
    }
}
