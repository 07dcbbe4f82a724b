use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::Outcome;

/// Faults raised by collaborators (repository, cache).
///
/// These never leave `ProductService`; they are converted to `Outcome` failures
/// at the operation boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("cache error: {0}")]
    Cache(String),
    #[error("operation cancelled")]
    Cancelled,
}

impl From<models::errors::ModelError> for ServiceError {
    fn from(e: models::errors::ModelError) -> Self {
        use models::errors::ModelError;
        match e {
            ModelError::Validation(msg) => ServiceError::Validation(msg),
            ModelError::Conflict(msg) => ServiceError::Conflict(msg),
            ModelError::Db(msg) => ServiceError::Db(msg),
        }
    }
}

/// Stable, machine-readable failure codes. Callers branch on these, never on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// identifier missing or blank
    InvalidInput,
    /// request failed declared field rules
    ValidationError,
    NotFound,
    /// create collided with an existing unique business key
    DuplicateKey,
    /// unexpected collaborator fault
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::DuplicateKey => "DUPLICATE_KEY",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller's cancellation token fired before the operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Return type of every service operation: cancellation is the only `Err`.
pub type ServiceCall<T> = Result<Outcome<T>, Cancelled>;

#[cfg(test)]
mod tests {
    use super::*;
    use models::errors::ModelError;

    #[test]
    fn codes_render_as_screaming_snake_case() {
        assert_eq!(ErrorCode::InvalidInput.to_string(), "INVALID_INPUT");
        assert_eq!(ErrorCode::DuplicateKey.as_str(), "DUPLICATE_KEY");
        let json = serde_json::to_string(&ErrorCode::ValidationError).unwrap();
        assert_eq!(json, "\"VALIDATION_ERROR\"");
        let back: ErrorCode = serde_json::from_str("\"NOT_FOUND\"").unwrap();
        assert_eq!(back, ErrorCode::NotFound);
    }

    #[test]
    fn model_errors_keep_their_category() {
        assert!(matches!(ServiceError::from(ModelError::Conflict("sku".into())), ServiceError::Conflict(_)));
        assert!(matches!(ServiceError::from(ModelError::Db("down".into())), ServiceError::Db(_)));
        assert!(matches!(ServiceError::from(ModelError::Validation("x".into())), ServiceError::Validation(_)));
    }
}
