//! Success/failure container returned by every service operation.

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::errors::ErrorCode;

const UNSPECIFIED_FAILURE: &str = "unspecified failure";

/// Failure payload: a human-readable message plus an optional stable code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    pub message: String,
    pub code: Option<ErrorCode>,
}

/// Either a value or a `Failure`, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure(Failure),
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Outcome::Success(value)
    }

    /// Build a failure. An empty message is replaced so that failures always explain themselves.
    pub fn failure(message: impl Into<String>, code: Option<ErrorCode>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = UNSPECIFIED_FAILURE.to_string();
        }
        Outcome::Failure(Failure { message, code })
    }

    /// Shorthand for a failure carrying `code`.
    pub fn coded(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::failure(message, Some(code))
    }

    /// Transform the success value; failures pass through with message and code untouched.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success(v) => Outcome::Success(f(v)),
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(v) => Some(v),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(e) => Some(e.message.as_str()),
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(e) => e.code,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Success(v) => Some(v),
            Outcome::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Failure(e) => Err(e),
        }
    }
}

impl<T> From<Result<T, Failure>> for Outcome<T> {
    fn from(res: Result<T, Failure>) -> Self {
        match res {
            Ok(v) => Outcome::Success(v),
            Err(e) => Outcome::Failure(e),
        }
    }
}

#[derive(Serialize)]
struct Wire<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
}

/// `{"success":true,"value":…}` or `{"success":false,"error":…,"code":…}`
impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Outcome::Success(v) => Wire { success: true, value: Some(v), error: None, code: None },
            Outcome::Failure(e) => Wire { success: false, value: None, error: Some(e.message.as_str()), code: e.code },
        };
        wire.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_transforms_success() {
        let doubled = Outcome::success(21).map(|v| v * 2);
        assert_eq!(doubled, Outcome::success(42));
        assert_eq!(doubled.value(), Some(&42));
        assert_eq!(doubled.error_code(), None);
    }

    #[test]
    fn map_passes_failure_through_verbatim() {
        let failed: Outcome<i32> = Outcome::coded(ErrorCode::NotFound, "product 'x' not found");
        let mapped = failed.clone().map(|v| format!("never {v}"));
        assert_eq!(mapped.error(), Some("product 'x' not found"));
        assert_eq!(mapped.error_code(), Some(ErrorCode::NotFound));
        assert_eq!(mapped.into_result().unwrap_err(), failed.into_result().unwrap_err());
    }

    #[test]
    fn failure_without_code_stays_uncoded() {
        let failed: Outcome<()> = Outcome::failure("boom", None);
        assert!(failed.is_failure());
        assert_eq!(failed.error_code(), None);
        assert_eq!(failed.clone().map(|_| 1).error_code(), None);
    }

    #[test]
    fn empty_failure_message_is_replaced() {
        let failed: Outcome<()> = Outcome::failure("  ", Some(ErrorCode::InternalError));
        assert_eq!(failed.error(), Some(UNSPECIFIED_FAILURE));
    }

    #[test]
    fn result_conversions_roundtrip() {
        let ok: Outcome<u8> = Ok::<u8, Failure>(7).into();
        assert_eq!(ok.into_value(), Some(7));
        let err = Failure { message: "nope".into(), code: Some(ErrorCode::ValidationError) };
        let failed: Outcome<u8> = Err(err.clone()).into();
        assert_eq!(failed.into_result(), Err(err));
    }

    #[test]
    fn serializes_with_success_flag() {
        let ok = serde_json::to_value(Outcome::success(true)).unwrap();
        assert_eq!(ok, serde_json::json!({ "success": true, "value": true }));

        let failed: Outcome<bool> = Outcome::coded(ErrorCode::DuplicateKey, "sku taken");
        let json = serde_json::to_value(failed).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "error": "sku taken", "code": "DUPLICATE_KEY" }));
    }
}
