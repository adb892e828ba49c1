//! Error types for the prediction service.
//!
//! Every failure surfaced by the scoring engine or the worker bridge maps to
//! exactly one [`PredictionError`] variant so that callers can tell "unknown
//! model" apart from "broken configuration", "worker said no" and "the pipe
//! is broken".

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PredictionError>;

/// Errors produced while serving a prediction request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// Requested model identifier is not registered.
    #[error("Model not found: {0}")]
    NotFound(String),

    /// A persisted metrics or feature document exists but is malformed.
    #[error("Configuration fault: {0}")]
    Configuration(String),

    /// The worker executable could not be started.
    #[error("ML service unavailable: {0}")]
    WorkerUnavailable(String),

    /// The worker exited non-zero or reported an error itself.
    #[error("Prediction failed: {0}")]
    WorkerFailure(String),

    /// The worker response could not be parsed or has the wrong shape.
    #[error("Invalid response format from ML service: {0}")]
    ProtocolViolation(String),

    /// The worker did not finish before the configured deadline.
    #[error("Prediction timed out after {0} ms")]
    Timeout(u64),

    /// The request envelope could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Stable, wire-facing classification of a [`PredictionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Configuration,
    WorkerUnavailable,
    WorkerFailure,
    ProtocolViolation,
    Timeout,
    BadRequest,
}

impl ErrorKind {
    /// Lowercase label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Configuration => "configuration",
            ErrorKind::WorkerUnavailable => "worker_unavailable",
            ErrorKind::WorkerFailure => "worker_failure",
            ErrorKind::ProtocolViolation => "protocol_violation",
            ErrorKind::Timeout => "timeout",
            ErrorKind::BadRequest => "bad_request",
        }
    }
}

impl PredictionError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictionError::NotFound(_) => ErrorKind::NotFound,
            PredictionError::Configuration(_) => ErrorKind::Configuration,
            PredictionError::WorkerUnavailable(_) => ErrorKind::WorkerUnavailable,
            PredictionError::WorkerFailure(_) => ErrorKind::WorkerFailure,
            PredictionError::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
            PredictionError::Timeout(_) => ErrorKind::Timeout,
            PredictionError::BadRequest(_) => ErrorKind::BadRequest,
        }
    }

    /// HTTP-style status code for request-handling collaborators.
    pub fn status_code(&self) -> u16 {
        match self {
            PredictionError::NotFound(_) => 404,
            PredictionError::BadRequest(_) => 400,
            PredictionError::Configuration(_) => 500,
            PredictionError::ProtocolViolation(_) => 500,
            PredictionError::WorkerFailure(_) => 502,
            PredictionError::WorkerUnavailable(_) => 503,
            PredictionError::Timeout(_) => 504,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_model() {
        let err = PredictionError::NotFound("Unknown Model".to_string());
        assert!(err.to_string().contains("Unknown Model"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_worker_errors_are_distinguishable() {
        let failure = PredictionError::WorkerFailure("model not loaded".to_string());
        let violation = PredictionError::ProtocolViolation("missing confidence".to_string());
        assert_ne!(failure.kind(), violation.kind());
        assert_eq!(
            PredictionError::WorkerUnavailable("python".to_string()).status_code(),
            503
        );
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::ProtocolViolation).unwrap();
        assert_eq!(json, "\"protocol_violation\"");
        assert_eq!(ErrorKind::Timeout.as_str(), "timeout");
    }
}
