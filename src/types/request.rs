//! Request/response envelopes exchanged with request-handling collaborators

use crate::error::{ErrorKind, PredictionError};
use crate::models::evaluation::MetricsCatalog;
use crate::types::prediction::{PredictionInput, PredictionResult};
use serde::{Deserialize, Serialize};

/// A single request addressed to the prediction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ServiceRequest {
    ListModels,
    ListFeatures,
    GetMetrics,
    #[serde(rename_all = "camelCase")]
    Predict {
        model_name: String,
        #[serde(default)]
        features: PredictionInput,
        /// Identity of the caller, if known. Only identified predictions are
        /// handed to the history store.
        #[serde(default)]
        requested_by: Option<String>,
    },
}

impl ServiceRequest {
    /// Operation label for logging
    pub fn op(&self) -> &'static str {
        match self {
            ServiceRequest::ListModels => "list_models",
            ServiceRequest::ListFeatures => "list_features",
            ServiceRequest::GetMetrics => "get_metrics",
            ServiceRequest::Predict { .. } => "predict",
        }
    }
}

/// Successful payload of a [`ServiceResponse`]
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Models(Vec<String>),
    Features(Vec<String>),
    Metrics(MetricsCatalog),
    Prediction(PredictionResult),
}

/// Reply sent back for every [`ServiceRequest`]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ServiceResponse {
    Ok {
        result: ResponseBody,
    },
    Error {
        kind: ErrorKind,
        code: u16,
        message: String,
    },
}

impl ServiceResponse {
    pub fn ok(result: ResponseBody) -> Self {
        ServiceResponse::Ok { result }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ServiceResponse::Ok { .. })
    }
}

impl From<&PredictionError> for ServiceResponse {
    fn from(err: &PredictionError) -> Self {
        ServiceResponse::Error {
            kind: err.kind(),
            code: err.status_code(),
            message: err.to_string(),
        }
    }
}

impl From<PredictionError> for ServiceResponse {
    fn from(err: PredictionError) -> Self {
        ServiceResponse::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::prediction::Verdict;

    #[test]
    fn test_predict_request_parsing() {
        let json = r#"{"op":"predict","modelName":"Random Forest","features":{"Amount":5000,"V1":0}}"#;
        let request: ServiceRequest = serde_json::from_str(json).unwrap();

        match request {
            ServiceRequest::Predict {
                model_name,
                features,
                requested_by,
            } => {
                assert_eq!(model_name, "Random Forest");
                assert_eq!(features.get("Amount"), Some(&5000.0));
                assert!(requested_by.is_none());
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_unit_requests_parsing() {
        let request: ServiceRequest = serde_json::from_str(r#"{"op":"list_models"}"#).unwrap();
        assert_eq!(request, ServiceRequest::ListModels);
        assert_eq!(request.op(), "list_models");

        assert!(serde_json::from_str::<ServiceRequest>(r#"{"op":"train"}"#).is_err());
    }

    #[test]
    fn test_non_numeric_feature_rejected() {
        let json = r#"{"op":"predict","modelName":"Random Forest","features":{"Amount":"high"}}"#;
        assert!(serde_json::from_str::<ServiceRequest>(json).is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let ok = ServiceResponse::ok(ResponseBody::Prediction(PredictionResult::new(
            Verdict::Fraud,
            87.0,
            "Random Forest",
        )));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["result"]["prediction"], "fraud");

        let err: ServiceResponse = PredictionError::NotFound("Unknown Model".to_string()).into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["code"], 404);
        assert!(!err.is_ok());
    }
}
