//! Request-side API of the prediction service
//!
//! [`PredictionService`] is the single entry point request-handling
//! collaborators call into. Transport concerns (decoding envelopes, replying,
//! handing records to the history store) stay outside the scoring core.

use crate::error::{PredictionError, Result};
use crate::models::evaluation::MetricsCatalog;
use crate::models::inference::InferenceEngine;
use crate::types::prediction::{PredictionInput, PredictionResult};
use crate::types::record::PredictionRecord;
use crate::types::request::{ResponseBody, ServiceRequest, ServiceResponse};
use tracing::{error, warn};

/// Outcome of handling one request
#[derive(Debug)]
pub struct Handled {
    /// Reply for the caller
    pub response: ServiceResponse,
    /// Record for the history store, present only for identified successful
    /// predictions
    pub record: Option<PredictionRecord>,
}

impl Handled {
    fn reply(response: ServiceResponse) -> Self {
        Self {
            response,
            record: None,
        }
    }
}

/// Facade over the inference engine and its catalogs
pub struct PredictionService {
    engine: InferenceEngine,
}

impl PredictionService {
    pub fn new(engine: InferenceEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Supported model identifiers
    pub fn list_models(&self) -> Vec<String> {
        self.engine
            .registry()
            .available_models()
            .iter()
            .map(|m| m.to_string())
            .collect()
    }

    /// Canonical feature order
    pub fn list_features(&self) -> Result<Vec<String>> {
        Ok(self.engine.features().get_feature_names()?.names().to_vec())
    }

    /// Evaluation metrics of every model
    pub fn get_metrics(&self) -> Result<MetricsCatalog> {
        Ok(self.engine.metrics().get_model_metrics()?.clone())
    }

    /// Score `features` with `model_name`
    pub async fn predict(
        &self,
        model_name: &str,
        features: &PredictionInput,
    ) -> Result<PredictionResult> {
        self.engine.predict(model_name, features).await
    }

    /// Decode a raw request envelope and handle it
    pub async fn handle_payload(&self, payload: &[u8]) -> Handled {
        match serde_json::from_slice::<ServiceRequest>(payload) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                let err = PredictionError::BadRequest(e.to_string());
                warn!(error = %err, "Rejected malformed request");
                Handled::reply(err.into())
            }
        }
    }

    /// Handle a decoded request
    pub async fn handle(&self, request: ServiceRequest) -> Handled {
        let op = request.op();

        let outcome = match request {
            ServiceRequest::ListModels => Ok((ResponseBody::Models(self.list_models()), None)),
            ServiceRequest::ListFeatures => self
                .list_features()
                .map(|features| (ResponseBody::Features(features), None)),
            ServiceRequest::GetMetrics => self
                .get_metrics()
                .map(|metrics| (ResponseBody::Metrics(metrics), None)),
            ServiceRequest::Predict {
                model_name,
                features,
                requested_by,
            } => self.predict(&model_name, &features).await.map(|result| {
                let record = requested_by
                    .as_deref()
                    .map(|who| PredictionRecord::new(&result, &features, who));
                (ResponseBody::Prediction(result), record)
            }),
        };

        match outcome {
            Ok((body, record)) => Handled {
                response: ServiceResponse::ok(body),
                record,
            },
            Err(err) => {
                log_failure(op, &err);
                Handled::reply(err.into())
            }
        }
    }
}

fn log_failure(op: &str, err: &PredictionError) {
    match err {
        PredictionError::Configuration(_) => {
            error!(op = op, kind = err.kind().as_str(), error = %err, "Configuration fault")
        }
        PredictionError::NotFound(_) | PredictionError::BadRequest(_) => {
            warn!(op = op, kind = err.kind().as_str(), error = %err, "Request rejected")
        }
        _ => error!(op = op, kind = err.kind().as_str(), error = %err, "Prediction failed"),
    }
}
