//! Out-of-process inference bridge
//!
//! Delegates scoring to an external worker that hosts the trained models.
//! Each call spawns one worker, writes one JSON request to its stdin, closes
//! stdin, drains stdout and stderr concurrently until the worker exits, and
//! validates the single JSON response. There are no retries.

use crate::config::WorkerConfig;
use crate::error::{PredictionError, Result};
use crate::feature_catalog::FeatureOrder;
use crate::types::prediction::{PredictionInput, PredictionResult, Verdict};
use serde::Serialize;
use serde_json::Value;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Lifecycle of a single bridge invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    Dispatched,
    AwaitingResponse,
    Succeeded,
    Failed,
}

impl BridgeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BridgeState::Succeeded | BridgeState::Failed)
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: BridgeState) -> bool {
        use BridgeState::*;
        matches!(
            (self, next),
            (Idle, Dispatched)
                | (Idle, Failed)
                | (Dispatched, AwaitingResponse)
                | (Dispatched, Failed)
                | (AwaitingResponse, Succeeded)
                | (AwaitingResponse, Failed)
        )
    }
}

/// Request message written to the worker's stdin
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest<'a> {
    pub model_name: &'a str,
    pub features: &'a PredictionInput,
    pub feature_order: &'a FeatureOrder,
    /// `features` laid out positionally in `feature_order`
    pub feature_vector: Vec<f32>,
}

impl<'a> WorkerRequest<'a> {
    pub fn new(
        model_name: &'a str,
        features: &'a PredictionInput,
        feature_order: &'a FeatureOrder,
    ) -> Self {
        Self {
            model_name,
            features,
            feature_order,
            feature_vector: feature_order.canonical_vector(features),
        }
    }
}

/// Tracks and logs the state of one invocation
struct Invocation<'a> {
    model_name: &'a str,
    state: BridgeState,
}

impl<'a> Invocation<'a> {
    fn new(model_name: &'a str) -> Self {
        Self {
            model_name,
            state: BridgeState::Idle,
        }
    }

    fn advance(&mut self, next: BridgeState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal bridge transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(model = %self.model_name, from = ?self.state, to = ?next, "Bridge transition");
        self.state = next;
    }

    fn fail(&mut self, err: PredictionError) -> PredictionError {
        self.advance(BridgeState::Failed);
        err
    }
}

impl Drop for Invocation<'_> {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            warn!(model = %self.model_name, state = ?self.state, "Worker invocation abandoned, killing worker");
        }
    }
}

/// Spawns and talks to the external inference worker
pub struct WorkerBridge {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
    admission: Option<Arc<Semaphore>>,
}

impl WorkerBridge {
    /// Create a bridge from worker configuration
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout_ms.map(Duration::from_millis),
            admission: config
                .max_concurrent
                .map(|permits| Arc::new(Semaphore::new(permits.max(1)))),
        }
    }

    /// Run one prediction through a fresh worker.
    ///
    /// Dropping the returned future kills the worker. When a timeout is
    /// configured it covers waiting for admission as well as the worker run;
    /// on expiry the worker is killed and `Timeout` is returned.
    pub async fn predict(
        &self,
        model_name: &str,
        features: &PredictionInput,
        feature_order: &FeatureOrder,
    ) -> Result<PredictionResult> {
        let request = WorkerRequest::new(model_name, features, feature_order);
        let payload = serde_json::to_vec(&request).map_err(|e| {
            PredictionError::ProtocolViolation(format!("failed to encode worker request: {}", e))
        })?;
        debug!(model = %model_name, features = request.feature_vector.len(), "Encoded worker request");

        let admitted = async {
            let _permit = match &self.admission {
                Some(semaphore) => Some(semaphore.clone().acquire_owned().await.map_err(|_| {
                    PredictionError::WorkerUnavailable("worker admission closed".to_string())
                })?),
                None => None,
            };
            self.invoke(model_name, payload).await
        };

        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, admitted).await {
                Ok(result) => result,
                Err(_) => {
                    let ms = limit.as_millis() as u64;
                    warn!(model = %model_name, timeout_ms = ms, "Worker deadline expired");
                    Err(PredictionError::Timeout(ms))
                }
            },
            None => admitted.await,
        }
    }

    async fn invoke(&self, model_name: &str, payload: Vec<u8>) -> Result<PredictionResult> {
        let mut invocation = Invocation::new(model_name);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!(program = %self.program, error = %e, "Failed to start worker process");
                invocation.fail(PredictionError::WorkerUnavailable(format!(
                    "failed to start '{}': {}. Check the worker environment",
                    self.program, e
                )))
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            invocation.fail(PredictionError::WorkerUnavailable(
                "worker stdin was not captured".to_string(),
            ))
        })?;
        invocation.advance(BridgeState::Dispatched);

        let write = async move {
            let written = stdin.write_all(&payload).await;
            // Dropping stdin closes the pipe and signals end of request
            drop(stdin);
            written
        };

        invocation.advance(BridgeState::AwaitingResponse);
        let (written, output) = tokio::join!(write, child.wait_with_output());

        let output = output.map_err(|e| {
            invocation.fail(PredictionError::WorkerFailure(format!(
                "failed to collect worker output: {}",
                e
            )))
        })?;

        if let Err(e) = written {
            // The exit status below decides the outcome
            warn!(model = %model_name, error = %e, "Failed to write request to worker");
        }

        match interpret_output(model_name, &output) {
            Ok(result) => {
                invocation.advance(BridgeState::Succeeded);
                Ok(result)
            }
            Err(e) => Err(invocation.fail(e)),
        }
    }
}

fn interpret_output(model_name: &str, output: &Output) -> Result<PredictionResult> {
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        error!(
            model = %model_name,
            status = %output.status,
            stderr = %stderr.trim(),
            "Worker exited unsuccessfully"
        );
        return Err(PredictionError::WorkerFailure(format!(
            "worker exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    if !stderr.trim().is_empty() {
        debug!(model = %model_name, stderr = %stderr.trim(), "Worker diagnostics");
    }

    parse_response(model_name, &output.stdout)
}

/// Validate a worker response and build the result.
pub fn parse_response(model_name: &str, stdout: &[u8]) -> Result<PredictionResult> {
    let value: Value = serde_json::from_slice(stdout).map_err(|e| {
        error!(
            model = %model_name,
            output = %String::from_utf8_lossy(stdout),
            error = %e,
            "Failed to parse worker output"
        );
        PredictionError::ProtocolViolation(format!("unparseable worker output: {}", e))
    })?;

    let body = value.as_object().ok_or_else(|| {
        PredictionError::ProtocolViolation("worker output is not a JSON object".to_string())
    })?;

    if let Some(reported) = body.get("error").filter(|v| is_reported_error(v)) {
        let message = reported
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| reported.to_string());
        error!(model = %model_name, error = %message, "Worker reported error");
        return Err(PredictionError::WorkerFailure(message));
    }

    let label = body
        .get("prediction")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            PredictionError::ProtocolViolation(
                "'prediction' must be a non-empty string".to_string(),
            )
        })?;

    let confidence = body
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            PredictionError::ProtocolViolation("'confidence' must be a number".to_string())
        })?;

    let prediction = Verdict::from_label(label).ok_or_else(|| {
        PredictionError::ProtocolViolation(format!("unknown prediction label '{}'", label))
    })?;

    if !(0.0..=100.0).contains(&confidence) {
        return Err(PredictionError::ProtocolViolation(format!(
            "confidence {} is outside [0, 100]",
            confidence
        )));
    }

    Ok(PredictionResult::new(prediction, confidence, model_name))
}

fn is_reported_error(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
