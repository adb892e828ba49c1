//! Configuration management for the prediction service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Scoring strategy behind `predict`
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InferenceStrategy {
    /// Rule-based scoring computed in-process - always available
    #[default]
    Heuristic,
    /// Delegate scoring to the external worker hosting the trained models
    Worker,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming service requests
    pub request_subject: String,
    /// Subject the history store listens on for completed predictions
    pub history_subject: String,
    /// Queue group shared by service instances; each request goes to one member
    #[serde(default)]
    pub queue_group: Option<String>,
}

/// Model catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Optional JSON document with per-model evaluation metrics
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    /// Optional JSON document with the canonical feature order
    #[serde(default = "default_features_path")]
    pub features_path: String,
    /// Scoring strategy: "heuristic" or "worker"
    #[serde(default)]
    pub strategy: InferenceStrategy,
}

fn default_metrics_path() -> String {
    "models/model_metrics.json".to_string()
}

fn default_features_path() -> String {
    "models/feature_names.json".to_string()
}

/// External inference worker configuration.
///
/// The worker reads one JSON request from stdin and writes one JSON object
/// (`{"prediction", "confidence"}` or `{"error"}`) to stdout before exiting.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WorkerConfig {
    /// Worker executable
    #[serde(default = "default_worker_program")]
    pub program: String,
    /// Arguments passed to the worker
    #[serde(default)]
    pub args: Vec<String>,
    /// Deadline for one worker interaction; none by default
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Maximum concurrently running workers; unbounded by default
    #[serde(default)]
    pub max_concurrent: Option<usize>,
}

fn default_worker_program() -> String {
    "fraud-model-worker".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: default_worker_program(),
            args: Vec::new(),
            timeout_ms: None,
            max_concurrent: None,
        }
    }
}

/// Request handling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Maximum requests handled concurrently
    pub workers: usize,
    /// Interval between metrics summaries in seconds
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
    /// How long shutdown waits for in-flight requests
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

fn default_report_interval() -> u64 {
    30
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    ///
    /// Values can be overridden with `FRAUD_SERVICE__<SECTION>__<KEY>`
    /// environment variables.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("FRAUD_SERVICE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "fraud.predict".to_string(),
                history_subject: "fraud.predictions.history".to_string(),
                queue_group: None,
            },
            models: ModelsConfig {
                metrics_path: default_metrics_path(),
                features_path: default_features_path(),
                strategy: InferenceStrategy::Heuristic,
            },
            worker: WorkerConfig::default(),
            service: ServiceConfig {
                workers: 16,
                report_interval_secs: default_report_interval(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.models.strategy, InferenceStrategy::Heuristic);
        assert_eq!(config.worker.program, "fraud-model-worker");
        assert!(config.worker.args.is_empty());
        assert_eq!(config.worker.timeout_ms, None);
        assert_eq!(config.nats.queue_group, None);
        assert_eq!(config.service.workers, 16);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[nats]
url = "nats://nats:4222"
request_subject = "predict"
history_subject = "history"
queue_group = "scorers"

[models]
strategy = "worker"

[worker]
program = "/opt/worker/bin/score"
timeout_ms = 2500

[service]
workers = 4

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();

        assert_eq!(config.models.strategy, InferenceStrategy::Worker);
        assert_eq!(config.models.metrics_path, "models/model_metrics.json");
        assert_eq!(config.worker.program, "/opt/worker/bin/score");
        assert!(config.worker.args.is_empty());
        assert_eq!(config.worker.timeout_ms, Some(2500));
        assert_eq!(config.worker.max_concurrent, None);
        assert_eq!(config.service.report_interval_secs, 30);
        assert_eq!(config.service.shutdown_timeout_secs, 30);
        assert_eq!(config.nats.queue_group.as_deref(), Some("scorers"));
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(AppConfig::load_from_path("does/not/exist.toml").is_err());
    }
}
