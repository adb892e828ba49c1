//! Per-model evaluation metrics store
//!
//! Metrics are read once from an optional JSON document and cached for the
//! lifetime of the store. A missing document selects the built-in catalog; a
//! present but malformed document is a configuration fault.

use crate::error::{PredictionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Evaluation metrics of a trained model, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub f1_score: f64,
    pub precision: f64,
    pub recall: f64,
    pub auc_roc: f64,
    pub auprc: f64,
}

impl ModelMetrics {
    /// Score cutoff above which a transaction is classified as fraud.
    pub fn decision_threshold(&self) -> f64 {
        1.0 - self.recall
    }

    /// Name of the first metric outside [0, 1], if any.
    fn out_of_range(&self) -> Option<&'static str> {
        [
            ("f1_score", self.f1_score),
            ("precision", self.precision),
            ("recall", self.recall),
            ("auc_roc", self.auc_roc),
            ("auprc", self.auprc),
        ]
        .into_iter()
        .find(|(_, value)| !(0.0..=1.0).contains(value))
        .map(|(name, _)| name)
    }
}

/// Model identifier to metrics
pub type MetricsCatalog = BTreeMap<String, ModelMetrics>;

/// Metrics measured on the reference test split (RFE, 15 features).
pub fn default_catalog() -> MetricsCatalog {
    let mut catalog = MetricsCatalog::new();
    catalog.insert(
        "Logistic Regression".to_string(),
        ModelMetrics {
            f1_score: 0.1056,
            precision: 0.056,
            recall: 0.9184,
            auc_roc: 0.9669,
            auprc: 0.7153,
        },
    );
    catalog.insert(
        "Random Forest".to_string(),
        ModelMetrics {
            f1_score: 0.8701,
            precision: 0.9747,
            recall: 0.7857,
            auc_roc: 0.9531,
            auprc: 0.8846,
        },
    );
    catalog.insert(
        "Support Vector Machine".to_string(),
        ModelMetrics {
            f1_score: 0.0081,
            precision: 0.0041,
            recall: 0.9082,
            auc_roc: 0.9245,
            auprc: 0.6434,
        },
    );
    catalog
}

/// Lazily loaded, process-lifetime cache of the metrics catalog
pub struct MetricsStore {
    path: PathBuf,
    catalog: OnceLock<MetricsCatalog>,
}

impl MetricsStore {
    /// Create a store backed by the document at `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            catalog: OnceLock::new(),
        }
    }

    /// Create a store that is already populated with `catalog`
    pub fn with_catalog(catalog: MetricsCatalog) -> Self {
        let store = Self::new(PathBuf::new());
        let _ = store.catalog.set(catalog);
        store
    }

    /// Get the metrics catalog, loading it on first use.
    ///
    /// Concurrent first calls may both load the document; only one result is
    /// kept and every caller observes that one.
    pub fn get_model_metrics(&self) -> Result<&MetricsCatalog> {
        if let Some(catalog) = self.catalog.get() {
            return Ok(catalog);
        }

        let loaded = load_catalog(&self.path)?;
        Ok(self.catalog.get_or_init(|| loaded))
    }

    /// Metrics for a single model.
    ///
    /// A registered model without an entry means the persisted document does
    /// not cover the registry, which is a configuration fault.
    pub fn metrics_for(&self, model_name: &str) -> Result<&ModelMetrics> {
        self.get_model_metrics()?.get(model_name).ok_or_else(|| {
            PredictionError::Configuration(format!(
                "no evaluation metrics recorded for model '{}'",
                model_name
            ))
        })
    }
}

fn load_catalog(path: &Path) -> Result<MetricsCatalog> {
    if !path.exists() {
        info!(path = %path.display(), "Metrics document not found, using built-in metrics");
        return Ok(default_catalog());
    }

    let data = fs::read_to_string(path).map_err(|e| {
        PredictionError::Configuration(format!("failed to read {}: {}", path.display(), e))
    })?;

    let catalog: MetricsCatalog = serde_json::from_str(&data).map_err(|e| {
        PredictionError::Configuration(format!("malformed metrics document {}: {}", path.display(), e))
    })?;

    for (model, metrics) in &catalog {
        if let Some(field) = metrics.out_of_range() {
            return Err(PredictionError::Configuration(format!(
                "metric '{}' of model '{}' is outside [0, 1]",
                field, model
            )));
        }
    }

    debug!(path = %path.display(), models = catalog.len(), "Loaded metrics document");
    Ok(catalog)
}
