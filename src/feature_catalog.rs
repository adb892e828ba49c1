//! Canonical feature ordering for model inputs.
//!
//! Trained model artifacts consume features positionally, so every consumer
//! that lays features out as a vector must use [`FeatureOrder`] exactly as
//! loaded, never the caller's own key order.

use crate::error::{PredictionError, Result};
use crate::types::prediction::PredictionInput;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Features selected by RFE on the reference dataset, in training order.
const DEFAULT_FEATURES: [&str; 15] = [
    "Time", "V1", "V4", "V5", "V8", "V10", "V12", "V13", "V14", "V16", "V17", "V20", "V22", "V28",
    "Amount",
];

/// Ordered, duplicate-free sequence of feature names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureOrder(Vec<String>);

impl FeatureOrder {
    /// Validate and wrap a feature sequence.
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(PredictionError::Configuration(
                "feature order is empty".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(PredictionError::Configuration(format!(
                    "duplicate feature name '{}' in feature order",
                    name
                )));
            }
        }

        Ok(Self(names))
    }

    /// Built-in 15-feature order
    pub fn reference() -> Self {
        Self(DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of a feature in the canonical order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|f| f == name)
    }

    /// Lay out a sparse input as a dense vector in canonical order.
    ///
    /// Missing features become 0.0; keys outside the order are dropped.
    pub fn canonical_vector(&self, input: &PredictionInput) -> Vec<f32> {
        self.0
            .iter()
            .map(|name| input.get(name).copied().unwrap_or(0.0) as f32)
            .collect()
    }

    /// Input keys that are not part of the canonical order, sorted.
    pub fn unknown_keys<'a>(&self, input: &'a PredictionInput) -> Vec<&'a str> {
        let mut extra: Vec<&str> = input
            .keys()
            .map(|k| k.as_str())
            .filter(|k| self.position(k).is_none())
            .collect();
        extra.sort_unstable();
        extra
    }
}

impl TryFrom<Vec<String>> for FeatureOrder {
    type Error = PredictionError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        Self::new(names)
    }
}

impl From<FeatureOrder> for Vec<String> {
    fn from(order: FeatureOrder) -> Self {
        order.0
    }
}

/// Lazily loaded, process-lifetime cache of the feature order
pub struct FeatureCatalog {
    path: PathBuf,
    order: OnceLock<FeatureOrder>,
}

impl FeatureCatalog {
    /// Create a catalog backed by the document at `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            order: OnceLock::new(),
        }
    }

    /// Create a catalog that is already populated with `order`
    pub fn with_order(order: FeatureOrder) -> Self {
        let catalog = Self::new(PathBuf::new());
        let _ = catalog.order.set(order);
        catalog
    }

    /// Get the feature order, loading it on first use.
    pub fn get_feature_names(&self) -> Result<&FeatureOrder> {
        if let Some(order) = self.order.get() {
            return Ok(order);
        }

        let loaded = load_order(&self.path)?;
        Ok(self.order.get_or_init(|| loaded))
    }
}

fn load_order(path: &Path) -> Result<FeatureOrder> {
    if !path.exists() {
        info!(path = %path.display(), "Feature document not found, using built-in feature order");
        return Ok(FeatureOrder::reference());
    }

    let data = fs::read_to_string(path).map_err(|e| {
        PredictionError::Configuration(format!("failed to read {}: {}", path.display(), e))
    })?;

    let names: Vec<String> = serde_json::from_str(&data).map_err(|e| {
        PredictionError::Configuration(format!("malformed feature document {}: {}", path.display(), e))
    })?;

    let order = FeatureOrder::new(names)?;
    debug!(path = %path.display(), features = order.len(), "Loaded feature document");
    Ok(order)
}
