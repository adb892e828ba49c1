//! Prediction input and result data structures

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sparse mapping from feature name to value.
///
/// Features missing from the map are scored as 0.0. Keys outside the
/// canonical feature order are ignored by in-process scoring and forwarded
/// verbatim to an external worker.
pub type PredictionInput = HashMap<String, f64>;

/// Binary classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Fraud,
    Legitimate,
}

impl Verdict {
    /// Parse the wire label used by workers.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "fraud" => Some(Verdict::Fraud),
            "legitimate" => Some(Verdict::Legitimate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Fraud => "fraud",
            Verdict::Legitimate => "legitimate",
        }
    }

    pub fn is_fraud(&self) -> bool {
        matches!(self, Verdict::Fraud)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// Fraud or legitimate
    pub prediction: Verdict,
    /// Confidence in the verdict (0 - 100)
    pub confidence: f64,
    /// Model identifier echoed from the request
    pub model_name: String,
}

impl PredictionResult {
    pub fn new(prediction: Verdict, confidence: f64, model_name: impl Into<String>) -> Self {
        Self {
            prediction,
            confidence,
            model_name: model_name.into(),
        }
    }
}
