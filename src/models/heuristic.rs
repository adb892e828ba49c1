//! In-process rule-based fraud scoring
//!
//! The always-available scoring path: a handful of fixed rules over the
//! transaction amount and two PCA indicator components, adjusted per model
//! family and compared against the model's recall-derived threshold.

use crate::models::evaluation::ModelMetrics;
use crate::models::registry::ModelKind;
use crate::types::prediction::{PredictionInput, PredictionResult, Verdict};
use tracing::debug;

const AMOUNT_FEATURE: &str = "Amount";
const TIME_FEATURE: &str = "Time";
const INDICATOR_FEATURES: [&str; 2] = ["V1", "V4"];

const HIGH_AMOUNT: f64 = 1000.0;
const LOW_AMOUNT: f64 = 10.0;
const INDICATOR_LIMIT: f64 = 2.0;

const HIGH_AMOUNT_WEIGHT: f64 = 0.20;
const LOW_AMOUNT_WEIGHT: f64 = 0.10;
const INDICATOR_WEIGHT: f64 = 0.15;

/// Values the rules look at, with missing features read as 0.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub amount: f64,
    pub time: f64,
    pub indicators: [f64; 2],
}

impl Signals {
    pub fn from_input(features: &PredictionInput) -> Self {
        let get = |name: &str| features.get(name).copied().unwrap_or(0.0);
        Self {
            amount: get(AMOUNT_FEATURE),
            time: get(TIME_FEATURE),
            indicators: [get(INDICATOR_FEATURES[0]), get(INDICATOR_FEATURES[1])],
        }
    }

    /// Unclamped sum of rule contributions, in [0, inf)
    pub fn raw_score(&self) -> f64 {
        let mut score = 0.0;

        if self.amount > HIGH_AMOUNT {
            score += HIGH_AMOUNT_WEIGHT;
        }
        if self.amount < LOW_AMOUNT {
            score += LOW_AMOUNT_WEIGHT;
        }
        for value in self.indicators {
            if value.abs() > INDICATOR_LIMIT {
                score += INDICATOR_WEIGHT;
            }
        }

        score
    }
}

/// Deterministic rule-based scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn new() -> Self {
        Self
    }

    /// Fraud score in [0, 1] after the model-specific adjustment
    pub fn score(&self, model_name: &str, features: &PredictionInput) -> f64 {
        let signals = Signals::from_input(features);
        let adjusted = signals.raw_score() * ModelKind::from_name(model_name).score_multiplier();
        adjusted.clamp(0.0, 1.0)
    }

    /// Score and classify against the model's decision threshold.
    ///
    /// The caller is responsible for validating `model_name`.
    pub fn predict(
        &self,
        model_name: &str,
        features: &PredictionInput,
        metrics: &ModelMetrics,
    ) -> PredictionResult {
        let score = self.score(model_name, features);
        let threshold = metrics.decision_threshold();

        let (prediction, confidence) = if score > threshold {
            (Verdict::Fraud, (score * 100.0).round())
        } else {
            (Verdict::Legitimate, ((1.0 - score) * 100.0).round())
        };

        debug!(
            model = %model_name,
            score = score,
            threshold = threshold,
            prediction = %prediction,
            "Heuristic scoring complete"
        );

        PredictionResult::new(prediction, confidence, model_name)
    }
}
