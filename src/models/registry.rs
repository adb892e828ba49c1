//! Registry of supported model identifiers

use crate::error::{PredictionError, Result};

/// Fixed set of models the service knows how to score.
const AVAILABLE_MODELS: [&str; 3] = [
    "Logistic Regression",
    "Random Forest",
    "Support Vector Machine",
];

/// Model family, used to pick the model-specific score adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    LogisticRegression,
    RandomForest,
    SupportVectorMachine,
    Other,
}

impl ModelKind {
    /// Classify a model identifier
    pub fn from_name(name: &str) -> Self {
        match name {
            "Random Forest" => ModelKind::RandomForest,
            "Logistic Regression" => ModelKind::LogisticRegression,
            "Support Vector Machine" => ModelKind::SupportVectorMachine,
            _ => ModelKind::Other,
        }
    }

    /// Multiplier applied to the raw heuristic score
    pub fn score_multiplier(&self) -> f64 {
        match self {
            ModelKind::RandomForest => 1.2,
            ModelKind::LogisticRegression => 0.8,
            ModelKind::SupportVectorMachine => 0.9,
            ModelKind::Other => 1.0,
        }
    }
}

/// Single source of truth for "known model"
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRegistry;

impl ModelRegistry {
    pub fn new() -> Self {
        Self
    }

    /// All supported model identifiers
    pub fn available_models(&self) -> &'static [&'static str] {
        &AVAILABLE_MODELS
    }

    pub fn contains(&self, model_name: &str) -> bool {
        AVAILABLE_MODELS.contains(&model_name)
    }

    /// Fail with `NotFound` unless the model is registered
    pub fn require(&self, model_name: &str) -> Result<()> {
        if self.contains(model_name) {
            Ok(())
        } else {
            Err(PredictionError::NotFound(model_name.to_string()))
        }
    }
}
