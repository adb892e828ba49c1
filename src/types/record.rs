//! Prediction history record handed to the storage collaborator

use crate::types::prediction::{PredictionInput, PredictionResult, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A successful prediction, published for persistence by an external store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Unique record identifier
    pub record_id: String,

    /// Model that produced the verdict
    pub model_name: String,

    /// Verdict returned to the caller
    pub prediction: Verdict,

    /// Confidence returned to the caller (0 - 100)
    pub confidence: f64,

    /// Features exactly as submitted
    pub features: PredictionInput,

    /// Opaque identity of the requester
    pub requested_by: String,

    /// Record creation timestamp
    pub timestamp: DateTime<Utc>,
}

impl PredictionRecord {
    /// Create a record from a completed prediction
    pub fn new(result: &PredictionResult, features: &PredictionInput, requested_by: &str) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            model_name: result.model_name.clone(),
            prediction: result.prediction,
            confidence: result.confidence,
            features: features.clone(),
            requested_by: requested_by.to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_result() {
        let result = PredictionResult::new(Verdict::Legitimate, 100.0, "Random Forest");
        let mut features = PredictionInput::new();
        features.insert("Amount".to_string(), 100.0);

        let record = PredictionRecord::new(&result, &features, "user_42");

        assert_eq!(record.model_name, "Random Forest");
        assert_eq!(record.prediction, Verdict::Legitimate);
        assert_eq!(record.features.get("Amount"), Some(&100.0));
        assert_eq!(record.requested_by, "user_42");
        assert!(uuid::Uuid::parse_str(&record.record_id).is_ok());
    }

    #[test]
    fn test_record_serialization() {
        let result = PredictionResult::new(Verdict::Fraud, 87.0, "Logistic Regression");
        let record = PredictionRecord::new(&result, &PredictionInput::new(), "user_1");

        let json = serde_json::to_string(&record).unwrap();
        let deserialized: PredictionRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(record.record_id, deserialized.record_id);
        assert_eq!(record.prediction, deserialized.prediction);
        assert_eq!(record.confidence, deserialized.confidence);
    }
}
