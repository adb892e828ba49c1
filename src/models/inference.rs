//! Prediction engine selecting between in-process and worker scoring

use crate::config::{AppConfig, InferenceStrategy, WorkerConfig};
use crate::error::Result;
use crate::feature_catalog::FeatureCatalog;
use crate::models::bridge::WorkerBridge;
use crate::models::evaluation::MetricsStore;
use crate::models::heuristic::HeuristicScorer;
use crate::models::registry::ModelRegistry;
use crate::types::prediction::{PredictionInput, PredictionResult};
use std::sync::Arc;
use tracing::{debug, info};

/// Validates requests against the registry and dispatches to the configured
/// scoring strategy
pub struct InferenceEngine {
    registry: ModelRegistry,
    metrics: Arc<MetricsStore>,
    features: Arc<FeatureCatalog>,
    strategy: InferenceStrategy,
    heuristic: HeuristicScorer,
    bridge: WorkerBridge,
}

impl InferenceEngine {
    /// Create an engine from configuration
    pub fn new(config: &AppConfig) -> Self {
        let metrics = Arc::new(MetricsStore::new(&config.models.metrics_path));
        let features = Arc::new(FeatureCatalog::new(&config.models.features_path));

        info!(
            strategy = ?config.models.strategy,
            metrics_path = %config.models.metrics_path,
            features_path = %config.models.features_path,
            "Inference engine initialized"
        );

        Self::with_stores(metrics, features, config.models.strategy, &config.worker)
    }

    /// Create an engine over existing catalog stores
    pub fn with_stores(
        metrics: Arc<MetricsStore>,
        features: Arc<FeatureCatalog>,
        strategy: InferenceStrategy,
        worker: &WorkerConfig,
    ) -> Self {
        Self {
            registry: ModelRegistry::new(),
            metrics,
            features,
            strategy,
            heuristic: HeuristicScorer::new(),
            bridge: WorkerBridge::new(worker),
        }
    }

    /// Get the current inference strategy
    pub fn strategy(&self) -> InferenceStrategy {
        self.strategy
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &MetricsStore {
        &self.metrics
    }

    pub fn features(&self) -> &FeatureCatalog {
        &self.features
    }

    /// Score a feature mapping with the named model.
    ///
    /// Fails with `NotFound` for unregistered models before any catalog is
    /// read or any worker is started.
    pub async fn predict(
        &self,
        model_name: &str,
        features: &PredictionInput,
    ) -> Result<PredictionResult> {
        self.registry.require(model_name)?;
        let feature_order = self.features.get_feature_names()?;

        let unknown = feature_order.unknown_keys(features);
        if !unknown.is_empty() {
            debug!(model = %model_name, unknown = ?unknown, "Input carries features outside the canonical order");
        }

        match self.strategy {
            InferenceStrategy::Heuristic => {
                let metrics = self.metrics.metrics_for(model_name)?;
                Ok(self.heuristic.predict(model_name, features, metrics))
            }
            InferenceStrategy::Worker => {
                self.bridge
                    .predict(model_name, features, feature_order)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictionError;
    use crate::feature_catalog::FeatureOrder;
    use crate::models::evaluation::{default_catalog, ModelMetrics};
    use crate::types::prediction::Verdict;

    fn heuristic_engine() -> InferenceEngine {
        InferenceEngine::with_stores(
            Arc::new(MetricsStore::with_catalog(default_catalog())),
            Arc::new(FeatureCatalog::with_order(FeatureOrder::reference())),
            InferenceStrategy::Heuristic,
            &WorkerConfig::default(),
        )
    }

    fn input(pairs: &[(&str, f64)]) -> PredictionInput {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[tokio::test]
    async fn test_scenario_legitimate() {
        let engine = heuristic_engine();
        let features = input(&[("Time", 0.0), ("V1", 0.0), ("V4", 0.0), ("Amount", 100.0)]);

        let result = engine.predict("Random Forest", &features).await.unwrap();

        assert_eq!(result.prediction, Verdict::Legitimate);
        assert_eq!(result.confidence, 100.0);
        assert_eq!(result.model_name, "Random Forest");
    }

    #[tokio::test]
    async fn test_scenario_high_amount() {
        let engine = heuristic_engine();
        let features = input(&[("Amount", 5000.0), ("V1", 0.0), ("V4", 0.0)]);

        let result = engine.predict("Random Forest", &features).await.unwrap();

        assert_eq!(result.prediction, Verdict::Fraud);
        assert_eq!(result.confidence, 24.0);
    }

    #[tokio::test]
    async fn test_unknown_model() {
        let engine = heuristic_engine();

        match engine.predict("Unknown Model", &PredictionInput::new()).await {
            Err(PredictionError::NotFound(name)) => assert_eq!(name, "Unknown Model"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bounds_for_all_models() {
        let engine = heuristic_engine();
        let inputs = [
            PredictionInput::new(),
            input(&[("V1", 10.0), ("V4", -10.0), ("Amount", 0.01)]),
            input(&[("Amount", 1500.0), ("V1", 2.5)]),
            input(&[("Amount", 1e12), ("V1", 1e6), ("V4", -1e6)]),
        ];

        for model in engine.registry().available_models() {
            for features in &inputs {
                let result = engine.predict(model, features).await.unwrap();
                assert!((0.0..=100.0).contains(&result.confidence));
                assert_eq!(result.model_name, *model);
            }
        }
    }

    #[tokio::test]
    async fn test_missing_metrics_entry_is_configuration_fault() {
        let mut catalog = default_catalog();
        catalog.remove("Support Vector Machine");
        let engine = InferenceEngine::with_stores(
            Arc::new(MetricsStore::with_catalog(catalog)),
            Arc::new(FeatureCatalog::with_order(FeatureOrder::reference())),
            InferenceStrategy::Heuristic,
            &WorkerConfig::default(),
        );

        assert!(matches!(
            engine
                .predict("Support Vector Machine", &PredictionInput::new())
                .await,
            Err(PredictionError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_threshold_follows_recall() {
        let engine_with_recall = |recall: f64| {
            let mut catalog = default_catalog();
            let metrics = ModelMetrics {
                recall,
                ..catalog["Random Forest"]
            };
            catalog.insert("Random Forest".to_string(), metrics);
            InferenceEngine::with_stores(
                Arc::new(MetricsStore::with_catalog(catalog)),
                Arc::new(FeatureCatalog::with_order(FeatureOrder::reference())),
                InferenceStrategy::Heuristic,
                &WorkerConfig::default(),
            )
        };
        // Random Forest scores 0.20 * 1.2 = 0.24 on this input
        let features = input(&[("Amount", 5000.0)]);

        // 0.24 > 1 - 0.9
        let result = engine_with_recall(0.9)
            .predict("Random Forest", &features)
            .await
            .unwrap();
        assert_eq!(result.prediction, Verdict::Fraud);

        // 0.24 < 1 - 0.5
        let result = engine_with_recall(0.5)
            .predict("Random Forest", &features)
            .await
            .unwrap();
        assert_eq!(result.prediction, Verdict::Legitimate);

        // Raising recall never turns a fraud verdict into a legitimate one
        let mut previous = Verdict::Legitimate;
        for recall in [0.1, 0.3, 0.5, 0.7, 0.76, 0.8, 0.9, 1.0] {
            let result = engine_with_recall(recall)
                .predict("Random Forest", &features)
                .await
                .unwrap();
            assert!(!(previous == Verdict::Fraud && result.prediction == Verdict::Legitimate));
            previous = result.prediction;
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_worker_strategy_unknown_model_never_spawns() {
        let engine = InferenceEngine::with_stores(
            Arc::new(MetricsStore::with_catalog(default_catalog())),
            Arc::new(FeatureCatalog::with_order(FeatureOrder::reference())),
            InferenceStrategy::Worker,
            &WorkerConfig {
                program: "/nonexistent/fraud-worker".to_string(),
                args: Vec::new(),
                timeout_ms: None,
                max_concurrent: None,
            },
        );

        assert!(matches!(
            engine.predict("Unknown Model", &PredictionInput::new()).await,
            Err(PredictionError::NotFound(_))
        ));
        assert!(matches!(
            engine.predict("Random Forest", &PredictionInput::new()).await,
            Err(PredictionError::WorkerUnavailable(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_worker_strategy_delegates() {
        let engine = InferenceEngine::with_stores(
            Arc::new(MetricsStore::with_catalog(default_catalog())),
            Arc::new(FeatureCatalog::with_order(FeatureOrder::reference())),
            InferenceStrategy::Worker,
            &WorkerConfig {
                program: "sh".to_string(),
                args: vec![
                    "-c".to_string(),
                    r#"cat > /dev/null; printf '{"prediction":"fraud","confidence":87,"modelName":"ignored"}'"#
                        .to_string(),
                ],
                timeout_ms: Some(5000),
                max_concurrent: None,
            },
        );

        let result = engine
            .predict("Logistic Regression", &PredictionInput::new())
            .await
            .unwrap();

        assert_eq!(result.prediction, Verdict::Fraud);
        assert_eq!(result.confidence, 87.0);
        assert_eq!(result.model_name, "Logistic Regression");
    }
}
