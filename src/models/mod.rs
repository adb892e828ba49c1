//! Model registry, evaluation metrics and scoring strategies

pub mod bridge;
pub mod evaluation;
pub mod heuristic;
pub mod inference;
pub mod registry;

pub use bridge::WorkerBridge;
pub use evaluation::{MetricsCatalog, MetricsStore, ModelMetrics};
pub use heuristic::HeuristicScorer;
pub use inference::InferenceEngine;
pub use registry::{ModelKind, ModelRegistry};
