//! Fraud Prediction Service Library
//!
//! Classifies transactions as fraud or legitimate with a named model,
//! either with in-process rule-based scoring or by delegating to an
//! external worker process that hosts the trained models.

pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_catalog;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod service;
pub mod shutdown;
pub mod types;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::{PredictionError, Result};
pub use feature_catalog::{FeatureCatalog, FeatureOrder};
pub use models::inference::InferenceEngine;
pub use producer::{HistoryProducer, ReplyProducer};
pub use service::PredictionService;
pub use types::{prediction::PredictionResult, prediction::Verdict, record::PredictionRecord};
