//! Type definitions for the prediction service

pub mod prediction;
pub mod record;
pub mod request;

pub use prediction::{PredictionInput, PredictionResult, Verdict};
pub use record::PredictionRecord;
pub use request::{ResponseBody, ServiceRequest, ServiceResponse};
