//! Sample Prediction Client
//!
//! Generates sample transactions and sends them to the prediction service
//! over NATS request/reply.

use fraud_prediction_service::feature_catalog::FeatureOrder;
use fraud_prediction_service::models::registry::ModelRegistry;
use fraud_prediction_service::types::{PredictionInput, ServiceRequest};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Sample transaction generator over the canonical feature order
struct SampleGenerator {
    rng: rand::rngs::ThreadRng,
    order: FeatureOrder,
    models: Vec<String>,
}

impl SampleGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            order: FeatureOrder::reference(),
            models: ModelRegistry::new()
                .available_models()
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }

    /// Features of an ordinary transaction
    fn generate_legitimate(&mut self) -> PredictionInput {
        let mut features = PredictionInput::new();
        for name in self.order.names() {
            let value = match name.as_str() {
                "Time" => self.rng.gen_range(0.0..172_800.0),
                "Amount" => self.rng.gen_range(10.0..500.0),
                _ => self.rng.gen_range(-1.5..1.5),
            };
            features.insert(name.clone(), value);
        }
        features
    }

    /// Features of a suspicious transaction
    fn generate_suspicious(&mut self) -> PredictionInput {
        let mut features = self.generate_legitimate();
        let amount = if self.rng.gen_bool(0.7) {
            self.rng.gen_range(1000.0..10_000.0) // High amount
        } else {
            self.rng.gen_range(0.01..10.0) // Card testing
        };
        features.insert("Amount".to_string(), amount);
        features.insert("V1".to_string(), -self.rng.gen_range(2.0..8.0));
        features.insert("V4".to_string(), self.rng.gen_range(2.0..6.0));
        features
    }

    fn random_model(&mut self) -> String {
        self.models[self.rng.gen_range(0..self.models.len())].clone()
    }

    fn next_request(&mut self, fraud_rate: f64) -> ServiceRequest {
        let features = if self.rng.gen_bool(fraud_rate) {
            self.generate_suspicious()
        } else {
            self.generate_legitimate()
        };

        ServiceRequest::Predict {
            model_name: self.random_model(),
            features,
            requested_by: Some("predict-client".to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("predict_client=info".parse()?),
        )
        .init();

    info!("Starting Sample Prediction Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("fraud.predict");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(20);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate).await;
        }
    };

    // Catalog queries first
    for op in [ServiceRequest::ListModels, ServiceRequest::ListFeatures, ServiceRequest::GetMetrics] {
        let reply = client
            .request(subject.to_string(), serde_json::to_vec(&op)?.into())
            .await?;
        info!(op = op.op(), reply = %String::from_utf8_lossy(&reply.payload), "Catalog reply");
    }

    let mut generator = SampleGenerator::new();
    let mut fraud_verdicts = 0;

    for i in 0..count {
        let request = generator.next_request(fraud_rate);
        let payload = serde_json::to_vec(&request)?;

        match client.request(subject.to_string(), payload.into()).await {
            Ok(reply) => {
                let body: serde_json::Value = serde_json::from_slice(&reply.payload)?;
                if body["result"]["prediction"] == "fraud" {
                    fraud_verdicts += 1;
                }
                info!(request = i + 1, reply = %body, "Prediction reply");
            }
            Err(e) => warn!(request = i + 1, error = %e, "Request failed"),
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} prediction requests ({} fraud verdicts)",
        count, fraud_verdicts
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = SampleGenerator::new();

    for i in 0..count {
        let request = generator.next_request(fraud_rate);
        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }
    }

    Ok(())
}
