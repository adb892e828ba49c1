//! Fraud Prediction Service - Main Entry Point
//!
//! Serves prediction requests received over NATS request/reply, and hands
//! identified predictions to the history store.

use anyhow::{Context, Result};
use fraud_prediction_service::{
    config::AppConfig,
    consumer::RequestConsumer,
    metrics::{MetricsReporter, ServiceMetrics},
    models::inference::InferenceEngine,
    producer::{HistoryProducer, ReplyProducer},
    service::PredictionService,
    shutdown::InFlightRequests,
    types::{ResponseBody, ServiceResponse},
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            EnvFilter::try_new(format!("fraud_prediction_service={}", config.logging.level))?
        }
    };

    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from_path(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => AppConfig::load()?,
    };

    init_logging(&config)?;
    info!("Starting Fraud Prediction Service");

    let metrics = Arc::new(ServiceMetrics::new());
    let service = Arc::new(PredictionService::new(InferenceEngine::new(&config)));
    info!(
        strategy = ?service.engine().strategy(),
        worker = %config.worker.program,
        workers = config.service.workers,
        "Configuration loaded successfully"
    );

    // Check catalogs at startup
    match service.list_features() {
        Ok(features) => info!(count = features.len(), "Feature catalog ready"),
        Err(e) => error!(kind = e.kind().as_str(), error = %e, "Feature catalog unavailable"),
    }
    match service.get_metrics() {
        Ok(catalog) => info!(models = ?catalog.keys().collect::<Vec<_>>(), "Metrics catalog ready"),
        Err(e) => error!(kind = e.kind().as_str(), error = %e, "Metrics catalog unavailable"),
    }

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats);
    let replies = ReplyProducer::new(client.clone());
    let history = HistoryProducer::new(client.clone(), &config.nats.history_subject);
    info!("Publishing prediction history to: {}", history.subject());

    // Start metrics reporter
    let reporter = MetricsReporter::new(metrics.clone(), config.service.report_interval_secs);
    tokio::spawn(reporter.start());

    // Limit concurrent request handling
    let in_flight = InFlightRequests::new(config.service.workers);
    let mut subscription = consumer.subscribe().await?;

    loop {
        let message = tokio::select! {
            message = subscription.next() => match message {
                Some(message) => message,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        };

        let permit = in_flight.acquire().await?;

        let service = service.clone();
        let replies = replies.clone();
        let history = history.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();
            let handled = service.handle_payload(&message.payload).await;
            let elapsed = start_time.elapsed();

            metrics.record_request();
            match &handled.response {
                ServiceResponse::Ok {
                    result: ResponseBody::Prediction(result),
                } => {
                    metrics.record_prediction(elapsed, result);
                    debug!(
                        model = %result.model_name,
                        prediction = %result.prediction,
                        confidence = result.confidence,
                        duration_us = elapsed.as_micros() as u64,
                        "Prediction served"
                    );
                }
                ServiceResponse::Error { kind, .. } => metrics.record_failure(*kind),
                ServiceResponse::Ok { .. } => {}
            }

            match message.reply {
                Some(reply_to) => {
                    if let Err(e) = replies.reply(reply_to, &handled.response).await {
                        error!(error = %e, "Failed to publish reply");
                    }
                }
                None => warn!(subject = %message.subject, "Request without reply subject"),
            }

            // History is best-effort and never changes the reply
            if let Some(record) = handled.record {
                if let Err(e) = history.publish(&record).await {
                    metrics.record_history_failure();
                    error!(
                        record_id = %record.record_id,
                        error = %e,
                        "Failed to publish prediction record"
                    );
                }
            }

            drop(permit);
        });
    }

    info!("Service shutting down...");
    if let Err(e) = subscription.unsubscribe().await {
        warn!(error = %e, "Failed to unsubscribe from request subject");
    }

    // Let running handlers publish their replies and history records
    let drained = in_flight
        .drain(Duration::from_secs(config.service.shutdown_timeout_secs))
        .await;
    if drained {
        info!("All in-flight requests completed");
    }

    if let Err(e) = client.flush().await {
        error!(error = %e, "Failed to flush pending messages");
    }

    metrics.print_summary();

    Ok(())
}
