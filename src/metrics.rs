//! Request statistics for the prediction service.

use crate::error::ErrorKind;
use crate::types::prediction::PredictionResult;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for request handling
pub struct ServiceMetrics {
    /// Total requests handled, any operation
    pub requests_handled: AtomicU64,
    /// Successful predictions
    pub predictions_served: AtomicU64,
    /// Successful predictions with a fraud verdict
    pub fraud_verdicts: AtomicU64,
    /// History records that could not be published
    pub history_failures: AtomicU64,
    /// Failed requests by error kind
    failures_by_kind: RwLock<HashMap<ErrorKind, u64>>,
    /// Predictions per model
    predictions_by_model: RwLock<HashMap<String, u64>>,
    /// Prediction latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests_handled: AtomicU64::new(0),
            predictions_served: AtomicU64::new(0),
            fraud_verdicts: AtomicU64::new(0),
            history_failures: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            predictions_by_model: RwLock::new(HashMap::new()),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a handled request of any kind
    pub fn record_request(&self) {
        self.requests_handled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, latency: Duration, result: &PredictionResult) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        if result.prediction.is_fraud() {
            self.fraud_verdicts.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut by_model) = self.predictions_by_model.write() {
            *by_model.entry(result.model_name.clone()).or_insert(0) += 1;
        }

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
            // Keep only the most recent samples
            if latencies.len() > 10000 {
                latencies.drain(0..5000);
            }
        }
    }

    /// Record a failed request
    pub fn record_failure(&self, kind: ErrorKind) {
        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind).or_insert(0) += 1;
        }
    }

    /// Record a history record that was not handed off
    pub fn record_history_failure(&self) {
        self.history_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get prediction latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let latencies = match self.latencies.read() {
            Ok(latencies) => latencies,
            Err(_) => return LatencyStats::default(),
        };
        if latencies.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted: Vec<u64> = latencies.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get failure counts by error kind
    pub fn get_failures_by_kind(&self) -> HashMap<ErrorKind, u64> {
        self.failures_by_kind
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Get prediction counts by model
    pub fn get_predictions_by_model(&self) -> HashMap<String, u64> {
        self.predictions_by_model
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_handled.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let requests = self.requests_handled.load(Ordering::Relaxed);
        let predictions = self.predictions_served.load(Ordering::Relaxed);
        let frauds = self.fraud_verdicts.load(Ordering::Relaxed);
        let fraud_rate = if predictions > 0 {
            (frauds as f64 / predictions as f64) * 100.0
        } else {
            0.0
        };
        let latency = self.get_latency_stats();

        info!(
            requests = requests,
            throughput = format!("{:.1} req/s", self.get_throughput()),
            predictions = predictions,
            fraud_rate = format!("{:.1}%", fraud_rate),
            history_failures = self.history_failures.load(Ordering::Relaxed),
            "Service summary"
        );
        info!(
            mean_us = latency.mean_us,
            p50_us = latency.p50_us,
            p95_us = latency.p95_us,
            p99_us = latency.p99_us,
            max_us = latency.max_us,
            "Prediction latency"
        );
        for (model, count) in self.get_predictions_by_model() {
            info!(model = %model, predictions = count, "Predictions by model");
        }
        for (kind, count) in self.get_failures_by_kind() {
            info!(kind = kind.as_str(), failures = count, "Failures by kind");
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Prediction latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics reporter
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::prediction::Verdict;

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_request();
        metrics.record_request();
        metrics.record_prediction(
            Duration::from_micros(100),
            &PredictionResult::new(Verdict::Fraud, 24.0, "Random Forest"),
        );
        metrics.record_prediction(
            Duration::from_micros(300),
            &PredictionResult::new(Verdict::Legitimate, 100.0, "Random Forest"),
        );
        metrics.record_failure(ErrorKind::NotFound);

        assert_eq!(metrics.requests_handled.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.fraud_verdicts.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_predictions_by_model().get("Random Forest"), Some(&2));
        assert_eq!(metrics.get_failures_by_kind().get(&ErrorKind::NotFound), Some(&1));
    }

    #[test]
    fn test_latency_stats() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.get_latency_stats().count, 0);

        let result = PredictionResult::new(Verdict::Legitimate, 90.0, "Logistic Regression");
        for us in [100, 200, 300, 400] {
            metrics.record_prediction(Duration::from_micros(us), &result);
        }

        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
        assert_eq!(stats.p99_us, 400);
    }
}
