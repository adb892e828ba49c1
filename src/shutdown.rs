//! In-flight request tracking for graceful shutdown.
//!
//! Every spawned request handler holds one permit until its reply and history
//! record have been handed to the client. Draining acquires every permit,
//! which completes once all handlers have finished.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::{info, warn};

/// Bounded set of request handlers that are still running
#[derive(Clone)]
pub struct InFlightRequests {
    permits: Arc<Semaphore>,
    capacity: u32,
}

impl InFlightRequests {
    /// Allow at most `capacity` concurrent handlers
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS.min(u32::MAX as usize));
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity: capacity as u32,
        }
    }

    /// Wait for a free handler slot
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.permits.clone().acquire_owned().await
    }

    /// Number of handlers currently running
    pub fn in_flight(&self) -> usize {
        self.capacity as usize - self.permits.available_permits()
    }

    /// Wait for every running handler to finish.
    ///
    /// Returns `false` if handlers were still running when `limit` expired.
    /// No new handler can start once draining has completed.
    pub async fn drain(&self, limit: Duration) -> bool {
        let pending = self.in_flight();
        if pending > 0 {
            info!(pending = pending, "Waiting for in-flight requests");
        }

        match tokio::time::timeout(limit, self.permits.acquire_many(self.capacity)).await {
            Ok(Ok(all)) => {
                all.forget();
                self.permits.close();
                true
            }
            Ok(Err(_)) => true,
            Err(_) => {
                warn!(
                    pending = self.in_flight(),
                    timeout_secs = limit.as_secs_f64(),
                    "Shutdown drain timed out, abandoning in-flight requests"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_waits_for_handlers() {
        let in_flight = InFlightRequests::new(4);
        let permit = in_flight.acquire().await.unwrap();
        assert_eq!(in_flight.in_flight(), 1);

        let finished = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let handler = {
            let finished = finished.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                finished.store(true, std::sync::atomic::Ordering::SeqCst);
                drop(permit);
            })
        };

        assert!(in_flight.drain(Duration::from_secs(5)).await);
        assert!(finished.load(std::sync::atomic::Ordering::SeqCst));
        handler.await.unwrap();

        // Drained: no further handlers are admitted
        assert!(in_flight.acquire().await.is_err());
    }

    #[tokio::test]
    async fn test_drain_times_out_on_stuck_handler() {
        let in_flight = InFlightRequests::new(2);
        let _stuck = in_flight.acquire().await.unwrap();

        let started = std::time::Instant::now();
        assert!(!in_flight.drain(Duration::from_millis(100)).await);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(in_flight.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_drain_when_idle() {
        let in_flight = InFlightRequests::new(8);
        assert!(in_flight.drain(Duration::from_millis(100)).await);
    }
}
