//! Concurrency gate for workflow invocations
//!
//! A counting semaphore shared by every item of a run. The gate also tracks
//! how many permits are out and the highest count seen, so the bound can be
//! observed from outside.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::{BenchError, BenchResult};

/// Bounds the number of simultaneously in-flight evaluations
#[derive(Debug)]
pub struct ConcurrencyGate {
    semaphore: Semaphore,
    limit: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Held while an item is in flight; releases its slot when dropped
#[derive(Debug)]
pub struct GatePermit<'a> {
    _permit: SemaphorePermit<'a>,
    in_flight: &'a AtomicUsize,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyGate {
    /// Create a gate admitting `limit` items at once (at least one)
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Semaphore::new(limit),
            limit,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> BenchResult<GatePermit<'_>> {
        // The semaphore is only closed by `close`, which ends the run.
        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| BenchError::Cancelled)?;

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);

        Ok(GatePermit {
            _permit: permit,
            in_flight: &self.in_flight,
        })
    }

    /// Stop admitting items; pending and future `acquire` calls fail
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Items currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of items that held a slot at the same time
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_gate_bounds_in_flight() {
        let gate = ConcurrencyGate::new(3);

        let tasks = (0..10).map(|_| async {
            let _permit = gate.acquire().await.unwrap();
            assert!(gate.in_flight() <= 3);
            tokio::time::sleep(Duration::from_millis(5)).await;
        });
        futures::future::join_all(tasks).await;

        assert_eq!(gate.peak(), 3);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_zero_limit_admits_one() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.limit(), 1);
        let permit = gate.acquire().await.unwrap();
        assert_eq!(gate.in_flight(), 1);
        drop(permit);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_closed_gate_rejects() {
        let gate = ConcurrencyGate::new(2);
        gate.close();
        assert!(matches!(gate.acquire().await, Err(BenchError::Cancelled)));
    }
}
