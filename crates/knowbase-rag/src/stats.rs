//! Query statistics owned by the service lifecycle. Counters are atomic,
//! so handlers can record from concurrent tasks without a lock; the
//! aggregator is injected rather than reached through ambient state.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct QueryStats {
    queries: AtomicU64,
    total_latency_ms: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct StatsSnapshot {
    pub queries: u64,
    pub total_latency_ms: u64,
    pub avg_latency_ms: f64,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, latency: Duration) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let queries = self.queries.load(Ordering::Relaxed);
        let total_latency_ms = self.total_latency_ms.load(Ordering::Relaxed);
        let avg_latency_ms = if queries == 0 {
            0.0
        } else {
            total_latency_ms as f64 / queries as f64
        };
        StatsSnapshot { queries, total_latency_ms, avg_latency_ms }
    }
}
