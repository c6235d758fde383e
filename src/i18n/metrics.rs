//! Bundle loading metrics.
//!
//! Each `TranslationStore` owns one `TranslationMetrics`, so tests can observe
//! a fresh set of counters per store.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Loads answered from the in-memory cache
    cache_hits: AtomicUsize,

    /// Loads that had to start a fetch
    cache_misses: AtomicUsize,

    /// Loads that joined a fetch another caller already started
    shared_waits: AtomicUsize,

    /// Individual resource fetches issued to the source
    fetches: AtomicUsize,

    /// Loads that failed
    load_failures: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_shared_wait(&self) {
        self.shared_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn shared_waits(&self) -> usize {
        self.shared_waits.load(Ordering::Relaxed)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn load_failures(&self) -> usize {
        self.load_failures.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_cache_queries = hits + misses;
        let cache_hit_rate = if total_cache_queries > 0 {
            (hits as f64 / total_cache_queries as f64) * 100.0
        } else {
            0.0
        };

        let failures = self.load_failures();
        let load_success_rate = if misses > 0 {
            (misses.saturating_sub(failures) as f64 / misses as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            shared_waits: self.shared_waits(),
            fetches: self.fetches(),
            load_failures: failures,
            load_success_rate,
        }
    }
}

/// Snapshot of the loading counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    pub shared_waits: usize,
    pub fetches: usize,
    pub load_failures: usize,

    /// Share of started loads that succeeded, as a percentage (0-100)
    pub load_success_rate: f64,
}
