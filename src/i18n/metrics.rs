//! Bundle loading metrics.
//!
//! Tracks how often bundles were served in the requested language, served
//! from the default-language fallback, missing entirely, or unreadable.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

#[derive(Debug, Default)]
pub struct BundleMetrics {
    /// Namespaces loaded in the requested language
    loads: AtomicUsize,

    /// Namespaces served from the default language instead
    fallbacks: AtomicUsize,

    /// Namespaces with no bundle in any language
    missing: AtomicUsize,

    /// Bundle reads that failed (I/O, HTTP, malformed JSON)
    errors: AtomicUsize,
}

/// Global metrics instance (initialized lazily)
static METRICS: OnceLock<BundleMetrics> = OnceLock::new();

impl BundleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the process-wide metrics instance.
    pub fn global() -> &'static BundleMetrics {
        METRICS.get_or_init(BundleMetrics::new)
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing(&self) {
        self.missing.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let loads = self.loads.load(Ordering::Relaxed);
        let fallbacks = self.fallbacks.load(Ordering::Relaxed);
        let missing = self.missing.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);

        let requests = loads + fallbacks + missing;
        let fallback_rate = if requests > 0 {
            (fallbacks as f64 / requests as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            loads,
            fallbacks,
            missing,
            errors,
            fallback_rate,
        }
    }
}

/// Snapshot of bundle loading statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub loads: usize,
    pub fallbacks: usize,
    pub missing: usize,
    pub errors: usize,

    /// Share of namespace requests served by the default language, in percent
    pub fallback_rate: f64,
}
