//! Prometheus metrics for cache and snapshot activity.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Metric names.
pub mod names {
    /// Lookups served from the cache.
    pub const CACHE_HITS_TOTAL: &str = "polyglot_cache_hits_total";
    /// Lookups that fell through to a fetch.
    pub const CACHE_MISSES_TOTAL: &str = "polyglot_cache_misses_total";
    /// Background refreshes started.
    pub const REFRESH_SCHEDULED_TOTAL: &str = "polyglot_refresh_scheduled_total";
    /// Background refreshes skipped because one was already running.
    pub const REFRESH_SKIPPED_TOTAL: &str = "polyglot_refresh_skipped_total";
    /// Background refreshes that failed.
    pub const REFRESH_FAILED_TOTAL: &str = "polyglot_refresh_failed_total";
    /// Duration of upstream or storage fetches in seconds.
    pub const UPSTREAM_FETCH_SECONDS: &str = "polyglot_upstream_fetch_seconds";
    /// Finished snapshot jobs.
    pub const SNAPSHOT_JOBS_TOTAL: &str = "polyglot_snapshot_jobs_total";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Total number of cache hits");
    describe_counter!(names::CACHE_MISSES_TOTAL, "Total number of cache misses");
    describe_counter!(
        names::REFRESH_SCHEDULED_TOTAL,
        "Total number of background refreshes started"
    );
    describe_counter!(
        names::REFRESH_SKIPPED_TOTAL,
        "Total number of background refreshes skipped while another was in flight"
    );
    describe_counter!(
        names::REFRESH_FAILED_TOTAL,
        "Total number of background refreshes that failed"
    );
    describe_histogram!(
        names::UPSTREAM_FETCH_SECONDS,
        "Translation fetch duration in seconds"
    );
    describe_counter!(
        names::SNAPSHOT_JOBS_TOTAL,
        "Total number of finished snapshot jobs"
    );
}

/// Metrics recorder for the translation and version services.
#[derive(Clone)]
pub struct TranslationMetrics;

impl TranslationMetrics {
    pub fn cache_hit(backend: &'static str) {
        counter!(names::CACHE_HITS_TOTAL, "backend" => backend).increment(1);
    }

    pub fn cache_miss(backend: &'static str) {
        counter!(names::CACHE_MISSES_TOTAL, "backend" => backend).increment(1);
    }

    pub fn refresh_scheduled() {
        counter!(names::REFRESH_SCHEDULED_TOTAL).increment(1);
    }

    pub fn refresh_skipped() {
        counter!(names::REFRESH_SKIPPED_TOTAL).increment(1);
    }

    pub fn refresh_failed() {
        counter!(names::REFRESH_FAILED_TOTAL).increment(1);
    }

    /// Record one fetch from `source` (`upstream` or `storage`).
    pub fn fetch(source: &'static str, duration: Duration, success: bool) {
        histogram!(
            names::UPSTREAM_FETCH_SECONDS,
            "source" => source,
            "status" => if success { "success" } else { "error" }
        )
        .record(duration.as_secs_f64());
    }

    /// Record a finished snapshot job.
    pub fn snapshot_job(status: &'static str) {
        counter!(names::SNAPSHOT_JOBS_TOTAL, "status" => status).increment(1);
    }
}
