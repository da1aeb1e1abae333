//! Request metrics for the inference service
//!
//! Lock-free counters shared by every handler, exported in Prometheus text
//! format on `GET /metrics`. Fallback encodings are counted here because the
//! prediction response deliberately does not report them.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Central metrics collector
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    /// Scored records plus rejected requests
    total_requests: Arc<AtomicUsize>,
    /// Records scored successfully
    successful_requests: Arc<AtomicUsize>,
    /// Requests or batch elements that failed
    failed_requests: Arc<AtomicUsize>,
    /// Categorical values encoded with the fallback code
    fallback_encodings: Arc<AtomicUsize>,
    /// Total scoring time in microseconds
    total_inference_time_us: Arc<AtomicU64>,
    /// Start time for rate calculations
    start_time: Instant,
}

impl MetricsCollector {
    /// Create a new metrics collector
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_requests: Arc::new(AtomicUsize::new(0)),
            successful_requests: Arc::new(AtomicUsize::new(0)),
            failed_requests: Arc::new(AtomicUsize::new(0)),
            fallback_encodings: Arc::new(AtomicUsize::new(0)),
            total_inference_time_us: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Record `count` successfully scored records
    #[allow(clippy::cast_possible_truncation)]
    pub fn record_success(&self, count: usize, fallbacks: usize, duration: Duration) {
        self.total_requests.fetch_add(count, Ordering::Relaxed);
        self.successful_requests.fetch_add(count, Ordering::Relaxed);
        self.fallback_encodings
            .fetch_add(fallbacks, Ordering::Relaxed);
        self.total_inference_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record `count` failures
    pub fn record_failures(&self, count: usize) {
        self.total_requests.fetch_add(count, Ordering::Relaxed);
        self.failed_requests.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a single failed request
    pub fn record_failure(&self) {
        self.record_failures(1);
    }

    /// Get current snapshot of metrics
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let successful = self.successful_requests.load(Ordering::Relaxed);
        let failed = self.failed_requests.load(Ordering::Relaxed);
        let fallback_encodings = self.fallback_encodings.load(Ordering::Relaxed);
        let total_time_us = self.total_inference_time_us.load(Ordering::Relaxed);
        let uptime = self.start_time.elapsed();

        MetricsSnapshot {
            total_requests,
            successful_requests: successful,
            failed_requests: failed,
            fallback_encodings,
            total_inference_time_us: total_time_us,
            uptime_secs: uptime.as_secs(),
            avg_latency_ms: if successful > 0 {
                (total_time_us as f64 / 1000.0) / successful as f64
            } else {
                0.0
            },
            error_rate: if total_requests > 0 {
                failed as f64 / total_requests as f64
            } else {
                0.0
            },
        }
    }

    /// Export metrics in Prometheus format
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            "# HELP aarogya_requests_total Records scored or rejected\n\
             # TYPE aarogya_requests_total counter\n\
             aarogya_requests_total {}\n\
             # HELP aarogya_requests_successful Records scored successfully\n\
             # TYPE aarogya_requests_successful counter\n\
             aarogya_requests_successful {}\n\
             # HELP aarogya_requests_failed Records rejected or failed\n\
             # TYPE aarogya_requests_failed counter\n\
             aarogya_requests_failed {}\n\
             # HELP aarogya_fallback_encodings_total Unseen categorical values encoded as code 0\n\
             # TYPE aarogya_fallback_encodings_total counter\n\
             aarogya_fallback_encodings_total {}\n\
             # HELP aarogya_inference_time_seconds Total scoring time\n\
             # TYPE aarogya_inference_time_seconds counter\n\
             aarogya_inference_time_seconds {:.6}\n\
             # HELP aarogya_avg_latency_ms Average scoring latency in milliseconds\n\
             # TYPE aarogya_avg_latency_ms gauge\n\
             aarogya_avg_latency_ms {:.2}\n\
             # HELP aarogya_error_rate Error rate (0.0-1.0)\n\
             # TYPE aarogya_error_rate gauge\n\
             aarogya_error_rate {:.4}\n\
             # HELP aarogya_uptime_seconds Uptime in seconds\n\
             # TYPE aarogya_uptime_seconds counter\n\
             aarogya_uptime_seconds {}\n",
            snapshot.total_requests,
            snapshot.successful_requests,
            snapshot.failed_requests,
            snapshot.fallback_encodings,
            snapshot.total_inference_time_us as f64 / 1_000_000.0,
            snapshot.avg_latency_ms,
            snapshot.error_rate,
            snapshot.uptime_secs
        )
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Records scored or rejected
    pub total_requests: usize,
    /// Records scored successfully
    pub successful_requests: usize,
    /// Records rejected or failed
    pub failed_requests: usize,
    /// Fallback encodings across all scored records
    pub fallback_encodings: usize,
    /// Total scoring time in microseconds
    pub total_inference_time_us: u64,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Average scoring latency in milliseconds
    pub avg_latency_ms: f64,
    /// Error rate as a fraction (0.0 to 1.0)
    pub error_rate: f64,
}
