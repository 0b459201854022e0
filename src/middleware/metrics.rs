use dashmap::DashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

#[derive(Default)]
struct OperationStats {
    count: AtomicU64,
    latency_ns: AtomicU64,
}

/// Middleware for collecting Prometheus-compatible metrics
///
/// All counters use atomic operations; per-operation series live in a
/// `DashMap` keyed by `(handler name, success)`, so recording never takes a
/// global lock.
///
/// Metrics collected:
/// - Total request count
/// - Error count (responses with status >= 400)
/// - Average latency
/// - Request duration sum and count per operation and outcome
/// - Top-level request count (`/health`, `/metrics`)
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    error_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    top_level_requests: AtomicUsize,
    operations: DashMap<(String, bool), OperationStats>,
}

impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self {
            request_count: AtomicUsize::new(0),
            error_count: AtomicUsize::new(0),
            total_latency_ns: AtomicU64::new(0),
            top_level_requests: AtomicUsize::new(0),
            operations: DashMap::new(),
        }
    }
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Number of responses with a 4xx or 5xx status
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Calculate the average request latency
    ///
    /// Returns zero duration if no requests have been processed yet.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = u64::try_from(self.request_count.load(Ordering::Relaxed)).unwrap_or(u64::MAX);
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Number of requests recorded for `handler` with the given outcome.
    #[must_use]
    pub fn operation_count(&self, handler: &str, success: bool) -> u64 {
        self.operations
            .get(&(handler.to_string(), success))
            .map_or(0, |s| s.count.load(Ordering::Relaxed))
    }

    /// Increment the top-level request counter
    ///
    /// Call this for infrastructure endpoints like `/health` and `/metrics`
    /// that don't go through the dispatcher.
    pub fn inc_top_level_request(&self) {
        self.top_level_requests.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn top_level_request_count(&self) -> usize {
        self.top_level_requests.load(Ordering::Relaxed)
    }

    /// Render every series in the Prometheus text exposition format.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(1024);
        let _ = write!(
            out,
            "# HELP addsvc_requests_total Total number of dispatched requests\n\
             # TYPE addsvc_requests_total counter\n\
             addsvc_requests_total {}\n\
             # HELP addsvc_request_errors_total Requests answered with a 4xx or 5xx status\n\
             # TYPE addsvc_request_errors_total counter\n\
             addsvc_request_errors_total {}\n\
             # HELP addsvc_request_latency_seconds Average request latency in seconds\n\
             # TYPE addsvc_request_latency_seconds gauge\n\
             addsvc_request_latency_seconds {}\n\
             # HELP addsvc_top_level_requests_total Requests served outside the dispatcher\n\
             # TYPE addsvc_top_level_requests_total counter\n\
             addsvc_top_level_requests_total {}\n",
            self.request_count(),
            self.error_count(),
            self.average_latency().as_secs_f64(),
            self.top_level_request_count(),
        );

        let mut series: Vec<(String, bool, u64, u64)> = self
            .operations
            .iter()
            .map(|entry| {
                let (name, success) = entry.key();
                (
                    name.clone(),
                    *success,
                    entry.value().count.load(Ordering::Relaxed),
                    entry.value().latency_ns.load(Ordering::Relaxed),
                )
            })
            .collect();
        series.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));

        out.push_str(
            "# HELP addsvc_request_duration_seconds Request duration in seconds\n\
             # TYPE addsvc_request_duration_seconds summary\n",
        );
        for (name, success, count, latency_ns) in &series {
            let seconds = Duration::from_nanos(*latency_ns).as_secs_f64();
            let _ = writeln!(
                out,
                "addsvc_request_duration_seconds_sum{{method=\"{name}\",success=\"{success}\"}} {seconds}"
            );
            let _ = writeln!(
                out,
                "addsvc_request_duration_seconds_count{{method=\"{name}\",success=\"{success}\"}} {count}"
            );
        }
        out
    }
}

impl Middleware for MetricsMiddleware {
    fn before(&self, _req: &mut HandlerRequest) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    fn after(&self, req: &HandlerRequest, res: &HandlerResponse, latency: Duration) {
        let latency_ns = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.total_latency_ns.fetch_add(latency_ns, Ordering::Relaxed);
        let success = res.status < 400;
        if !success {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        let stats = self
            .operations
            .entry((req.handler_name.clone(), success))
            .or_default();
        stats.count.fetch_add(1, Ordering::Relaxed);
        stats.latency_ns.fetch_add(latency_ns, Ordering::Relaxed);
    }
}
