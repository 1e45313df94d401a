//! In-process request counters and system resource samples.
//!
//! Counters are lock-free atomics. Per-route stats and the sample ring sit
//! behind short-lived `std::sync::Mutex` guards that are never held across
//! an await point.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use handcoach_core::types::Timestamp;
use serde::Serialize;

/// Number of system samples retained.
pub const SAMPLE_CAPACITY: usize = 120;

/// One reading of host resources.
#[derive(Debug, Clone, Serialize)]
pub struct SystemSample {
    pub sampled_at: Timestamp,
    /// 1, 5 and 15 minute load averages.
    pub load_average: Option<[f64; 3]>,
    pub memory_total_kb: Option<u64>,
    pub memory_available_kb: Option<u64>,
    pub disk_total_bytes: Option<u64>,
    pub disk_free_bytes: Option<u64>,
}

#[derive(Debug, Default, Clone)]
struct RouteCounters {
    count: u64,
    errors: u64,
    total_latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct RouteMetrics {
    pub route: String,
    pub count: u64,
    pub errors: u64,
    pub avg_latency_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct StatusClassCounts {
    #[serde(rename = "2xx")]
    pub success: u64,
    #[serde(rename = "3xx")]
    pub redirect: u64,
    #[serde(rename = "4xx")]
    pub client_error: u64,
    #[serde(rename = "5xx")]
    pub server_error: u64,
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    /// Responses with a 5xx status.
    pub total_errors: u64,
    pub status_classes: StatusClassCounts,
    pub routes: Vec<RouteMetrics>,
}

/// Shared registry, one per process.
#[derive(Debug)]
pub struct MetricsRegistry {
    started_at: Instant,
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    /// Indexed by `status / 100 - 2` for 2xx..5xx.
    status_classes: [AtomicU64; 4],
    routes: Mutex<BTreeMap<String, RouteCounters>>,
    samples: Mutex<VecDeque<SystemSample>>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            status_classes: Default::default(),
            routes: Mutex::new(BTreeMap::new()),
            samples: Mutex::new(VecDeque::with_capacity(SAMPLE_CAPACITY)),
        }
    }

    /// Record one completed request. `route` is the matched route template
    /// prefixed by the method, e.g. `GET /api/v1/hands/{id}`.
    pub fn record_request(&self, route: &str, status: u16, latency: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let is_error = status >= 500;
        if is_error {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(class) = (status / 100).checked_sub(2).map(usize::from) {
            if let Some(counter) = self.status_classes.get(class) {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }

        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        let entry = routes.entry(route.to_string()).or_default();
        entry.count += 1;
        entry.total_latency_ms += latency.as_millis() as u64;
        if is_error {
            entry.errors += 1;
        }
    }

    pub fn push_sample(&self, sample: SystemSample) {
        let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        if samples.len() == SAMPLE_CAPACITY {
            samples.pop_front();
        }
        samples.push_back(sample);
    }

    /// Samples, oldest first.
    pub fn recent_samples(&self) -> Vec<SystemSample> {
        let samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        samples.iter().cloned().collect()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let class = |i: usize| self.status_classes[i].load(Ordering::Relaxed);
        let routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());

        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs(),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            total_errors: self.total_errors.load(Ordering::Relaxed),
            status_classes: StatusClassCounts {
                success: class(0),
                redirect: class(1),
                client_error: class(2),
                server_error: class(3),
            },
            routes: routes
                .iter()
                .map(|(route, c)| RouteMetrics {
                    route: route.clone(),
                    count: c.count,
                    errors: c.errors,
                    avg_latency_ms: if c.count == 0 {
                        0.0
                    } else {
                        c.total_latency_ms as f64 / c.count as f64
                    },
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn counts_by_status_class_and_route() {
        let metrics = MetricsRegistry::new();
        metrics.record_request("GET /health", 200, Duration::from_millis(4));
        metrics.record_request("GET /health", 200, Duration::from_millis(6));
        metrics.record_request("POST /api/v1/auth/login", 401, Duration::from_millis(20));
        metrics.record_request("POST /api/v1/auth/login", 503, Duration::from_millis(30));

        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 4);
        assert_eq!(snap.total_errors, 1);
        assert_eq!(snap.status_classes.success, 2);
        assert_eq!(snap.status_classes.client_error, 1);
        assert_eq!(snap.status_classes.server_error, 1);

        let health = snap.routes.iter().find(|r| r.route == "GET /health").unwrap();
        assert_eq!(health.count, 2);
        assert_eq!(health.avg_latency_ms, 5.0);
    }

    #[test]
    fn informational_status_is_not_classified() {
        let metrics = MetricsRegistry::new();
        metrics.record_request("GET /x", 101, Duration::ZERO);
        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 1);
        assert_eq!(snap.status_classes.success, 0);
    }

    #[test]
    fn sample_ring_is_bounded() {
        let metrics = MetricsRegistry::new();
        for _ in 0..SAMPLE_CAPACITY + 10 {
            metrics.push_sample(SystemSample {
                sampled_at: Utc::now(),
                load_average: None,
                memory_total_kb: None,
                memory_available_kb: None,
                disk_total_bytes: None,
                disk_free_bytes: None,
            });
        }
        assert_eq!(metrics.recent_samples().len(), SAMPLE_CAPACITY);
    }
}
