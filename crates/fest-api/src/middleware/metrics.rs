//! # Request Metrics
//!
//! Counts requests and accumulates latency per route/method/status, and
//! renders everything in Prometheus text exposition format for `/metrics`.
//! Counters live in-process; domain gauges (teams, events) are computed at
//! scrape time from the stores.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::RwLock;

#[derive(Debug, Default, Clone)]
struct RouteStats {
    count: u64,
    latency_seconds_sum: f64,
}

/// Shared request counters, keyed by (method, route template, status).
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    requests: Arc<RwLock<HashMap<(String, String, u16), RouteStats>>>,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, method: &str, route: &str, status: u16, elapsed_secs: f64) {
        let mut guard = self.requests.write();
        let stats = guard
            .entry((method.to_string(), route.to_string(), status))
            .or_default();
        stats.count += 1;
        stats.latency_seconds_sum += elapsed_secs;
    }

    /// Render the request counters in Prometheus text exposition format.
    /// Output is sorted so scrapes are stable.
    pub fn render(&self) -> String {
        let guard = self.requests.read();
        let mut entries: Vec<_> = guard.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut out = String::new();
        out.push_str("# HELP fest_http_requests_total Total HTTP requests handled.\n");
        out.push_str("# TYPE fest_http_requests_total counter\n");
        for ((method, route, status), stats) in &entries {
            out.push_str(&format!(
                "fest_http_requests_total{{method=\"{method}\",route=\"{route}\",status=\"{status}\"}} {}\n",
                stats.count
            ));
        }
        out.push_str("# HELP fest_http_request_seconds_sum Cumulative request latency.\n");
        out.push_str("# TYPE fest_http_request_seconds_sum counter\n");
        for ((method, route, status), stats) in &entries {
            out.push_str(&format!(
                "fest_http_request_seconds_sum{{method=\"{method}\",route=\"{route}\",status=\"{status}\"}} {:.6}\n",
                stats.latency_seconds_sum
            ));
        }
        out
    }
}

/// Middleware recording one sample per request.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    // Use the matched route template, not the raw path, so ids don't
    // explode label cardinality.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let start = Instant::now();
    let response = next.run(request).await;

    if let Some(metrics) = metrics {
        metrics.record(
            &method,
            &route,
            response.status().as_u16(),
            start.elapsed().as_secs_f64(),
        );
    }
    response
}
