//! Prometheus collectors for the inventory API.
//!
//! All collectors live in one [`InventoryMetrics`] registered on the default
//! registry the first time it is touched. If registration fails the API keeps
//! serving and recording becomes a no-op.

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use inventory_common::InventoryError;
use inventory_common::models::AuditAction;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, TextEncoder};
use std::sync::OnceLock;
use std::time::Instant;

const NAMESPACE: &str = "inventory";

/// Label used for requests that reached no route (static files, 404s).
const UNMATCHED_PATH: &str = "<unmatched>";

struct InventoryMetrics {
    requests: IntCounterVec,
    latency: HistogramVec,
    audit_writes: IntCounterVec,
    audit_write_failures: IntCounter,
}

impl InventoryMetrics {
    fn register() -> Result<Self, prometheus::Error> {
        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests served").namespace(NAMESPACE),
            &["method", "path", "status"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .namespace(NAMESPACE),
            &["method", "path"],
        )?;
        let audit_writes = IntCounterVec::new(
            Opts::new("audit_writes_total", "bitacora rows written by the API")
                .namespace(NAMESPACE),
            &["accion"],
        )?;
        let audit_write_failures = IntCounter::with_opts(
            Opts::new(
                "audit_write_failures_total",
                "bitacora rows that failed to write",
            )
            .namespace(NAMESPACE),
        )?;

        let registry = prometheus::default_registry();
        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency.clone()))?;
        registry.register(Box::new(audit_writes.clone()))?;
        registry.register(Box::new(audit_write_failures.clone()))?;

        Ok(Self {
            requests,
            latency,
            audit_writes,
            audit_write_failures,
        })
    }
}

fn collectors() -> Option<&'static InventoryMetrics> {
    static METRICS: OnceLock<Option<InventoryMetrics>> = OnceLock::new();
    METRICS
        .get_or_init(|| match InventoryMetrics::register() {
            Ok(metrics) => Some(metrics),
            Err(err) => {
                tracing::warn!(error = %err, "metrics registration failed");
                None
            }
        })
        .as_ref()
}

pub fn inc_audit_write(accion: AuditAction) {
    if let Some(metrics) = collectors() {
        metrics
            .audit_writes
            .with_label_values(&[accion.as_str()])
            .inc();
    }
}

pub fn inc_audit_write_failure() {
    if let Some(metrics) = collectors() {
        metrics.audit_write_failures.inc();
    }
}

/// Records count and latency per matched route template.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned());

    let started = Instant::now();
    let response = next.run(req).await;

    if let Some(metrics) = collectors() {
        let path = path.as_deref().unwrap_or(UNMATCHED_PATH);
        metrics
            .requests
            .with_label_values(&[method.as_str(), path, response.status().as_str()])
            .inc();
        metrics
            .latency
            .with_label_values(&[method.as_str(), path])
            .observe(started.elapsed().as_secs_f64());
    }
    response
}

/// Text exposition of the default registry.
pub fn render_metrics() -> Result<Response, InventoryError> {
    // make sure our collectors show up even before the first request
    let _ = collectors();
    let encoder = TextEncoder::new();
    let body = encoder
        .encode_to_string(&prometheus::gather())
        .map_err(|err| InventoryError::Internal(err.into()))?;
    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_owned())], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn rendered_metrics_include_audit_counters() {
        inc_audit_write(AuditAction::Insert);
        inc_audit_write_failure();

        let response = render_metrics().unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("inventory_audit_writes_total{accion=\"INSERT\"}"));
        assert!(text.contains("inventory_audit_write_failures_total"));
    }

    #[test]
    fn collectors_register_once() {
        let first = collectors().map(|m| m as *const InventoryMetrics);
        let second = collectors().map(|m| m as *const InventoryMetrics);
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
