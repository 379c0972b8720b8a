use axum::{
    extract::{MatchedPath, Request},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::TraceContextExt;
use std::{sync::Arc, time::Instant};
use tracing::{debug, error, info, instrument, warn, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::Metrics;

/// Per-request span, access log and HTTP metrics.
///
/// Routes are labelled by their matched pattern (`/api/orders/:session_id`)
/// so session ids never end up as metric labels.
pub async fn observability_middleware(
    metrics: Arc<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let client = client_address(request.headers());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let span_name = format!("{} {}", method, route);
    let span = tracing::info_span!(
        target: "robobar::http",
        "{}", span_name,
        otel.name = %span_name,
        otel.kind = "server",
        http.method = %method,
        http.route = %route,
        http.user_agent = %user_agent,
        client.address = %client,
        http.response.status_code = tracing::field::Empty,
        http.response_time_ms = tracing::field::Empty,
    );

    async move {
        metrics.increment_in_flight(&method, &route);

        let current = tracing::Span::current();
        let trace_id = current.context().span().span_context().trace_id().to_string();
        debug!(trace_id = %trace_id, method = %method, route = %route, client = %client, "Request received");

        let response = next.run(request).await;

        let elapsed = start_time.elapsed();
        let status = response.status();
        let status_code = status.as_u16();

        current.record("http.response.status_code", status_code);
        current.record("http.response_time_ms", elapsed.as_millis());
        if status.is_server_error() {
            current
                .context()
                .span()
                .set_status(opentelemetry::trace::Status::error("server error"));
        }

        metrics.record_http_request(&method, &route, status_code, elapsed.as_secs_f64());
        metrics.decrement_in_flight(&method, &route);

        let duration_ms = elapsed.as_millis();
        if status.is_server_error() {
            error!(trace_id = %trace_id, method = %method, route = %route, status_code, duration_ms, "Request failed");
        } else if status.is_client_error() {
            warn!(trace_id = %trace_id, method = %method, route = %route, status_code, duration_ms, "Request rejected");
        } else {
            info!(trace_id = %trace_id, method = %method, route = %route, status_code, duration_ms, "Request completed");
        }

        response
    }
    .instrument(span)
    .await
}

/// Best-effort client address from proxy headers
pub fn client_address(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|value| value.to_str().ok()))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Tracing and metrics for order workflow operations
pub struct BusinessTracingMiddleware {
    metrics: Arc<Metrics>,
}

impl BusinessTracingMiddleware {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    /// Trace an order operation
    #[instrument(skip_all, fields(
        operation = %operation,
        session_id = session_id,
    ))]
    pub async fn trace_order_operation<F, T, E>(
        &self,
        operation: &str,
        session_id: Option<&str>,
        future: F,
    ) -> Result<T, E>
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let start_time = Instant::now();

        debug!("Starting order operation");

        match future.await {
            Ok(result) => {
                self.metrics.record_order_operation(operation, true);

                info!(
                    duration_ms = start_time.elapsed().as_millis(),
                    "Order operation completed successfully"
                );

                Ok(result)
            }
            Err(error) => {
                self.metrics.record_order_operation(operation, false);

                warn!(
                    error = %error,
                    duration_ms = start_time.elapsed().as_millis(),
                    "Order operation failed"
                );

                Err(error)
            }
        }
    }
}
