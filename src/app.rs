use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{
    api, cors_middleware, health_check, metrics_handler, request_validation_middleware,
    security_headers_middleware,
};
use crate::observability::{observability_middleware, Metrics};
use crate::services::OrderService;

/// Limits applied to every request
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub timeout: Duration,
    pub max_request_size: usize,
}

/// Build the full application router
pub fn create_app(
    order_service: Arc<OrderService>,
    metrics: Arc<Metrics>,
    limits: RequestLimits,
) -> Router {
    let metrics_for_middleware = metrics.clone();
    let max_request_size = limits.max_request_size;

    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .merge(api::create_api_router(order_service))
        // Outermost layer is added last
        .layer(TimeoutLayer::new(limits.timeout))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(move |req, next| {
            request_validation_middleware(max_request_size, req, next)
        }))
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
