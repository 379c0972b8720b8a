use axum::{
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::{header, StatusCode},
    response::Json,
    routing::{get, post},
    Form, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::models::{
    CatalogResponse, OrderResponse, RepositoryError, ServiceError, SubmitOrderRequest,
    WorkflowResponse,
};
use crate::services::OrderService;

/// Shared application state for the ordering endpoints
#[derive(Clone)]
pub struct ApiState {
    pub order_service: Arc<OrderService>,
}

type ApiError = (StatusCode, Json<Value>);

/// Create API router with all ordering endpoints
pub fn create_api_router(order_service: Arc<OrderService>) -> Router {
    let state = ApiState { order_service };

    Router::new()
        .route("/api/drinks", get(list_drinks))
        .route("/api/orders", post(open_session))
        .route(
            "/api/orders/:session_id",
            get(get_order).delete(end_session),
        )
        .route("/api/orders/:session_id/place", post(place_order))
        .route(
            "/api/orders/:session_id/drinks/:drink_id/increment",
            post(increment_drink),
        )
        .route(
            "/api/orders/:session_id/drinks/:drink_id/decrement",
            post(decrement_drink),
        )
        .route("/api/orders/:session_id/review", get(review_order))
        .route("/api/orders/:session_id/cancel", post(cancel_order))
        .route("/api/orders/:session_id/submit", post(submit_order))
        .with_state(state)
}

/// The fixed drink catalog
#[instrument(name = "list_drinks", skip(state))]
pub async fn list_drinks(State(state): State<ApiState>) -> Json<CatalogResponse> {
    Json(state.order_service.catalog())
}

/// Open a new order session
#[instrument(name = "open_session", skip(state))]
pub async fn open_session(
    State(state): State<ApiState>,
) -> Result<(StatusCode, Json<WorkflowResponse>), ApiError> {
    match state.order_service.open_session().await {
        Ok(response) => {
            info!(session_id = %response.session_id(), "Order session created");
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(err) => {
            error!("Failed to open order session: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Show the current order
#[instrument(name = "get_order", skip(state), fields(session_id = %session_id))]
pub async fn get_order(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;

    state
        .order_service
        .get_order(session_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

/// Place-order entry on an existing session
#[instrument(name = "place_order", skip(state), fields(session_id = %session_id))]
pub async fn place_order(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;

    workflow_result(state.order_service.place_order(session_id).await)
}

#[instrument(name = "increment_drink", skip(state), fields(
    session_id = %session_id,
    drink_id = %drink_id,
))]
pub async fn increment_drink(
    State(state): State<ApiState>,
    Path((session_id, drink_id)): Path<(String, String)>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let drink_id = parse_drink_id(&drink_id)?;

    workflow_result(state.order_service.increment(session_id, drink_id).await)
}

#[instrument(name = "decrement_drink", skip(state), fields(
    session_id = %session_id,
    drink_id = %drink_id,
))]
pub async fn decrement_drink(
    State(state): State<ApiState>,
    Path((session_id, drink_id)): Path<(String, String)>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let drink_id = parse_drink_id(&drink_id)?;

    workflow_result(state.order_service.decrement(session_id, drink_id).await)
}

/// Review the order, or stay on place order when nothing is selected
#[instrument(name = "review_order", skip(state), fields(session_id = %session_id))]
pub async fn review_order(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;

    workflow_result(state.order_service.review(session_id).await)
}

#[instrument(name = "cancel_order", skip(state), fields(session_id = %session_id))]
pub async fn cancel_order(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;

    workflow_result(state.order_service.cancel(session_id).await)
}

/// Submit the order. The body is optional and an unusable body means no age.
#[instrument(name = "submit_order", skip(state, request), fields(session_id = %session_id))]
pub async fn submit_order(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    request: Request,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let age = submitted_age(request).await;

    crate::info_with_trace!(age_provided = age.is_some(), "Submitting order");

    workflow_result(state.order_service.submit(session_id, age).await)
}

/// End the session
#[instrument(name = "end_session", skip(state), fields(session_id = %session_id))]
pub async fn end_session(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(&session_id)?;

    match state.order_service.end_session(session_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(err) => {
            warn!("Failed to end session: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Age from a form post or a JSON body, with or without a JSON content type
async fn submitted_age(request: Request) -> Option<i32> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    let submission = if is_form {
        Form::<SubmitOrderRequest>::from_request(request, &())
            .await
            .ok()
            .map(|Form(submission)| submission)
    } else {
        let body = Bytes::from_request(request, &()).await.ok()?;
        serde_json::from_slice::<SubmitOrderRequest>(&body).ok()
    };

    submission.and_then(|submission| submission.age())
}

fn workflow_result(
    result: Result<WorkflowResponse, ServiceError>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    result.map(Json).map_err(|err| {
        warn!("Order operation failed: {}", err);
        service_error_to_response(err)
    })
}

fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        service_error_to_response(ServiceError::ValidationError {
            message: format!("Invalid session id: {}", raw),
        })
    })
}

fn parse_drink_id(raw: &str) -> Result<u32, ApiError> {
    raw.parse::<u32>().map_err(|_| {
        service_error_to_response(ServiceError::ValidationError {
            message: format!("Invalid drink id: {}", raw),
        })
    })
}

/// Convert service errors to HTTP responses
pub fn service_error_to_response(err: ServiceError) -> ApiError {
    let (status, message) = match err {
        ServiceError::SessionNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::OrderAlreadySubmitted { .. } => (StatusCode::CONFLICT, err.to_string()),
        ServiceError::ValidationError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::Repository { source } => match source {
            RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            RepositoryError::CapacityExceeded { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Too many open order sessions".to_string(),
            ),
        },
    };

    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
