use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{Json, Response},
};
use serde_json::{json, Value};
use tracing::{error, warn};

type Rejection = (StatusCode, Json<Value>);

const ACCEPTED_CONTENT_TYPES: [&str; 2] = [
    "application/json",
    "application/x-www-form-urlencoded",
];

/// Reject oversized bodies and unsupported payloads before they reach a handler.
///
/// Bodies are optional on every endpoint, so a request without a
/// content type is let through. JSON and form posts are accepted.
pub async fn request_validation_middleware(
    max_request_size: usize,
    request: Request<Body>,
    next: Next,
) -> Result<Response, Rejection> {
    validate_content_type(&request)?;
    validate_request_size(&request, max_request_size)?;

    Ok(next.run(request).await)
}

fn validate_content_type(request: &Request<Body>) -> Result<(), Rejection> {
    let Some(content_type) = request.headers().get(header::CONTENT_TYPE) else {
        return Ok(());
    };

    let content_type = content_type.to_str().unwrap_or("");
    if ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| content_type.starts_with(accepted))
    {
        return Ok(());
    }

    warn!("Invalid content type: {}", content_type);
    Err(rejection(
        StatusCode::UNSUPPORTED_MEDIA_TYPE,
        "Unsupported media type",
        "Content-Type must be application/json or application/x-www-form-urlencoded".to_string(),
    ))
}

fn validate_request_size(request: &Request<Body>, max_request_size: usize) -> Result<(), Rejection> {
    let length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());

    match length {
        Some(length) if length > max_request_size => {
            error!("Request too large: {} bytes", length);
            Err(rejection(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request too large",
                format!(
                    "Request size {} bytes exceeds maximum of {} bytes",
                    length, max_request_size
                ),
            ))
        }
        _ => Ok(()),
    }
}

fn rejection(status: StatusCode, error: &str, message: String) -> Rejection {
    (
        status,
        Json(json!({
            "error": error,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// Allow browser clients from any origin
pub async fn cors_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    insert_static_headers(
        &mut response,
        &[
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, DELETE, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            (header::ACCESS_CONTROL_MAX_AGE, "86400"),
        ],
    );

    response
}

pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    insert_static_headers(
        &mut response,
        &[
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            (header::X_FRAME_OPTIONS, "DENY"),
            (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
            (header::CONTENT_SECURITY_POLICY, "default-src 'self'"),
            (header::CACHE_CONTROL, "no-store"),
        ],
    );

    response
}

fn insert_static_headers(response: &mut Response, headers: &[(HeaderName, &'static str)]) {
    let target = response.headers_mut();
    for (name, value) in headers {
        target.insert(name.clone(), HeaderValue::from_static(*value));
    }
}
