use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{Json, Response},
};
use serde_json::{json, Value};
use tracing::warn;

/// Body types the API accepts
const ACCEPTED_CONTENT_TYPES: [&str; 2] = ["application/json", "multipart/form-data"];

/// Paths whose handler decides what to do with any body type
const CONTENT_TYPE_EXEMPT_PATHS: [&str; 1] = ["/api/upload"];

/// Reject requests with an unsupported body type or an oversized declared length
/// before they reach a handler.
pub async fn request_validation_middleware(
    max_request_size: usize,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<Value>)> {
    validate_content_type(&request)?;
    validate_request_size(&request, max_request_size)?;

    Ok(next.run(request).await)
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

fn validate_content_type(request: &Request) -> Result<(), (StatusCode, Json<Value>)> {
    if !carries_body(request.method())
        || CONTENT_TYPE_EXEMPT_PATHS.contains(&request.uri().path())
    {
        return Ok(());
    }

    let Some(content_type) = request.headers().get(header::CONTENT_TYPE) else {
        warn!("Missing content type header");
        return Err(rejection(
            StatusCode::BAD_REQUEST,
            "Missing content type",
            "Content-Type header is required for requests with body".to_string(),
        ));
    };

    let content_type = content_type.to_str().unwrap_or_default();
    let accepted = ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| content_type.starts_with(accepted));

    if !accepted {
        warn!("Invalid content type: {}", content_type);
        return Err(rejection(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported media type",
            "Content-Type must be application/json or multipart/form-data".to_string(),
        ));
    }

    Ok(())
}

fn validate_request_size(
    request: &Request,
    max_request_size: usize,
) -> Result<(), (StatusCode, Json<Value>)> {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    match declared {
        Some(length) if length > max_request_size as u64 => {
            warn!("Request too large: {} bytes", length);
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

fn rejection(status: StatusCode, error: &str, message: String) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "error": error,
            "message": message,
        })),
    )
}

/// Add security headers to every response
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("X-XSS-Protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'self'"),
    );

    response
}
