use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::TraceContextExt;
use std::{sync::Arc, time::Instant};
use tracing::{error, info, instrument, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::Metrics;

/// Endpoint label used for requests that no route matched (static files, 404s)
const UNMATCHED_ENDPOINT: &str = "static";

/// Outermost request stage: one span per request, request metrics, and a
/// completion log line.
pub async fn observability_middleware(
    metrics: Arc<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let uri = request.uri().to_string();

    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
        })
        .unwrap_or("unknown")
        .trim()
        .to_string();

    // Matched route keeps the metric label cardinality bounded
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string());

    let span_name = format!("{} {}", method, endpoint);

    let span = tracing::info_span!(
        target: "petlisting_rs::http",
        "{}", span_name,
        otel.name = %span_name,
        otel.kind = "server",
        http.method = %method,
        http.route = %endpoint,
        http.url = %uri,
        http.user_agent = %user_agent,
        client.address = %client_ip,
        http.response.status_code = tracing::field::Empty,
        http.response_time_ms = tracing::field::Empty,
    );

    async {
        metrics.increment_in_flight(&method, &endpoint);

        crate::info_with_trace!(method = %method, path = %uri, user_agent = %user_agent, client_ip = %client_ip, "Processing request");

        let response = next.run(request).await;

        let duration = start_time.elapsed();
        let duration_ms = duration.as_millis();
        let status_code = response.status().as_u16();

        let current_span = tracing::Span::current();
        current_span.record("http.response.status_code", status_code);
        current_span.record("http.response_time_ms", duration_ms);

        let span_context = current_span.context();
        let otel_span = span_context.span();
        if status_code >= 500 {
            otel_span.set_status(opentelemetry::trace::Status::error("HTTP error"));
        } else {
            otel_span.set_status(opentelemetry::trace::Status::Ok);
        }

        metrics.record_http_request(&method, &endpoint, status_code, duration.as_secs_f64());
        metrics.decrement_in_flight(&method, &endpoint);

        if status_code >= 500 {
            crate::error_with_trace!(
                method = %method,
                path = %uri,
                status_code = status_code,
                duration_ms = duration_ms,
                "Request completed with error"
            );
        } else {
            crate::info_with_trace!(
                method = %method,
                path = %uri,
                status_code = status_code,
                duration_ms = duration_ms,
                "Request completed"
            );
        }

        response
    }
    .instrument(span)
    .await
}

/// Wraps pet store operations with a span, a log line and store metrics
#[derive(Clone)]
pub struct StoreTracing {
    metrics: Arc<Metrics>,
}

impl StoreTracing {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    /// Trace a pet store operation
    #[instrument(skip_all, fields(operation = %operation, pet_id = pet_id))]
    pub async fn trace_pet_operation<F, T, E>(
        &self,
        operation: &str,
        pet_id: Option<i64>,
        future: F,
    ) -> Result<T, E>
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let start_time = Instant::now();

        match future.await {
            Ok(result) => {
                self.metrics.record_pet_operation(
                    operation,
                    true,
                    start_time.elapsed().as_secs_f64(),
                );

                info!(
                    duration_us = start_time.elapsed().as_micros(),
                    "Pet operation completed"
                );

                Ok(result)
            }
            Err(error) => {
                self.metrics.record_pet_operation(
                    operation,
                    false,
                    start_time.elapsed().as_secs_f64(),
                );

                error!(
                    error = %error,
                    duration_us = start_time.elapsed().as_micros(),
                    "Pet operation failed"
                );

                Err(error)
            }
        }
    }

    /// Publish the current collection size
    pub fn record_store_size(&self, count: usize) {
        self.metrics.set_pets_in_store(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn test_handler() -> &'static str {
        "test response"
    }

    async fn error_handler() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn app_with(metrics: Arc<Metrics>, router: Router) -> Router {
        router.layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics.clone(), req, next)
        }))
    }

    #[tokio::test]
    async fn test_observability_middleware_success() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let app = app_with(metrics.clone(), Router::new().route("/test", get(test_handler)));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .header("user-agent", "test-client/1.0")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("http_requests_total"));
        assert!(encoded.contains("endpoint=\"/test\""));
    }

    #[tokio::test]
    async fn test_observability_middleware_unmatched_route() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let app = app_with(metrics.clone(), Router::new().route("/test", get(test_handler)));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/1700000000000-dog.png")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("endpoint=\"static\""));
        assert!(!encoded.contains("1700000000000-dog.png"));
    }

    #[tokio::test]
    async fn test_observability_middleware_error() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let app = app_with(metrics.clone(), Router::new().route("/error", get(error_handler)));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/error")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("status_code=\"500\""));
    }

    #[tokio::test]
    async fn test_store_tracing() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let tracing = StoreTracing::new(metrics.clone());

        let result = tracing
            .trace_pet_operation("get", Some(1), async { Ok::<_, String>("found") })
            .await;
        assert!(result.is_ok());

        let result = tracing
            .trace_pet_operation("update", Some(2), async { Err::<String, _>("boom") })
            .await;
        assert!(result.is_err());

        tracing.record_store_size(3);

        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("pet_operations_total{operation=\"get\",status=\"success\"} 1"));
        assert!(encoded.contains("pet_operations_total{operation=\"update\",status=\"error\"} 1"));
        assert!(encoded.contains("pets_in_store 3"));
    }
}
