//! Per-request logging and `x-request-id` handling.

use axum::{
    extract::Request,
    http::{header::CONTENT_LENGTH, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

fn request_id(request: &Request) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Completion message for a status class.
fn outcome(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "request completed with error"
    } else if status.is_client_error() {
        "request completed with client error"
    } else {
        "request completed successfully"
    }
}

pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let req_id = request_id(&request);
    // Uploads dominate request size; worth having next to the timing.
    let body_bytes = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    tracing::info!(
        request_id = %req_id,
        method = %method,
        uri = %uri,
        body_bytes,
        "incoming request"
    );

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status();
    let message = outcome(status);

    if status.is_server_error() {
        tracing::error!(
            request_id = %req_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms,
            "{}",
            message
        );
    } else if status.is_client_error() {
        tracing::warn!(
            request_id = %req_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms,
            "{}",
            message
        );
    } else {
        tracing::info!(
            request_id = %req_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms,
            "{}",
            message
        );
    }

    response
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_by_status_class() {
        assert_eq!(outcome(StatusCode::BAD_GATEWAY), "request completed with error");
        assert_eq!(outcome(StatusCode::FORBIDDEN), "request completed with client error");
        assert_eq!(outcome(StatusCode::CREATED), "request completed successfully");
    }
}
