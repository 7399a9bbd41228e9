//! Request ID middleware for correlating logs with requests.
//!
//! Each request runs inside a tracing span carrying a request ID. An ID supplied
//! by an upstream proxy in `x-request-id` is reused; otherwise a UUID v4 is
//! generated. The ID is echoed back on the response.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use http::header::{HeaderName, HeaderValue};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest inbound ID accepted before a fresh one is generated
const MAX_REQUEST_ID_LEN: usize = 128;

fn inbound_request_id(request: &Request) -> Option<String> {
    let value = request.headers().get(&REQUEST_ID_HEADER)?.to_str().ok()?;
    let value = value.trim();
    (!value.is_empty() && value.len() <= MAX_REQUEST_ID_LEN).then(|| value.to_string())
}

/// Outermost layer: wraps all request processing in a span.
pub async fn request_id_layer(request: Request, next: Next) -> Response {
    let request_id =
        inbound_request_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        duration_ms = tracing::field::Empty,
    );

    let start = Instant::now();

    async move {
        let mut response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response
                .headers_mut()
                .insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(header: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/health");
        if let Some(value) = header {
            builder = builder.header("x-request-id", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_inbound_id_is_reused() {
        let request = request_with(Some("abc-123"));
        assert_eq!(inbound_request_id(&request).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_missing_or_blank_id_is_ignored() {
        assert_eq!(inbound_request_id(&request_with(None)), None);
        assert_eq!(inbound_request_id(&request_with(Some("  "))), None);
    }

    #[test]
    fn test_oversized_id_is_ignored() {
        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        assert_eq!(inbound_request_id(&request_with(Some(&long))), None);
    }
}
