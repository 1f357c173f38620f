use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::error_handler::AppError;

const REQUEST_ID: &str = "X-Request-Id";

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

/// Caller-supplied request id, if any.
fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Rejections the JSON extractor produces as plain text.
fn is_extractor_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE | StatusCode::UNPROCESSABLE_ENTITY
    )
}

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Rewrites plain-text extractor rejections into the flat `INVALID_REQUEST` body.
///
/// Responses that are already JSON (handler errors, `QUERY_FAILED`) pass
/// through untouched. Rejections always leave as 400 and echo the caller's
/// `X-Request-Id`.
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let req_id = request_id(req.headers());
    let res = next.run(req).await;
    if !is_extractor_rejection(res.status()) {
        return res;
    }

    let (parts, bytes) = take_body(res).await;
    if is_json(&parts) {
        return Response::from_parts(parts, bytes.into());
    }

    let original = String::from_utf8_lossy(&bytes);
    debug!(
        req_id = req_id.as_deref().unwrap_or("-"),
        status = %parts.status,
        rejection = %original.trim(),
        "request rejected"
    );

    let mut mapped = AppError::InvalidRequest(original.trim().to_string()).into_response();
    if let Some(id) = req_id.and_then(|v| HeaderValue::from_str(&v).ok()) {
        mapped.headers_mut().insert(REQUEST_ID, id);
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_extractor_statuses_are_mapped() {
        assert!(is_extractor_rejection(StatusCode::BAD_REQUEST));
        assert!(is_extractor_rejection(StatusCode::UNSUPPORTED_MEDIA_TYPE));
        assert!(is_extractor_rejection(StatusCode::UNPROCESSABLE_ENTITY));
        assert!(!is_extractor_rejection(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_extractor_rejection(StatusCode::OK));
    }

    #[test]
    fn request_id_comes_from_the_request() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), None);

        headers.insert(REQUEST_ID, HeaderValue::from_static("  "));
        assert_eq!(request_id(&headers), None);

        headers.insert(REQUEST_ID, HeaderValue::from_static(" abc-123 "));
        assert_eq!(request_id(&headers).as_deref(), Some("abc-123"));
    }
}
