//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};
use serde_json::Value;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// Password fields in JSON request bodies are redacted before logging.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_text) = extract_parts_and_body_text_from_request(request).await;

    let is_json = parts.headers.get(CONTENT_TYPE).is_some_and(|content_type| {
        content_type
            .to_str()
            .is_ok_and(|value| value.starts_with("application/json"))
    });

    if is_json {
        log_request(&parts, &redact_passwords(&body_text));
    } else {
        log_request(&parts, &body_text);
    }

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body_text) = extract_parts_and_body_text_from_response(response).await;
    log_response(&parts, &body_text);

    Response::from_parts(parts, body_text.into())
}

/// Replace the value of any top level JSON field whose name contains
/// "password" with asterisks.
///
/// Bodies that do not parse as JSON are returned unchanged.
fn redact_passwords(body_text: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_string();
    };

    if let Value::Object(ref mut fields) = value {
        for (key, field) in fields.iter_mut() {
            if key.to_lowercase().contains("password") {
                *field = Value::String("********".to_string());
            }
        }
    }

    value.to_string()
}

async fn extract_parts_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_parts_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

/// The number of body bytes to include in `info` level logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {:}...",
            parts.method,
            parts.uri,
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {:}...",
            parts.status,
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}

#[cfg(test)]
mod redact_password_tests {
    use super::redact_passwords;

    #[test]
    fn redacts_password_fields() {
        let body = r#"{"email":"foo@bar.baz","password":"hunter2"}"#;

        let redacted = redact_passwords(body);

        assert!(!redacted.contains("hunter2"), "got: {redacted}");
        assert!(redacted.contains("foo@bar.baz"));
    }

    #[test]
    fn redacts_camel_case_password_fields() {
        let body = r#"{"currentPassword":"hunter2","newPassword":"hunter3"}"#;

        let redacted = redact_passwords(body);

        assert!(!redacted.contains("hunter2"), "got: {redacted}");
        assert!(!redacted.contains("hunter3"), "got: {redacted}");
    }

    #[test]
    fn leaves_non_json_bodies_alone() {
        let body = "password=hunter2";

        assert_eq!(redact_passwords(body), body);
    }
}
