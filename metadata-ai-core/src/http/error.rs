//! HTTP error mapping utilities

use super::RequestContext;
use crate::error::{AiSdkError, EntityKind, RETRYABLE_STATUS_CODES};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Map an HTTP status code and response body to an [`AiSdkError`]
///
/// `path` names the resource when the request carried no entity context.
pub fn map_http_error(
    status: StatusCode,
    headers: Option<&HeaderMap>,
    body: Option<String>,
    context: &RequestContext,
    path: &str,
    request_id: Uuid,
) -> AiSdkError {
    let name = context.name.clone().unwrap_or_else(|| path.to_string());

    match status {
        StatusCode::UNAUTHORIZED => AiSdkError::Authentication,

        StatusCode::FORBIDDEN => AiSdkError::NotEnabled {
            entity: context.entity,
            name,
        },

        StatusCode::NOT_FOUND => AiSdkError::NotFound {
            entity: context.entity,
            name,
        },

        StatusCode::TOO_MANY_REQUESTS => AiSdkError::RateLimited {
            retry_after: headers.and_then(retry_after_from_headers),
        },

        status => {
            let message = body
                .as_deref()
                .and_then(|b| serde_json::from_str::<Value>(b).ok())
                .and_then(|v| extract_error_message(&v))
                .or_else(|| {
                    body.as_deref()
                        .map(str::trim)
                        .filter(|b| !b.is_empty())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

            let retry_after = if RETRYABLE_STATUS_CODES.contains(&status.as_u16()) {
                headers.and_then(retry_after_from_headers)
            } else {
                None
            };

            AiSdkError::ExecutionFailure {
                status: Some(status.as_u16()),
                message: format!("{} [request_id: {}]", message, request_id),
                agent: match context.entity {
                    EntityKind::Agent => context.name.clone(),
                    _ => None,
                },
                retry_after,
            }
        }
    }
}

/// Extract a human-readable message from a JSON error body
///
/// Tries `message`, then `error.message`, then a bare `error` string.
pub fn extract_error_message(json: &Value) -> Option<String> {
    if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
        return Some(message.to_string());
    }

    if let Some(error) = json.get("error") {
        if let Some(message) = error.get("message").and_then(|v| v.as_str()) {
            return Some(message.to_string());
        }
        if let Some(message) = error.as_str() {
            return Some(message.to_string());
        }
    }

    None
}

fn retry_after_from_headers(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after)
}

/// Parse a `Retry-After` header value given in seconds
///
/// Decimal values are accepted; HTTP dates are not.
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let seconds = header_value.trim().parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn agent_context() -> RequestContext {
        RequestContext::new(EntityKind::Agent, "Planner")
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after(" 1.5 "), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn test_forbidden_and_not_found_use_context() {
        let err = map_http_error(
            StatusCode::FORBIDDEN,
            None,
            None,
            &agent_context(),
            "/api/v1/agents/dynamic/name/Planner/invoke",
            Uuid::new_v4(),
        );
        assert!(matches!(
            err,
            AiSdkError::NotEnabled { entity: EntityKind::Agent, ref name } if name == "Planner"
        ));

        let err = map_http_error(
            StatusCode::NOT_FOUND,
            None,
            None,
            &RequestContext::default(),
            "/api/v1/things",
            Uuid::new_v4(),
        );
        assert!(matches!(
            err,
            AiSdkError::NotFound { entity: EntityKind::Resource, ref name } if name == "/api/v1/things"
        ));
    }

    #[test]
    fn test_rate_limit_reads_header() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            Some(&headers),
            None,
            &agent_context(),
            "/",
            Uuid::new_v4(),
        );
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_server_error_message_from_body() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("1"));
        let err = map_http_error(
            StatusCode::SERVICE_UNAVAILABLE,
            Some(&headers),
            Some(r#"{"error": {"message": "overloaded"}}"#.to_string()),
            &agent_context(),
            "/",
            Uuid::new_v4(),
        );
        match err {
            AiSdkError::ExecutionFailure {
                status,
                message,
                agent,
                retry_after,
            } => {
                assert_eq!(status, Some(503));
                assert!(message.starts_with("overloaded [request_id: "));
                assert_eq!(agent.as_deref(), Some("Planner"));
                assert_eq!(retry_after, Some(Duration::from_secs(1)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bad_request_ignores_retry_after_and_uses_raw_text() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("10"));
        let err = map_http_error(
            StatusCode::BAD_REQUEST,
            Some(&headers),
            Some("missing field".to_string()),
            &RequestContext::default(),
            "/",
            Uuid::new_v4(),
        );
        assert_eq!(err.retry_after(), None);
        assert!(err.to_string().contains("missing field"));
        assert!(!err.is_retryable());
    }
}
