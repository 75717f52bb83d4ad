//! Correlation id propagation.
//!
//! # Responsibilities
//! - Generate a request id when the caller did not supply one
//! - Send it upstream under the configured trace header
//!
//! # Design Decisions
//! - Disabled unless a trace header name is configured
//! - The same id is sent on every retry of one logical request

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use uuid::Uuid;

/// A fresh correlation id (32 lowercase hex characters).
pub fn new_request_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Merge the correlation id into `headers`.
///
/// Returns the id that events should carry: the caller's id, a generated
/// one when a trace header is configured, or `None`.
pub fn apply_trace_header(
    headers: &mut HeaderMap,
    trace_header: Option<&HeaderName>,
    request_id: Option<String>,
) -> Result<Option<String>, InvalidHeaderValue> {
    let Some(name) = trace_header else {
        return Ok(request_id);
    };

    let id = request_id.unwrap_or_else(new_request_id);
    headers.insert(name.clone(), HeaderValue::from_str(&id)?);
    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_hex() {
        let a = new_request_id();
        let b = new_request_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_no_trace_header_passes_id_through() {
        let mut headers = HeaderMap::new();
        let id = apply_trace_header(&mut headers, None, Some("abc".into())).unwrap();
        assert_eq!(id.as_deref(), Some("abc"));
        assert!(headers.is_empty());

        let id = apply_trace_header(&mut headers, None, None).unwrap();
        assert!(id.is_none());
    }

    #[test]
    fn test_trace_header_uses_caller_id() {
        let name = HeaderName::from_static("x-request-id");
        let mut headers = HeaderMap::new();
        let id = apply_trace_header(&mut headers, Some(&name), Some("req-1".into())).unwrap();
        assert_eq!(id.as_deref(), Some("req-1"));
        assert_eq!(headers.get("x-request-id").unwrap(), "req-1");
    }

    #[test]
    fn test_trace_header_generates_id() {
        let name = HeaderName::from_static("x-trace");
        let mut headers = HeaderMap::new();
        let id = apply_trace_header(&mut headers, Some(&name), None)
            .unwrap()
            .unwrap();
        assert_eq!(headers.get("x-trace").unwrap().to_str().unwrap(), id);
    }

    #[test]
    fn test_invalid_id_rejected() {
        let name = HeaderName::from_static("x-trace");
        let mut headers = HeaderMap::new();
        let result = apply_trace_header(&mut headers, Some(&name), Some("bad\nid".into()));
        assert!(result.is_err());
    }
}
