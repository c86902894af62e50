//! Response snapshots and synthesized fallback responses.
//!
//! The interception layer never lets a failure escape as an error: every
//! failure mode converts into a synthesized response a caller can render.

use std::collections::BTreeMap;

use http::StatusCode;

/// Fixed-size placeholder served when an image cannot be fetched.
const PLACEHOLDER_SVG: &str = concat!(
    r##"<svg width="200" height="200" xmlns="http://www.w3.org/2000/svg">"##,
    r##"<rect width="200" height="200" fill="#f0f0f0"/>"##,
    r##"<text x="50%" y="50%" text-anchor="middle" dy=".3em" fill="#999">Image</text>"##,
    "</svg>"
);

/// Minimal last-resort offline document.
const OFFLINE_HTML: &str = concat!(
    "<!doctype html><html><head><title>Offline</title></head>",
    "<body><h1>Offline</h1><p>This page is not available offline.</p></body></html>"
);

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Fetched live from the network.
    Network,
    /// Served from a cache bucket.
    Cache,
    /// Synthesized locally (placeholder, offline payload, timeout).
    Synthesized,
}

/// A response snapshot: what gets cached and what gets served.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub source: ResponseSource,
}

impl FetchResponse {
    /// A response received from the network.
    #[must_use]
    pub fn network(status: StatusCode, headers: BTreeMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            source: ResponseSource::Network,
        }
    }

    /// A 200 network response with a body and content type (test helper and
    /// install-time construction).
    #[must_use]
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        Self::network(StatusCode::OK, headers, body.into())
    }

    /// This response, marked as served from cache.
    #[must_use]
    pub fn into_cached(mut self) -> Self {
        self.source = ResponseSource::Cache;
        self
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as UTF-8, lossy.
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn synthesized(status: StatusCode, content_type: &str, body: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        Self {
            status,
            headers,
            body: body.as_bytes().to_vec(),
            source: ResponseSource::Synthesized,
        }
    }

    /// Placeholder graphic served when an image fetch fails; image failures
    /// must never break layout, so this is a 200.
    #[must_use]
    pub fn placeholder_image() -> Self {
        Self::synthesized(StatusCode::OK, "image/svg+xml", PLACEHOLDER_SVG)
    }

    /// Structured offline payload for an API request with no cached entry.
    ///
    /// Carries `"offline": true` so callers can tell offline-without-cache
    /// apart from a genuine server error.
    #[must_use]
    pub fn offline_api() -> Self {
        Self::synthesized(
            StatusCode::SERVICE_UNAVAILABLE,
            "application/json",
            r#"{"message":"Offline - No cached data available","offline":true}"#,
        )
    }

    /// Last-resort offline document for navigation requests.
    #[must_use]
    pub fn offline_page() -> Self {
        Self::synthesized(StatusCode::SERVICE_UNAVAILABLE, "text/html", OFFLINE_HTML)
    }

    /// Timeout-class response for uncacheable failures.
    #[must_use]
    pub fn request_timeout() -> Self {
        Self::synthesized(StatusCode::REQUEST_TIMEOUT, "text/plain", "Network error")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_api_payload_is_distinguishable() {
        let resp = FetchResponse::offline_api();
        assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
        let json: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(json["offline"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_placeholder_image_is_a_success() {
        let resp = FetchResponse::placeholder_image();
        assert!(resp.is_success());
        assert_eq!(
            resp.headers.get("content-type").map(String::as_str),
            Some("image/svg+xml")
        );
    }

    #[test]
    fn test_into_cached_stamps_source() {
        let resp = FetchResponse::ok("application/json", "{}").into_cached();
        assert_eq!(resp.source, ResponseSource::Cache);
    }

    #[test]
    fn test_timeout_is_not_success() {
        assert!(!FetchResponse::request_timeout().is_success());
    }
}
