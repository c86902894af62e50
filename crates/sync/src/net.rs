//! Network backend abstraction.
//!
//! The engine reaches the network only through [`HttpBackend`]; the router
//! and queue are generic over it, so tests inject a scripted backend and the
//! application injects [`ReqwestBackend`].

use std::collections::BTreeMap;
use std::future::Future;

use http::Method;
use url::Url;

use crate::error::NetworkError;
use crate::request::FetchRequest;
use crate::response::FetchResponse;

/// A concrete request handed to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl From<&FetchRequest> for OutboundRequest {
    fn from(request: &FetchRequest) -> Self {
        Self {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        }
    }
}

/// Asynchronous HTTP transport.
pub trait HttpBackend: Send + Sync {
    /// Execute a request and return the response snapshot.
    ///
    /// Connectivity failures map to [`NetworkError::Unreachable`]; HTTP error
    /// statuses are *not* errors here - they come back as responses.
    fn execute(
        &self,
        request: &OutboundRequest,
    ) -> impl Future<Output = Result<FetchResponse, NetworkError>> + Send;
}

/// Production backend on `reqwest`.
///
/// Path-relative URLs (the form the queue stores) resolve against the
/// configured base; absolute URLs pass through.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
    base: Url,
}

impl ReqwestBackend {
    /// Create a backend resolving relative URLs against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidRequest`] if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, NetworkError> {
        let base = Url::parse(base_url)
            .map_err(|e| NetworkError::InvalidRequest(format!("bad base url: {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    fn resolve(&self, raw: &str) -> Result<Url, NetworkError> {
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(_) => self
                .base
                .join(raw)
                .map_err(|e| NetworkError::InvalidRequest(format!("bad url {raw}: {e}"))),
        }
    }
}

impl HttpBackend for ReqwestBackend {
    async fn execute(&self, request: &OutboundRequest) -> Result<FetchResponse, NetworkError> {
        let url = self.resolve(&request.url)?;

        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                NetworkError::Unreachable(Some(e))
            } else {
                NetworkError::Transport(e)
            }
        })?;

        let status = response.status();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(NetworkError::Transport)?;

        Ok(FetchResponse::network(status, headers, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_base_url_is_rejected() {
        assert!(ReqwestBackend::new("not a url").is_err());
    }

    #[test]
    fn test_relative_urls_resolve_against_base() {
        let backend = ReqwestBackend::new("https://shop.example.com").expect("valid base");
        let url = backend.resolve("/api/cart/add").expect("resolvable");
        assert_eq!(url.as_str(), "https://shop.example.com/api/cart/add");
    }

    #[test]
    fn test_absolute_urls_pass_through() {
        let backend = ReqwestBackend::new("https://shop.example.com").expect("valid base");
        let url = backend.resolve("https://cdn.example.com/a.png").expect("resolvable");
        assert_eq!(url.as_str(), "https://cdn.example.com/a.png");
    }

    #[test]
    fn test_outbound_from_fetch_request() {
        let fetch = FetchRequest::new(Method::POST, "/api/cart/add")
            .with_header("content-type", "application/json")
            .with_body(r#"{"productId":1,"quantity":2}"#);
        let outbound = OutboundRequest::from(&fetch);
        assert_eq!(outbound.method, Method::POST);
        assert_eq!(outbound.url, "/api/cart/add");
        assert_eq!(
            outbound.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
    }
}
