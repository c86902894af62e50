//! Request model and resource classification.
//!
//! Every outgoing request is classified exactly once into a closed set of
//! resource classes; the router then dispatches on the class. Classification
//! is a pure function of the request plus the configured shell asset set.

use std::collections::{BTreeMap, HashSet};

use http::Method;
use url::Url;

/// Base used to normalize path-relative URLs; never observable in output.
const IDENTITY_BASE: &str = "http://seagrape.invalid/";

/// File extensions treated as image resources.
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp"];

/// How a request was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// A top-level document load.
    Navigate,
    /// Everything else (subresources, API calls, prefetches).
    #[default]
    Subresource,
}

/// Closed set of resource classes, each with exactly one caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestClass {
    /// Precached application shell asset.
    Shell,
    /// Backend API call under the `/api/` prefix.
    Api,
    /// Image resource (destination hint or extension match).
    Image,
    /// Top-level document load.
    Navigation,
    /// Anything else.
    Other,
}

/// An outgoing request as seen by the interception layer.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub mode: RequestMode,
    /// Browser-supplied destination hint (e.g. `image`), when known.
    pub destination: Option<String>,
}

impl FetchRequest {
    /// A plain GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            mode: RequestMode::Subresource,
            destination: None,
        }
    }

    /// A top-level document load.
    #[must_use]
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    /// A request with an arbitrary method and optional body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            ..Self::get(url)
        }
    }

    /// Set a header, replacing any existing value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the destination hint.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// The cache identity of this request.
    #[must_use]
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity {
            method: self.method.clone(),
            url: normalize_url(&self.url),
        }
    }

    /// Only GET responses are ever cached.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.method == Method::GET
    }
}

/// Cache key: normalized URL plus method.
///
/// Normalization sorts query parameters and drops fragments so that
/// equivalent spellings of the same resource share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity {
    pub method: Method,
    pub url: String,
}

impl RequestIdentity {
    /// Identity for a GET of `url`.
    #[must_use]
    pub fn get(url: &str) -> Self {
        Self {
            method: Method::GET,
            url: normalize_url(url),
        }
    }
}

impl std::fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Classify a request into exactly one resource class.
///
/// Precedence: navigation mode wins, then image hints, then the `/api/`
/// prefix, then membership in the shell asset set. `shell_assets` holds
/// normalized URLs as produced by [`normalize_url`].
#[must_use]
pub fn classify(request: &FetchRequest, shell_assets: &HashSet<String>) -> RequestClass {
    if request.mode == RequestMode::Navigate {
        return RequestClass::Navigation;
    }
    if is_image(request) {
        return RequestClass::Image;
    }
    if url_path(&request.url).starts_with("/api/") {
        return RequestClass::Api;
    }
    if shell_assets.contains(&normalize_url(&request.url)) {
        return RequestClass::Shell;
    }
    RequestClass::Other
}

/// Normalize a URL for use as a cache key.
///
/// Absolute URLs keep their origin; path-relative URLs normalize to
/// `/path?query`. Query parameters are sorted, fragments dropped.
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    let Some((url, relative)) = parse_lenient(raw) else {
        return raw.to_string();
    };

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();

    let query = if pairs.is_empty() {
        String::new()
    } else {
        let joined = pairs
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!("{k}={v}")
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("?{joined}")
    };

    if relative {
        format!("{}{query}", url.path())
    } else {
        let port = url.port().map_or(String::new(), |p| format!(":{p}"));
        format!(
            "{}://{}{port}{}{query}",
            url.scheme(),
            url.host_str().unwrap_or_default(),
            url.path()
        )
    }
}

/// The path component of a URL, whether absolute or path-relative.
#[must_use]
pub fn url_path(raw: &str) -> String {
    parse_lenient(raw).map_or_else(|| raw.to_string(), |(url, _)| url.path().to_string())
}

/// Parse `raw` as an absolute URL, or join it against a fixed base when it
/// is path-relative. Returns the parsed URL and whether it was relative.
fn parse_lenient(raw: &str) -> Option<(Url, bool)> {
    match Url::parse(raw) {
        Ok(url) if !url.cannot_be_a_base() => Some((url, false)),
        Ok(_) => None,
        Err(_) => Url::parse(IDENTITY_BASE)
            .ok()?
            .join(raw)
            .ok()
            .map(|url| (url, true)),
    }
}

fn is_image(request: &FetchRequest) -> bool {
    if request.destination.as_deref() == Some("image") {
        return true;
    }
    let path = url_path(&request.url).to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_set() -> HashSet<String> {
        ["/", "/index.html", "/static/css/main.css", "/static/js/main.js"]
            .iter()
            .map(|u| normalize_url(u))
            .collect()
    }

    #[test]
    fn test_classify_navigation_wins() {
        let req = FetchRequest::navigate("/products/7");
        assert_eq!(classify(&req, &shell_set()), RequestClass::Navigation);
    }

    #[test]
    fn test_classify_image_by_extension() {
        let req = FetchRequest::get("/media/hero.PNG");
        assert_eq!(classify(&req, &shell_set()), RequestClass::Image);
    }

    #[test]
    fn test_classify_image_by_destination_hint() {
        let req = FetchRequest::get("/media/hero").with_destination("image");
        assert_eq!(classify(&req, &shell_set()), RequestClass::Image);
    }

    #[test]
    fn test_classify_api_prefix() {
        let req = FetchRequest::get("/api/products?page=2");
        assert_eq!(classify(&req, &shell_set()), RequestClass::Api);
    }

    #[test]
    fn test_classify_shell_asset() {
        let req = FetchRequest::get("/static/css/main.css");
        assert_eq!(classify(&req, &shell_set()), RequestClass::Shell);
    }

    #[test]
    fn test_classify_other() {
        let req = FetchRequest::get("/robots.txt");
        assert_eq!(classify(&req, &shell_set()), RequestClass::Other);
    }

    #[test]
    fn test_normalize_sorts_query_and_drops_fragment() {
        assert_eq!(
            normalize_url("/api/products?b=2&a=1#section"),
            "/api/products?a=1&b=2"
        );
    }

    #[test]
    fn test_normalize_keeps_origin_for_absolute_urls() {
        assert_eq!(
            normalize_url("https://cdn.example.com/img/a.png?x=1"),
            "https://cdn.example.com/img/a.png?x=1"
        );
    }

    #[test]
    fn test_normalize_equivalent_spellings_share_identity() {
        assert_eq!(
            RequestIdentity::get("/api/cart?a=1&b=2"),
            RequestIdentity::get("/api/cart?b=2&a=1")
        );
    }

    #[test]
    fn test_identity_distinguishes_method() {
        let get = FetchRequest::get("/api/cart").identity();
        let post = FetchRequest::new(Method::POST, "/api/cart").identity();
        assert_ne!(get, post);
    }

    #[test]
    fn test_only_get_is_cacheable() {
        assert!(FetchRequest::get("/api/cart").is_cacheable());
        assert!(!FetchRequest::new(Method::POST, "/api/cart/add").is_cacheable());
        assert!(!FetchRequest::new(Method::DELETE, "/api/cart/clear").is_cacheable());
    }
}
