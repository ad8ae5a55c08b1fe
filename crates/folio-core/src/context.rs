//! Request inputs with typed accessors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use percent_encoding::percent_decode_str;

/// Correlates log records, metrics and transitions of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

impl RequestId {
    /// Fresh id from the clock and a process-wide counter.
    pub fn generate() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:x}-{:x}", nanos, seq))
    }

    /// Wrap an id that arrived with the request.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extracted route parameters (e.g., `:id` from `/detail/:id`).
pub type RouteParams = HashMap<String, String>;

/// Decoded `?a=b` pairs.
pub type QueryParams = HashMap<String, String>;

/// HTTP headers.
pub type Headers = HashMap<String, String>;

/// Request cookies.
pub type Cookies = HashMap<String, String>;

/// An incoming page request, constructed once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    original_url: String,
    headers: Headers,
    cookies: Cookies,
}

impl RenderRequest {
    /// Create a request for the given URL (path plus optional query string).
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            headers: HashMap::new(),
            cookies: HashMap::new(),
        }
    }

    /// Build from raw parts, reading cookies out of the `Cookie` header.
    pub fn from_parts(original_url: impl Into<String>, headers: Headers) -> Self {
        let cookies = headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
            .flat_map(|(_, v)| parse_cookie_header(v))
            .collect();
        Self {
            original_url: original_url.into(),
            headers,
            cookies,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a cookie.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// The URL exactly as received.
    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    /// The path component without query string or fragment.
    pub fn path(&self) -> &str {
        split_path(&self.original_url)
    }

    /// Parsed query string parameters.
    pub fn query(&self) -> QueryParams {
        parse_query(&self.original_url)
    }

    /// All headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// All cookies.
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// Header value; names are matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Get a cookie value by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|s| s.as_str())
    }
}

/// Typed request context handed to route loaders.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Id of this request.
    pub request_id: RequestId,
    /// Original request URL.
    pub url: String,
    /// Request path.
    pub path: String,
    /// `:name` segments captured by the matched route.
    pub params: RouteParams,
    /// Decoded `?a=b` pairs.
    pub query: QueryParams,
    /// HTTP headers.
    pub headers: Headers,
    /// Request cookies.
    pub cookies: Cookies,
}

impl RequestContext {
    /// Create a context for one pipeline run.
    pub fn from_request(request: &RenderRequest, request_id: RequestId) -> Self {
        Self {
            request_id,
            url: request.original_url().to_string(),
            path: request.path().to_string(),
            params: HashMap::new(),
            query: request.query(),
            headers: request.headers().clone(),
            cookies: request.cookies().clone(),
        }
    }

    /// Replace the route parameters.
    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params = params;
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(|s| s.as_str())
    }

    /// Header value; names are matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Get a cookie value by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|s| s.as_str())
    }
}

fn find_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn split_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

fn parse_query(url: &str) -> QueryParams {
    let Some(start) = url.find('?') else {
        return HashMap::new();
    };
    let query = &url[start + 1..];
    let query = query.split('#').next().unwrap_or_default();

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let pair = pair.replace('+', " ");
            match pair.split_once('=') {
                Some((k, v)) => (decode_component(k), decode_component(v)),
                None => (decode_component(&pair), String::new()),
            }
        })
        .collect()
}

/// Percent-decode one URL component. Text that does not decode to UTF-8 is
/// kept as it arrived.
pub fn decode_component(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Parse a `Cookie` header value into name/value pairs.
pub fn parse_cookie_header(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter_map(|part| {
            let (name, value) = part.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // === RenderRequest Tests ===

    #[test]
    fn test_path_strips_query_and_fragment() {
        let req = RenderRequest::new("/detail/42?ref=home#comments");
        assert_eq!(req.path(), "/detail/42");
        assert_eq!(req.original_url(), "/detail/42?ref=home#comments");
    }

    #[test]
    fn test_query_parsing() {
        let req = RenderRequest::new("/search?q=rust&page=2&flag");
        let query = req.query();
        assert_eq!(query.get("q").map(String::as_str), Some("rust"));
        assert_eq!(query.get("page").map(String::as_str), Some("2"));
        assert_eq!(query.get("flag").map(String::as_str), Some(""));
    }

    #[test]
    fn test_query_values_are_decoded() {
        let query = RenderRequest::new("/search?q=hello%20world&tag=a+b&bad=%FF").query();
        assert_eq!(query.get("q").map(String::as_str), Some("hello world"));
        assert_eq!(query.get("tag").map(String::as_str), Some("a b"));
        assert_eq!(query.get("bad").map(String::as_str), Some("%FF"));
    }

    #[test]
    fn test_decode_component() {
        assert_eq!(decode_component("caf%C3%A9"), "café");
        assert_eq!(decode_component("%31"), "1");
        assert_eq!(decode_component("plain"), "plain");
        assert_eq!(decode_component("%E2%28"), "%E2%28");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = RenderRequest::new("/").with_header("Accept-Language", "en");
        assert_eq!(req.header("accept-language"), Some("en"));
    }

    #[test]
    fn test_from_parts_reads_cookie_header() {
        let mut headers = Headers::new();
        headers.insert("Cookie".to_string(), "token=abc; theme=dark".to_string());
        let req = RenderRequest::from_parts("/", headers);
        assert_eq!(req.cookie("token"), Some("abc"));
        assert_eq!(req.cookie("theme"), Some("dark"));
    }

    // === Cookie Parsing Tests ===

    #[test]
    fn test_parse_cookie_header_skips_malformed_parts() {
        let cookies = parse_cookie_header(r#"a=1; broken; ="x"; b="two""#);
        assert_eq!(
            cookies,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "two".to_string())
            ]
        );
    }

    // === RequestContext Tests ===

    #[test]
    fn test_request_context_from_request() {
        let req = RenderRequest::new("/about?x=1").with_cookie("token", "t");
        let ctx = RequestContext::from_request(&req, RequestId::from_string("req-1"));

        assert_eq!(ctx.path, "/about");
        assert_eq!(ctx.query_param("x"), Some("1"));
        assert_eq!(ctx.cookie("token"), Some("t"));
        assert!(ctx.params.is_empty());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
    }
}
