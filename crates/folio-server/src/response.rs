//! Response types.

use std::fmt;

use futures::stream::{self, BoxStream, StreamExt};
use http::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderValue, StatusCode};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const NO_STORE: &str = "private, no-cache, no-store, must-revalidate";

/// Response body: nothing, a complete string, or chunks as they are written.
pub enum ResponseBody {
    Empty,
    Full(String),
    Stream(BoxStream<'static, Vec<u8>>),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Empty => f.write_str("Empty"),
            ResponseBody::Full(body) => f.debug_tuple("Full").field(&body.len()).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl ResponseBody {
    /// Read the whole body. A stream is drained until its writer finishes.
    pub async fn collect_bytes(self) -> Vec<u8> {
        match self {
            ResponseBody::Empty => Vec::new(),
            ResponseBody::Full(body) => body.into_bytes(),
            ResponseBody::Stream(chunks) => chunks.concat().await,
        }
    }

    /// The body as a chunk stream, whatever its kind.
    pub fn into_stream(self) -> BoxStream<'static, Vec<u8>> {
        match self {
            ResponseBody::Empty => stream::empty().boxed(),
            ResponseBody::Full(body) => stream::once(async move { body.into_bytes() }).boxed(),
            ResponseBody::Stream(chunks) => chunks,
        }
    }

    /// Next chunk of a streamed body; `None` for other kinds.
    pub async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        match self {
            ResponseBody::Stream(chunks) => chunks.next().await,
            _ => None,
        }
    }
}

/// What the middleware hands back to the HTTP layer.
#[derive(Debug)]
pub struct SsrResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl SsrResponse {
    /// HTML response with the no-store cache policy.
    pub fn html(status: StatusCode, body: ResponseBody) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Redirect with an empty body. A location that is not a valid header
    /// value falls back to `/`.
    pub fn redirect(status: StatusCode, location: &str) -> Self {
        let mut headers = HeaderMap::new();
        let location =
            HeaderValue::from_str(location).unwrap_or_else(|_| HeaderValue::from_static("/"));
        headers.insert(LOCATION, location);
        Self {
            status,
            headers,
            body: ResponseBody::Empty,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub async fn into_string(self) -> String {
        String::from_utf8_lossy(&self.body.collect_bytes().await).into_owned()
    }

    /// Convert into an `http::Response` for the hosting server.
    pub fn into_http(self) -> http::Response<ResponseBody> {
        let mut response = http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_headers() {
        let response = SsrResponse::html(StatusCode::OK, ResponseBody::Empty);
        assert_eq!(response.header("content-type"), Some(HTML_CONTENT_TYPE));
        assert_eq!(response.header("cache-control"), Some(NO_STORE));
    }

    #[test]
    fn test_redirect_invalid_location_falls_back() {
        let response = SsrResponse::redirect(StatusCode::FOUND, "/bad\nvalue");
        assert_eq!(response.header("location"), Some("/"));
    }

    #[tokio::test]
    async fn test_stream_body_collects() {
        let body = ResponseBody::Stream(
            futures::stream::iter(vec![b"<a>".to_vec(), b"</a>".to_vec()]).boxed(),
        );
        let response = SsrResponse::html(StatusCode::OK, body);
        assert_eq!(response.into_string().await, "<a></a>");
    }

    #[tokio::test]
    async fn test_full_body_as_stream() {
        let chunks: Vec<Vec<u8>> = ResponseBody::Full("<p>".into()).into_stream().collect().await;
        assert_eq!(chunks, vec![b"<p>".to_vec()]);
        assert_eq!(ResponseBody::Empty.into_stream().count().await, 0);
    }

    #[test]
    fn test_into_http() {
        let response = SsrResponse::redirect(StatusCode::SEE_OTHER, "/login").into_http();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/login");
    }
}
