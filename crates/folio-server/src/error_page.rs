//! Error response bodies.

use folio_core::SsrError;
use folio_render::html_escape;
use http::StatusCode;

/// Body every production 500 gets, whatever went wrong.
pub const GENERIC_ERROR_BODY: &str =
    "<!DOCTYPE html><html><head><title>Error</title></head><body><h1>Server Error</h1></body></html>";

/// A rendered error document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub title: &'static str,
    pub description: &'static str,
    /// Message and cause chain. Only set when errors are exposed.
    pub detail: Option<String>,
}

impl ErrorPage {
    pub fn new(status: StatusCode) -> Self {
        let (title, description) = match status.as_u16() {
            404 => (
                "Page Not Found",
                "Sorry, the page you are looking for does not exist or has been removed.",
            ),
            403 => ("Access Denied", "You do not have permission to view this page."),
            500 => (
                "Server Error",
                "The server ran into a problem. Please try again later.",
            ),
            _ => (
                "Something Went Wrong",
                "Sorry, an unexpected error occurred.",
            ),
        };
        Self {
            status,
            title,
            description,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Body for `error`. Server failures get the generic body unless
    /// `expose` is set; then the page carries the full error chain.
    pub fn body_for(error: &SsrError, expose: bool) -> String {
        let status = error.status();
        if status.is_server_error() && !expose {
            return GENERIC_ERROR_BODY.to_string();
        }

        let page = ErrorPage::new(status);
        if expose && !error.is_expected() {
            page.with_detail(error.detail()).render()
        } else {
            page.render()
        }
    }

    pub fn render(&self) -> String {
        let mut html = format!(
            "<!DOCTYPE html><html><head><title>{title}</title>\
             <meta name=\"description\" content=\"{description}\"></head>\
             <body><div id=\"error-page\"><h1>{title}</h1><div class=\"error-code\">{code}</div>\
             <p>{description}</p><a href=\"/\">Back to home</a>",
            title = self.title,
            description = self.description,
            code = self.status.as_u16(),
        );
        if let Some(detail) = &self.detail {
            html.push_str(&format!(
                "<details open><summary>Debug information</summary><pre>{}</pre></details>",
                html_escape(detail)
            ));
        }
        html.push_str("</div></body></html>");
        html
    }
}
