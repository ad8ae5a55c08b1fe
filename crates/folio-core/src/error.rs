//! Failure taxonomy for a pipeline run.

use std::time::Duration;

use http::StatusCode;

/// Every way a pipeline run can end other than a completed response.
///
/// `Redirect` and `NotFound` are expected control flow; everything else is
/// logged as an error before a generic body reaches the client.
#[derive(Debug, thiserror::Error)]
pub enum SsrError {
    /// A loader asked for a redirect.
    #[error("redirect {status} to {location}")]
    Redirect {
        status: StatusCode,
        location: String,
    },

    /// No route matched, or a loader signalled not found.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// Failure before any byte was written.
    #[error("render failed: {error}")]
    RenderFailure { error: anyhow::Error },

    /// Failure after the head segment was written.
    #[error("stream failed after first byte: {message}")]
    PartialStreamFailure { message: String },

    /// Renderer did not become ready before the deadline.
    #[error("render timed out after {}ms", deadline.as_millis())]
    Timeout { deadline: Duration },

    /// The template could not be resolved.
    #[error("template unavailable: {message}")]
    Template { message: String },
}

impl SsrError {
    /// Redirect to `location`, defaulting to `/` when empty.
    pub fn redirect(status: StatusCode, location: impl Into<String>) -> Self {
        let location = location.into();
        Self::Redirect {
            status,
            location: if location.is_empty() {
                "/".to_string()
            } else {
                location
            },
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn render_failure(error: impl Into<anyhow::Error>) -> Self {
        Self::RenderFailure {
            error: error.into(),
        }
    }

    /// HTTP status the client sees for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            SsrError::Redirect { status, .. } => *status,
            SsrError::NotFound { .. } => StatusCode::NOT_FOUND,
            SsrError::RenderFailure { .. }
            | SsrError::PartialStreamFailure { .. }
            | SsrError::Timeout { .. }
            | SsrError::Template { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for control-flow outcomes that must not be logged as errors.
    pub fn is_expected(&self) -> bool {
        matches!(self, SsrError::Redirect { .. } | SsrError::NotFound { .. })
    }

    /// Log signature, recorded as the `kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            SsrError::Redirect { .. } => "redirect",
            SsrError::NotFound { .. } => "not_found",
            SsrError::RenderFailure { .. } => "render_failure",
            SsrError::PartialStreamFailure { .. } => "partial_stream_failure",
            SsrError::Timeout { .. } => "render_timeout",
            SsrError::Template { .. } => "template_failure",
        }
    }

    /// Message plus full cause chain, for server logs and development error pages.
    pub fn detail(&self) -> String {
        match self {
            SsrError::RenderFailure { error } => format!("{:?}", error),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    // === Status Mapping Tests ===

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SsrError::redirect(StatusCode::FOUND, "/login").status(),
            StatusCode::FOUND
        );
        assert_eq!(SsrError::not_found("/x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            SsrError::Timeout {
                deadline: Duration::from_secs(10)
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            SsrError::render_failure(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_expected_outcomes() {
        assert!(SsrError::redirect(StatusCode::FOUND, "/").is_expected());
        assert!(SsrError::not_found("/").is_expected());
        assert!(!SsrError::render_failure(anyhow::anyhow!("x")).is_expected());
        assert!(!SsrError::Template {
            message: "x".into()
        }
        .is_expected());
    }

    #[test]
    fn test_redirect_defaults_location() {
        match SsrError::redirect(StatusCode::SEE_OTHER, "") {
            SsrError::Redirect { location, .. } => assert_eq!(location, "/"),
            other => panic!("unexpected {other:?}"),
        }
    }

    // === Log Signature Tests ===

    #[test]
    fn test_timeout_has_distinct_kind() {
        let timeout = SsrError::Timeout {
            deadline: Duration::from_millis(50),
        };
        let failure = SsrError::render_failure(anyhow::anyhow!("x"));
        assert_eq!(timeout.kind(), "render_timeout");
        assert_ne!(timeout.kind(), failure.kind());
        assert_eq!(timeout.to_string(), "render timed out after 50ms");
    }

    #[test]
    fn test_detail_includes_cause_chain() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused"));
        let err = err.context("loading article 7").unwrap_err();
        let detail = SsrError::render_failure(err).detail();
        assert!(detail.contains("loading article 7"));
        assert!(detail.contains("connection refused"));
    }
}
