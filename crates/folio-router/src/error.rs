//! Route resolution errors.

use folio_core::SsrError;
use http::StatusCode;

/// Why a URL did not produce loaded route data.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("no route matches {path}")]
    NoMatch { path: String },

    #[error("loader for {route} reported not found")]
    NotFound { route: String, path: String },

    #[error("loader for {route} redirected {status} to {location}")]
    Redirect {
        route: String,
        status: StatusCode,
        location: String,
    },

    #[error("loader for {route} failed: {error}")]
    LoaderFailed { route: String, error: anyhow::Error },
}

impl From<RouteError> for SsrError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::NoMatch { path } | RouteError::NotFound { path, .. } => {
                SsrError::not_found(path)
            }
            RouteError::Redirect {
                status, location, ..
            } => SsrError::redirect(status, location),
            RouteError::LoaderFailed { route, error } => {
                SsrError::render_failure(error.context(format!("loader for {} failed", route)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_ssr_error() {
        let err: SsrError = RouteError::NoMatch { path: "/x".into() }.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: SsrError = RouteError::Redirect {
            route: "/drafts".into(),
            status: StatusCode::FOUND,
            location: "/login".into(),
        }
        .into();
        assert!(matches!(err, SsrError::Redirect { ref location, .. } if location == "/login"));

        let err: SsrError = RouteError::LoaderFailed {
            route: "/detail/:id".into(),
            error: anyhow::anyhow!("db down"),
        }
        .into();
        assert_eq!(err.kind(), "render_failure");
        assert!(err.detail().contains("db down"));
        assert!(err.detail().contains("/detail/:id"));
    }
}
