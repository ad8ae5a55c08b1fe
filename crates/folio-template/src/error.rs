//! Template errors.

use std::path::PathBuf;

use folio_core::{Placeholder, SsrError};
use thiserror::Error;

/// Errors resolving a template.
///
/// Cloneable so a single failed production fill can be reported to every
/// caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    #[error("failed to read template {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("transform {name} failed: {message}")]
    Transform { name: String, message: String },

    #[error("template has no {0} marker")]
    MissingPlaceholder(Placeholder),
}

impl From<TemplateError> for SsrError {
    fn from(err: TemplateError) -> Self {
        SsrError::Template {
            message: err.to_string(),
        }
    }
}
