//! Where shell text comes from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::TemplateError;

/// A readable HTML shell.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Read the raw shell text.
    async fn read(&self) -> Result<String, TemplateError>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// Shell stored on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TemplateSource for FileSource {
    async fn read(&self) -> Result<String, TemplateError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| TemplateError::Read {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Shell held in memory, for embedded templates and tests.
#[derive(Debug, Clone)]
pub struct StaticSource {
    html: String,
}

impl StaticSource {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

#[async_trait]
impl TemplateSource for StaticSource {
    async fn read(&self) -> Result<String, TemplateError> {
        Ok(self.html.clone())
    }

    fn describe(&self) -> String {
        "<static>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source_reads_current_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html>v1</html>").unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(source.read().await.unwrap(), "<html>v1</html>");

        std::fs::write(file.path(), "<html>v2</html>").unwrap();
        assert_eq!(source.read().await.unwrap(), "<html>v2</html>");
    }

    #[tokio::test]
    async fn test_missing_file_reports_path() {
        let source = FileSource::new("/no/such/index.html");
        let err = source.read().await.unwrap_err();
        assert!(err.to_string().contains("/no/such/index.html"));
    }
}
