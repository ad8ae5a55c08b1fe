//! Development and production template providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use folio_core::{Placeholder, RenderMode, SsrConfig};
use futures::future::{BoxFuture, FutureExt, Shared};

use crate::{FileSource, HtmlTransform, TemplateError, TemplateSource, TemplateText};

/// Supplies the HTML shell for a request.
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    /// Shell text for `url`.
    async fn resolve(&self, url: &str) -> Result<TemplateText, TemplateError>;

    /// Drop any cached shell so the next `resolve` reloads it.
    fn invalidate(&self) {}
}

/// Fail if the shell cannot be split, warn about other missing markers.
fn validate(html: &str, origin: &str) -> Result<(), TemplateError> {
    for missing in Placeholder::missing_from(html) {
        if missing == Placeholder::Html {
            return Err(TemplateError::MissingPlaceholder(missing));
        }
        tracing::warn!(template = origin, placeholder = %missing, "template marker missing");
    }
    Ok(())
}

/// Re-reads and transforms the shell on every call so live edits show up
/// on the next request.
pub struct DevTemplateProvider {
    source: Arc<dyn TemplateSource>,
    transforms: Vec<Arc<dyn HtmlTransform>>,
}

impl DevTemplateProvider {
    pub fn new(source: impl TemplateSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            transforms: Vec::new(),
        }
    }

    /// Append a transform. Transforms run in the order they were added.
    pub fn with_transform(mut self, transform: impl HtmlTransform + 'static) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    pub fn with_transforms(mut self, transforms: Vec<Arc<dyn HtmlTransform>>) -> Self {
        self.transforms.extend(transforms);
        self
    }
}

#[async_trait]
impl TemplateProvider for DevTemplateProvider {
    async fn resolve(&self, url: &str) -> Result<TemplateText, TemplateError> {
        let mut html = self.source.read().await?;
        for transform in &self.transforms {
            html = transform.transform(url, html).await?;
        }
        validate(&html, &self.source.describe())?;
        Ok(TemplateText::from(html))
    }
}

type Fill = Shared<BoxFuture<'static, Result<TemplateText, TemplateError>>>;

/// Lifecycle of the production cache.
enum CacheState {
    Empty,
    /// One read is in flight; every caller awaits the same future.
    Filling { generation: u64, fill: Fill },
    Filled(TemplateText),
}

/// Observable cache status, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Empty,
    Filling,
    Filled,
}

struct Cache {
    state: CacheState,
    generation: u64,
}

/// Reads the built shell once and serves it for every URL.
///
/// Concurrent first requests share a single read. A failed read leaves the
/// cache empty so a later request can retry. [`invalidate`] returns the
/// cache to empty; a fill that was in flight at that moment still answers
/// its own waiters but is not stored.
///
/// [`invalidate`]: TemplateProvider::invalidate
pub struct ProdTemplateProvider {
    source: Arc<dyn TemplateSource>,
    cache: Mutex<Cache>,
    fills: Arc<AtomicUsize>,
}

impl ProdTemplateProvider {
    pub fn new(source: impl TemplateSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            cache: Mutex::new(Cache {
                state: CacheState::Empty,
                generation: 0,
            }),
            fills: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many times the source has been read.
    pub fn fill_count(&self) -> usize {
        self.fills.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> CacheStatus {
        match self.lock().state {
            CacheState::Empty => CacheStatus::Empty,
            CacheState::Filling { .. } => CacheStatus::Filling,
            CacheState::Filled(_) => CacheStatus::Filled,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_fill(&self) -> BoxFuture<'static, Result<TemplateText, TemplateError>> {
        let source = self.source.clone();
        let fills = self.fills.clone();
        async move {
            fills.fetch_add(1, Ordering::SeqCst);
            let html = source.read().await?;
            validate(&html, &source.describe())?;
            tracing::info!(template = %source.describe(), bytes = html.len(), "template cached");
            Ok(TemplateText::from(html))
        }
        .boxed()
    }
}

#[async_trait]
impl TemplateProvider for ProdTemplateProvider {
    async fn resolve(&self, _url: &str) -> Result<TemplateText, TemplateError> {
        let (generation, fill) = {
            let mut cache = self.lock();
            let in_flight = match &cache.state {
                CacheState::Filled(text) => return Ok(text.clone()),
                CacheState::Filling { generation, fill } => Some((*generation, fill.clone())),
                CacheState::Empty => None,
            };
            match in_flight {
                Some(in_flight) => in_flight,
                None => {
                    cache.generation += 1;
                    let generation = cache.generation;
                    let fill = self.start_fill().shared();
                    cache.state = CacheState::Filling {
                        generation,
                        fill: fill.clone(),
                    };
                    (generation, fill)
                }
            }
        };

        let result = fill.await;

        let mut cache = self.lock();
        let current = matches!(
            cache.state,
            CacheState::Filling { generation: g, .. } if g == generation
        );
        if current {
            cache.state = match &result {
                Ok(text) => CacheState::Filled(text.clone()),
                Err(_) => CacheState::Empty,
            };
        }
        result
    }

    fn invalidate(&self) {
        let mut cache = self.lock();
        cache.state = CacheState::Empty;
        tracing::info!(template = %self.source.describe(), "template cache invalidated");
    }
}

/// Provider for the configured mode.
pub fn provider_for(
    config: &SsrConfig,
    dev_transforms: Vec<Arc<dyn HtmlTransform>>,
) -> Arc<dyn TemplateProvider> {
    match config.mode {
        RenderMode::Development => Arc::new(
            DevTemplateProvider::new(FileSource::new(&config.template.source_path))
                .with_transforms(dev_transforms),
        ),
        RenderMode::Production => Arc::new(ProdTemplateProvider::new(FileSource::new(
            &config.template.dist_path,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScriptInjection, StaticSource};
    use std::time::Duration;

    const SHELL: &str = "<html><head><!--app-head--></head><body><div id=\"root\"><!--app-html--></div><!--app-initial-state--><!--app-initial-valtio-state--><!--app-data--></body></html>";

    struct SlowCountingSource {
        reads: Arc<AtomicUsize>,
        delay: Duration,
        fail_first: bool,
    }

    #[async_trait]
    impl TemplateSource for SlowCountingSource {
        async fn read(&self) -> Result<String, TemplateError> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail_first && n == 0 {
                return Err(TemplateError::Read {
                    path: "slow".into(),
                    message: "disk hiccup".to_string(),
                });
            }
            Ok(format!("{}<!-- read {} -->", SHELL, n))
        }

        fn describe(&self) -> String {
            "slow".to_string()
        }
    }

    fn slow(fail_first: bool) -> (Arc<AtomicUsize>, ProdTemplateProvider) {
        let reads = Arc::new(AtomicUsize::new(0));
        let provider = ProdTemplateProvider::new(SlowCountingSource {
            reads: reads.clone(),
            delay: Duration::from_millis(30),
            fail_first,
        });
        (reads, provider)
    }

    // === ProdTemplateProvider Tests ===

    #[tokio::test]
    async fn test_prod_single_flight_under_concurrency() {
        let (reads, provider) = slow(false);
        let provider = Arc::new(provider);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.resolve(&format!("/page/{}", i)).await })
            })
            .collect();

        let mut texts = Vec::new();
        for handle in handles {
            texts.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(provider.fill_count(), 1);
        assert!(texts.iter().all(|t| Arc::ptr_eq(t, &texts[0])));
        assert_eq!(provider.status(), CacheStatus::Filled);
    }

    #[tokio::test]
    async fn test_prod_invalidate_triggers_one_refill() {
        let (reads, provider) = slow(false);
        let first = provider.resolve("/").await.unwrap();
        provider.invalidate();
        assert_eq!(provider.status(), CacheStatus::Empty);

        let (a, b) = tokio::join!(provider.resolve("/a"), provider.resolve("/b"));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(reads.load(Ordering::SeqCst), 2);
        assert!(Arc::ptr_eq(&a, &b));
        assert_ne!(first, a);
    }

    #[tokio::test]
    async fn test_prod_failed_fill_is_not_cached() {
        let (reads, provider) = slow(true);
        let (a, b) = tokio::join!(provider.resolve("/"), provider.resolve("/"));
        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(provider.status(), CacheStatus::Empty);

        assert!(provider.resolve("/").await.is_ok());
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_during_fill_discards_result() {
        let (_reads, provider) = slow(false);
        let provider = Arc::new(provider);

        let pending = {
            let provider = provider.clone();
            tokio::spawn(async move { provider.resolve("/").await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(provider.status(), CacheStatus::Filling);
        provider.invalidate();

        assert!(pending.await.unwrap().is_ok());
        assert_eq!(provider.status(), CacheStatus::Empty);
    }

    #[tokio::test]
    async fn test_prod_requires_html_marker() {
        let provider = ProdTemplateProvider::new(StaticSource::new("<html></html>"));
        let err = provider.resolve("/").await.unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder(Placeholder::Html)));
    }

    // === DevTemplateProvider Tests ===

    #[tokio::test]
    async fn test_dev_rereads_every_call() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, SHELL.as_bytes()).unwrap();

        let provider = DevTemplateProvider::new(FileSource::new(file.path()));
        let before = provider.resolve("/").await.unwrap();

        std::fs::write(file.path(), SHELL.replace("root", "app")).unwrap();
        let after = provider.resolve("/").await.unwrap();

        assert!(before.contains("id=\"root\""));
        assert!(after.contains("id=\"app\""));
    }

    #[tokio::test]
    async fn test_dev_applies_transforms_in_order() {
        let provider = DevTemplateProvider::new(StaticSource::new(SHELL))
            .with_transform(ScriptInjection::module("/@vite/client"))
            .with_transform(ScriptInjection::module("/src/entry-client.tsx"));

        let html = provider.resolve("/about").await.unwrap();
        let client = html.find("/@vite/client").unwrap();
        let entry = html.find("/src/entry-client.tsx").unwrap();
        assert!(client < entry);
    }

    #[test]
    fn test_provider_for_mode() {
        let dev = SsrConfig::development();
        let prod = SsrConfig::production();
        // Both construct without touching the filesystem.
        let _ = provider_for(&dev, Vec::new());
        let _ = provider_for(&prod, Vec::new());
    }
}
