//! Where blog content comes from.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::{About, Article, ArticleListItem, TermCount};

/// Read access to blog content.
///
/// Loaders only see this trait; the storage behind it is up to the host.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Published articles, newest first.
    async fn articles(&self) -> anyhow::Result<Vec<ArticleListItem>>;

    /// A published article by id.
    async fn article(&self, id: u64) -> anyhow::Result<Option<Article>>;

    /// Unpublished articles, newest first.
    async fn drafts(&self) -> anyhow::Result<Vec<ArticleListItem>>;

    async fn about(&self) -> anyhow::Result<About>;

    /// Categories of published articles, by name.
    async fn categories(&self) -> anyhow::Result<Vec<TermCount>>;

    /// Tags of published articles, by name.
    async fn tags(&self) -> anyhow::Result<Vec<TermCount>>;
}

/// Content held in memory.
#[derive(Debug, Default)]
pub struct InMemoryContent {
    articles: RwLock<BTreeMap<u64, Article>>,
    about: RwLock<About>,
}

impl InMemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// A few articles to browse.
    pub fn sample() -> Self {
        let day = |d: u32| {
            Utc.with_ymd_and_hms(2025, 1, d, 9, 0, 0)
                .single()
                .unwrap_or_else(Utc::now)
        };
        Self::new()
            .with_article(
                Article::new(
                    1,
                    "Streaming server rendering",
                    "Send the shell first, then the rest of the page as it renders.",
                )
                .with_summary("How the page reaches the browser in pieces")
                .with_category(1, "Engineering")
                .with_tag(1, "ssr")
                .with_tag(2, "streaming")
                .with_created_at(day(10)),
            )
            .with_article(
                Article::new(
                    2,
                    "Hydrating state safely",
                    "Embedded state must never let a string close the script tag.",
                )
                .with_category(1, "Engineering")
                .with_tag(1, "ssr")
                .with_tag(3, "security")
                .with_created_at(day(14)),
            )
            .with_article(
                Article::new(3, "Notes on writing", "Short posts get read.")
                    .with_category(2, "Life")
                    .with_tag(4, "writing")
                    .with_created_at(day(20)),
            )
            .with_article(
                Article::new(4, "Upcoming: route loaders", "Work in progress.")
                    .with_category(1, "Engineering")
                    .with_created_at(day(25))
                    .draft(),
            )
    }

    pub fn with_article(self, article: Article) -> Self {
        self.insert(article);
        self
    }

    pub fn with_about(self, about: About) -> Self {
        *self.about.write().unwrap_or_else(PoisonError::into_inner) = about;
        self
    }

    /// Add or replace an article.
    pub fn insert(&self, article: Article) {
        self.articles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(article.id, article);
    }

    fn list(&self, published: bool) -> Vec<ArticleListItem> {
        let articles = self.articles.read().unwrap_or_else(PoisonError::into_inner);
        let mut items: Vec<_> = articles
            .values()
            .filter(|a| a.published == published)
            .map(Article::list_item)
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    fn count_terms<F, I>(&self, terms_of: F) -> Vec<TermCount>
    where
        F: Fn(&Article) -> I,
        I: IntoIterator<Item = (u64, String)>,
    {
        let articles = self.articles.read().unwrap_or_else(PoisonError::into_inner);
        let mut counts: BTreeMap<String, TermCount> = BTreeMap::new();
        for article in articles.values().filter(|a| a.published) {
            for (id, name) in terms_of(article) {
                counts
                    .entry(name.clone())
                    .or_insert(TermCount { id, name, count: 0 })
                    .count += 1;
            }
        }
        counts.into_values().collect()
    }
}

#[async_trait]
impl ContentSource for InMemoryContent {
    async fn articles(&self) -> anyhow::Result<Vec<ArticleListItem>> {
        Ok(self.list(true))
    }

    async fn article(&self, id: u64) -> anyhow::Result<Option<Article>> {
        let articles = self.articles.read().unwrap_or_else(PoisonError::into_inner);
        Ok(articles.get(&id).filter(|a| a.published).cloned())
    }

    async fn drafts(&self) -> anyhow::Result<Vec<ArticleListItem>> {
        Ok(self.list(false))
    }

    async fn about(&self) -> anyhow::Result<About> {
        Ok(self.about.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn categories(&self) -> anyhow::Result<Vec<TermCount>> {
        Ok(self.count_terms(|a| a.category.iter().map(|c| (c.id, c.name.clone())).collect::<Vec<_>>()))
    }

    async fn tags(&self) -> anyhow::Result<Vec<TermCount>> {
        Ok(self.count_terms(|a| a.tags.iter().map(|t| (t.id, t.name.clone())).collect::<Vec<_>>()))
    }
}
