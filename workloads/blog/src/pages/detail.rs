//! Single article.

use std::sync::Arc;

use async_trait::async_trait;
use folio_sdk::prelude::*;

use super::{loaded, page_title};
use crate::data::{format_date, Article, ContentSource};

pub fn article_key(id: u64) -> QueryKey {
    QueryKey::new("article").with(id)
}

/// Loads `:id`; a missing, malformed or unpublished id is not found.
pub struct DetailLoader {
    source: Arc<dyn ContentSource>,
}

impl DetailLoader {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Loader for DetailLoader {
    async fn load(&self, ctx: LoaderContext) -> LoaderResult {
        let Some(id) = ctx.param("id").and_then(|id| id.parse::<u64>().ok()) else {
            return LoaderResult::NotFound;
        };

        let source = &self.source;
        let article = ctx
            .query
            .ensure_query_data(article_key(id), move || source.article(id))
            .await;
        match article {
            Ok(None) => LoaderResult::NotFound,
            other => loaded(other),
        }
    }
}

pub fn detail_view() -> ViewHandle {
    view_fn(|scope, data| {
        let article: Article = serde_json::from_value(data.clone())?;
        contribute_head(scope.head(), &article);

        let category = article
            .category
            .as_ref()
            .map(|c| format!(r#"<span class="category">{}</span>"#, html_escape(&c.name)))
            .unwrap_or_default();
        let tags: String = article
            .tags
            .iter()
            .map(|t| format!(r#"<span class="tag">#{}</span>"#, html_escape(&t.name)))
            .collect();

        Ok(Fragment::leaf(format!(
            r#"<article class="article"><header class="article-header"><h1>{title}</h1><div class="article-meta"><time datetime="{iso}">{date}</time>{category}<span class="views">{views} views</span></div></header><div class="article-content">{content}</div><footer class="article-tags">{tags}</footer><a href="/" class="back-link">Back to home</a></article>"#,
            title = html_escape(&article.title),
            iso = article.created_at.to_rfc3339(),
            date = format_date(&article.created_at),
            views = article.view_count,
            content = html_escape(&article.content),
        )))
    })
}

fn contribute_head(head: &HeadCollector, article: &Article) {
    let title = page_title(&article.title);
    let description = article.description().to_string();

    head.set_title(title.clone());
    head.add_meta("description", description.clone());
    head.add_property("og:title", title.clone());
    head.add_property("og:description", description.clone());
    head.add_property("og:type", "article");
    head.add_property("og:url", format!("/detail/{}", article.id));
    head.add_property("article:published_time", article.created_at.to_rfc3339());
    head.add_property("article:modified_time", article.updated_at.to_rfc3339());
    head.add_meta("twitter:card", "summary_large_image");
    head.add_meta("twitter:title", title);
    head.add_meta("twitter:description", description);
}
