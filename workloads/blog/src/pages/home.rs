//! Article list.

use std::sync::Arc;

use async_trait::async_trait;
use folio_sdk::prelude::*;

use super::{loaded, page_title};
use crate::data::{format_date, ArticleListItem, ContentSource};

pub fn article_list_key() -> QueryKey {
    QueryKey::new("articles")
}

pub struct HomeLoader {
    source: Arc<dyn ContentSource>,
}

impl HomeLoader {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Loader for HomeLoader {
    async fn load(&self, ctx: LoaderContext) -> LoaderResult {
        let source = &self.source;
        loaded(
            ctx.query
                .ensure_query_data(article_list_key(), move || source.articles())
                .await,
        )
    }
}

pub fn home_view() -> ViewHandle {
    view_fn(|scope, data| {
        let articles: Vec<ArticleListItem> = serde_json::from_value(data.clone())?;
        scope.head().set_title(page_title("Home"));

        if articles.is_empty() {
            return Ok(Fragment::leaf(
                r#"<section class="article-list"><p class="empty">No posts yet.</p></section>"#,
            ));
        }
        Ok(Fragment::leaf(format!(
            r#"<section class="article-list">{}</section>"#,
            articles.iter().map(render_list_item).collect::<String>()
        )))
    })
}

/// One row of an article list, shared with the drafts page.
pub fn render_list_item(article: &ArticleListItem) -> String {
    let tags: String = article
        .tags
        .iter()
        .map(|t| format!(r#"<span class="tag">{}</span>"#, html_escape(&t.name)))
        .collect();
    format!(
        r#"<article class="article-item"><a href="/detail/{id}"><h2>{title}</h2></a><time>{date}</time><div class="tags">{tags}</div></article>"#,
        id = article.id,
        title = html_escape(&article.title),
        date = format_date(&article.created_at),
    )
}
