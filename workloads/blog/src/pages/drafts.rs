//! Unpublished articles, for signed-in readers only.

use std::sync::Arc;

use async_trait::async_trait;
use folio_sdk::prelude::*;

use super::{loaded, page_title, render_list_item};
use crate::data::{ArticleListItem, ContentSource};

pub const LOGIN_PATH: &str = "/login";

pub fn drafts_key() -> QueryKey {
    QueryKey::new("drafts")
}

/// Redirects to the login page unless the auth cookie has a value.
pub struct DraftsLoader {
    source: Arc<dyn ContentSource>,
}

impl DraftsLoader {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Loader for DraftsLoader {
    async fn load(&self, ctx: LoaderContext) -> LoaderResult {
        if !ctx.cookie(AUTH_COOKIE).is_some_and(|token| !token.is_empty()) {
            return LoaderResult::redirect(LOGIN_PATH);
        }
        let source = &self.source;
        loaded(
            ctx.query
                .ensure_query_data(drafts_key(), move || source.drafts())
                .await,
        )
    }
}

pub fn drafts_view() -> ViewHandle {
    view_fn(|scope, data| {
        let drafts: Vec<ArticleListItem> = serde_json::from_value(data.clone())?;
        scope.head().set_title(page_title("Drafts"));
        scope.head().add_meta("robots", "noindex");

        Ok(Fragment::leaf(format!(
            r#"<section class="article-list drafts"><h1>Drafts</h1>{}</section>"#,
            drafts.iter().map(render_list_item).collect::<String>()
        )))
    })
}
