//! Category and tag indexes.

use std::sync::Arc;

use async_trait::async_trait;
use folio_sdk::prelude::*;

use super::{loaded, page_title};
use crate::data::{ContentSource, TermCount};

/// Which taxonomy a page lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Taxonomy {
    Categories,
    Tags,
}

impl Taxonomy {
    pub fn key(self) -> QueryKey {
        match self {
            Taxonomy::Categories => QueryKey::new("categories"),
            Taxonomy::Tags => QueryKey::new("tags"),
        }
    }

    fn title(self) -> &'static str {
        match self {
            Taxonomy::Categories => "Categories",
            Taxonomy::Tags => "Tags",
        }
    }
}

pub struct TaxonomyLoader {
    source: Arc<dyn ContentSource>,
    taxonomy: Taxonomy,
}

impl TaxonomyLoader {
    pub fn new(source: Arc<dyn ContentSource>, taxonomy: Taxonomy) -> Self {
        Self { source, taxonomy }
    }
}

#[async_trait]
impl Loader for TaxonomyLoader {
    async fn load(&self, ctx: LoaderContext) -> LoaderResult {
        let source = &self.source;
        let taxonomy = self.taxonomy;
        let terms = ctx
            .query
            .ensure_query_data(taxonomy.key(), move || async move {
                match taxonomy {
                    Taxonomy::Categories => source.categories().await,
                    Taxonomy::Tags => source.tags().await,
                }
            })
            .await;
        loaded(terms)
    }
}

pub fn taxonomy_view(taxonomy: Taxonomy) -> ViewHandle {
    view_fn(move |scope, data| {
        let terms: Vec<TermCount> = serde_json::from_value(data.clone())?;
        scope.head().set_title(page_title(taxonomy.title()));

        let items: String = terms
            .iter()
            .map(|t| {
                format!(
                    r#"<li data-id="{}"><span class="name">{}</span><span class="count">{}</span></li>"#,
                    t.id,
                    html_escape(&t.name),
                    t.count
                )
            })
            .collect();
        Ok(Fragment::leaf(format!(
            r#"<section class="taxonomy"><h1>{}</h1><ul>{}</ul></section>"#,
            taxonomy.title(),
            items
        )))
    })
}
