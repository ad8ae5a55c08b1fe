//! About page.

use std::sync::Arc;

use async_trait::async_trait;
use folio_sdk::prelude::*;

use super::{loaded, page_title};
use crate::data::{About, ContentSource};

pub fn about_key() -> QueryKey {
    QueryKey::new("about")
}

pub struct AboutLoader {
    source: Arc<dyn ContentSource>,
}

impl AboutLoader {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Loader for AboutLoader {
    async fn load(&self, ctx: LoaderContext) -> LoaderResult {
        let source = &self.source;
        loaded(
            ctx.query
                .ensure_query_data(about_key(), move || source.about())
                .await,
        )
    }
}

pub fn about_view() -> ViewHandle {
    view_fn(|scope, data| {
        let about: About = serde_json::from_value(data.clone())?;
        scope.head().set_title(page_title(&about.title));
        if let Some(summary) = &about.summary {
            scope.head().add_meta("description", summary.clone());
        }

        let contacts: String = about
            .contact_methods
            .iter()
            .map(|c| {
                format!(
                    r#"<li class="contact-{kind}"><span>{label}</span> {value}</li>"#,
                    kind = html_escape(&c.kind),
                    label = html_escape(&c.label),
                    value = html_escape(&c.value),
                )
            })
            .collect();

        Ok(Fragment::leaf(format!(
            r#"<section class="about"><h1>{}</h1><div class="content">{}</div><ul class="contacts">{}</ul></section>"#,
            html_escape(&about.title),
            html_escape(&about.content),
            contacts
        )))
    })
}
