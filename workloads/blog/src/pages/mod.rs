//! Route loaders and views.

mod about;
mod detail;
mod drafts;
mod home;
mod layout;
mod taxonomy;

pub use about::*;
pub use detail::*;
pub use drafts::*;
pub use home::*;
pub use layout::*;
pub use taxonomy::*;

use folio_sdk::prelude::{LoaderResult, QueryError};
use serde::Serialize;

/// Site name, appended to every page title.
pub const SITE_NAME: &str = "Simple Blog";

fn loaded<T: Serialize>(result: Result<T, QueryError>) -> LoaderResult {
    match result {
        Ok(value) => LoaderResult::data(value),
        Err(err) => LoaderResult::error(err),
    }
}

fn page_title(title: &str) -> String {
    format!("{} - {}", title, SITE_NAME)
}
