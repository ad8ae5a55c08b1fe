//! Site chrome around every page.

use folio_sdk::prelude::*;

use super::SITE_NAME;

/// Header and footer wrapped around the matched page.
///
/// Reads the hydrated global and store slices, so the markup matches what
/// the client renders from the embedded state.
pub fn layout_view() -> ViewHandle {
    view_fn(|scope, _| {
        scope.head().set_title(SITE_NAME);
        scope.head().add_link("stylesheet", "/assets/blog.css");

        let theme = match scope.store().theme {
            Theme::Light => "light",
            Theme::Dark => "dark",
        };
        let account = match &scope.global().user {
            Some(user) if user.is_logged_in => format!(
                r#"<span class="user">Hi, {}</span>"#,
                html_escape(user.name.as_deref().unwrap_or("reader"))
            ),
            _ => r#"<a href="/login" class="sign-in">Sign in</a>"#.to_string(),
        };

        Ok(Fragment::wrap(
            format!(
                r#"<div class="app" data-theme="{theme}"><header class="site-header"><a href="/" class="logo">{site}</a><nav class="site-nav"><a href="/">Home</a><a href="/categories">Categories</a><a href="/tags">Tags</a><a href="/about">About</a></nav>{account}</header><main class="container">"#,
                site = html_escape(SITE_NAME),
            ),
            format!(
                r#"</main><footer class="site-footer"><p>{}</p></footer></div>"#,
                html_escape(&scope.store().title)
            ),
        ))
    })
}
