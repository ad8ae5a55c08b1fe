//! Document head metadata.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Escape text for use in HTML content or a quoted attribute.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Head tags collected while rendering one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadContent {
    /// Page title. The last view to set it wins.
    pub title: Option<String>,
    /// `<meta name=.. content=..>` pairs.
    pub meta: Vec<(String, String)>,
    /// `<meta property=.. content=..>` pairs, for Open Graph.
    pub properties: Vec<(String, String)>,
    /// `<link rel=.. href=..>` pairs.
    pub links: Vec<(String, String)>,
    /// Inline script bodies.
    pub scripts: Vec<String>,
}

impl HeadContent {
    /// Create new head content with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_meta(mut self, name: &str, content: &str) -> Self {
        self.meta.push((name.to_string(), content.to_string()));
        self
    }

    pub fn with_property(mut self, property: &str, content: &str) -> Self {
        self.properties
            .push((property.to_string(), content.to_string()));
        self
    }

    pub fn with_stylesheet(mut self, href: &str) -> Self {
        self.links.push(("stylesheet".to_string(), href.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Render in title, meta, link, script order. Attribute values and the
    /// title are escaped; script bodies are emitted verbatim.
    pub fn render(&self) -> String {
        let mut html = String::new();

        if let Some(title) = &self.title {
            html.push_str(&format!("<title>{}</title>", html_escape(title)));
        }

        for (name, content) in &self.meta {
            html.push_str(&format!(
                r#"<meta name="{}" content="{}">"#,
                html_escape(name),
                html_escape(content)
            ));
        }

        for (property, content) in &self.properties {
            html.push_str(&format!(
                r#"<meta property="{}" content="{}">"#,
                html_escape(property),
                html_escape(content)
            ));
        }

        for (rel, href) in &self.links {
            html.push_str(&format!(
                r#"<link rel="{}" href="{}">"#,
                html_escape(rel),
                html_escape(href)
            ));
        }

        for script in &self.scripts {
            html.push_str(&format!("<script>{}</script>", script));
        }

        html
    }
}

/// Shared, request-scoped handle views use to contribute head tags.
///
/// Read once by the renderer when every segment has finished.
#[derive(Debug, Clone, Default)]
pub struct HeadCollector {
    inner: Arc<Mutex<HeadContent>>,
}

impl HeadCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HeadContent> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.lock().title = Some(title.into());
    }

    pub fn add_meta(&self, name: impl Into<String>, content: impl Into<String>) {
        self.lock().meta.push((name.into(), content.into()));
    }

    pub fn add_property(&self, property: impl Into<String>, content: impl Into<String>) {
        self.lock()
            .properties
            .push((property.into(), content.into()));
    }

    pub fn add_link(&self, rel: impl Into<String>, href: impl Into<String>) {
        self.lock().links.push((rel.into(), href.into()));
    }

    pub fn add_script(&self, body: impl Into<String>) {
        self.lock().scripts.push(body.into());
    }

    pub fn snapshot(&self) -> HeadContent {
        self.lock().clone()
    }

    pub fn render(&self) -> String {
        self.lock().render()
    }
}
