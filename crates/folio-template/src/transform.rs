//! URL-keyed rewrites applied to the development shell.

use std::future::Future;

use async_trait::async_trait;

use crate::TemplateError;

/// A rewrite of the shell for a given request URL.
#[async_trait]
pub trait HtmlTransform: Send + Sync {
    fn name(&self) -> &str;

    async fn transform(&self, url: &str, html: String) -> Result<String, TemplateError>;
}

/// Inserts a `<script>` tag just before `</head>`.
///
/// Development shells use this to load the client entry and the live
/// reload client.
#[derive(Debug, Clone)]
pub struct ScriptInjection {
    src: String,
    module: bool,
}

impl ScriptInjection {
    pub fn module(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            module: true,
        }
    }

    pub fn classic(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            module: false,
        }
    }

    fn tag(&self) -> String {
        if self.module {
            format!(r#"<script type="module" src="{}"></script>"#, self.src)
        } else {
            format!(r#"<script src="{}"></script>"#, self.src)
        }
    }
}

#[async_trait]
impl HtmlTransform for ScriptInjection {
    fn name(&self) -> &str {
        "script-injection"
    }

    async fn transform(&self, _url: &str, html: String) -> Result<String, TemplateError> {
        let Some(at) = html.find("</head>") else {
            return Err(TemplateError::Transform {
                name: self.name().to_string(),
                message: "no </head> in template".to_string(),
            });
        };
        let mut out = String::with_capacity(html.len() + self.src.len() + 40);
        out.push_str(&html[..at]);
        out.push_str(&self.tag());
        out.push_str(&html[at..]);
        Ok(out)
    }
}

/// Transform backed by a closure.
pub struct FnTransform<F> {
    name: String,
    f: F,
}

/// Wrap a closure as a named [`HtmlTransform`].
pub fn transform_fn<F, Fut>(name: impl Into<String>, f: F) -> FnTransform<F>
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, TemplateError>> + Send + 'static,
{
    FnTransform {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<F, Fut> HtmlTransform for FnTransform<F>
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, TemplateError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn transform(&self, url: &str, html: String) -> Result<String, TemplateError> {
        (self.f)(url.to_string(), html).await
    }
}
