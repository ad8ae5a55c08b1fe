//! Print the resolved template.

use anyhow::Result;
use folio_core::{Placeholder, RenderMode};
use folio_template::provider_for;
use serde_json::json;

use super::TemplateArgs;
use crate::context::Context;

/// Run the template command.
pub async fn run(args: TemplateArgs, ctx: &Context) -> Result<()> {
    let mut config = ctx.config.clone();
    if args.dev {
        config = config.with_mode(RenderMode::Development);
    }
    let path = ctx.resolve_path(config.template_path());
    ctx.output.debug(&format!("Reading {}", path.display()));

    config.template.source_path = ctx.resolve_path(&config.template.source_path);
    config.template.dist_path = ctx.resolve_path(&config.template.dist_path);
    let provider = provider_for(&config, folio_blog::dev_transforms());
    let html = provider.resolve(&args.url).await?;
    let missing = Placeholder::missing_from(&html);

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "path": path.display().to_string(),
            "mode": config.mode,
            "missing": missing.iter().map(|p| p.token()).collect::<Vec<_>>(),
            "html": &*html,
        }));
        return Ok(());
    }

    for placeholder in &missing {
        ctx.output.warn(&format!("Template has no {} marker", placeholder));
    }
    ctx.output.body(html.as_bytes())?;
    Ok(())
}
