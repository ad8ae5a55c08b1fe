//! Configuration commands.

use anyhow::{bail, Context as _, Result};
use folio_core::SsrConfig;

use super::{ConfigArgs, ConfigCommand};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Effective Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("source", &path.display().to_string()),
        None => ctx.output.kv("source", "defaults"),
    }
    ctx.output.kv("expose_errors", &ctx.config.exposes_errors().to_string());
    ctx.output.kv(
        "template",
        &ctx.resolve_path(ctx.config.template_path()).display().to_string(),
    );

    let rendered = toml::to_string_pretty(&ctx.config).context("Failed to render config")?;
    ctx.output.body(rendered.as_bytes())?;
    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let path = ctx.cwd.join(CONFIG_NAMES[0]);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let content = toml::to_string_pretty(&SsrConfig::default())?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    ctx.output.success(&format!("Wrote {}", path.display()));
    Ok(())
}
