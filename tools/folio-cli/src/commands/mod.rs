//! CLI command implementations.

pub mod config;
pub mod render;
pub mod template;

use clap::{Args, Subcommand};

/// A `name=value` argument that could not be split.
#[derive(Debug, thiserror::Error)]
#[error("expected NAME=VALUE, got `{0}`")]
pub struct PairError(String);

/// Parse `name=value`. The value may itself contain `=`.
pub fn parse_pair(arg: &str) -> Result<(String, String), PairError> {
    match arg.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(PairError(arg.to_string())),
    }
}

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// URL to render, path and query (e.g. `/detail/1?ref=home`).
    #[arg(default_value = "/")]
    pub url: String,

    /// Request cookie, repeatable (e.g. `--cookie token=abc`).
    #[arg(long = "cookie", value_parser = parse_pair)]
    pub cookies: Vec<(String, String)>,

    /// Request header, repeatable (e.g. `--header accept-language=en`).
    #[arg(short = 'H', long = "header", value_parser = parse_pair)]
    pub headers: Vec<(String, String)>,

    /// Render in development mode regardless of config.
    #[arg(long)]
    pub dev: bool,

    /// Render the whole page before writing anything.
    #[arg(long)]
    pub blocking: bool,

    /// Print status and headers only.
    #[arg(long)]
    pub head_only: bool,
}

/// Arguments for the template command.
#[derive(Args)]
pub struct TemplateArgs {
    /// URL the template is resolved for; development transforms may use it.
    #[arg(default_value = "/")]
    pub url: String,

    /// Resolve the development template regardless of config.
    #[arg(long)]
    pub dev: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Write a default folio.toml to the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
