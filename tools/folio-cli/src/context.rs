//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use folio_core::SsrConfig;

use crate::output::Output;

/// Config file names searched for, in order, from the working directory up.
pub const CONFIG_NAMES: [&str; 2] = ["folio.toml", ".folio.toml"];

/// Execution context for CLI commands.
pub struct Context {
    /// Effective configuration, environment overrides applied.
    pub config: SsrConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    pub output: Output,
    pub cwd: PathBuf,
}

impl Context {
    /// Load the config from `config_path`, or the nearest `folio.toml`, or
    /// defaults; then apply `.env` and `FOLIO_*` overrides.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config_path = match config_path {
            Some(path) => Some(PathBuf::from(path)),
            None => find_config(&cwd),
        };
        let config = match &config_path {
            Some(path) => {
                output.debug(&format!("Using config {}", path.display()));
                SsrConfig::load(path)?
            }
            None => {
                output.debug("No folio.toml found, using defaults");
                SsrConfig::default()
            }
        };
        let config = config.with_env_overrides()?;

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

/// Find the nearest config file in `start` or its ancestors.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_walks_up() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join("folio.toml"), "mode = \"production\"\n").unwrap();

        assert_eq!(find_config(&nested), Some(root.path().join("folio.toml")));
    }

    #[test]
    fn test_find_config_prefers_nearest() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("site");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join("folio.toml"), "").unwrap();
        std::fs::write(nested.join(".folio.toml"), "").unwrap();

        assert_eq!(find_config(&nested), Some(nested.join(".folio.toml")));
    }
}
