//! Process-wide SSR configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selects which template provider and error detail policy a process uses.
///
/// Chosen once at startup and injected into the template provider and
/// renderer; never inspected from the environment mid-request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Re-resolve the template every request and allow detailed error bodies.
    Development,
    /// Load the built template once and cache it.
    #[default]
    Production,
}

impl RenderMode {
    pub fn is_development(self) -> bool {
        self == RenderMode::Development
    }
}

impl FromStr for RenderMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RenderMode::Development),
            "production" | "prod" => Ok(RenderMode::Production),
            other => Err(ConfigError::Invalid {
                key: "mode".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Where the HTML shell comes from in each mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Source shell read on every request in development.
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,

    /// Built shell read once in production.
    #[serde(default = "default_dist_path")]
    pub dist_path: PathBuf,
}

fn default_source_path() -> PathBuf {
    PathBuf::from("./index.html")
}

fn default_dist_path() -> PathBuf {
    PathBuf::from("./dist/client/index.html")
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            dist_path: default_dist_path(),
        }
    }
}

/// Renderer options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Stream markup as it is produced; `false` selects blocking mode.
    #[serde(default = "default_true")]
    pub streaming: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { streaming: true }
    }
}

/// Top-level configuration, loaded from `folio.toml` with environment overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsrConfig {
    #[serde(default)]
    pub mode: RenderMode,

    /// Requests whose path starts with this prefix bypass SSR entirely.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Deadline for the renderer to become ready, in milliseconds.
    #[serde(default = "default_render_deadline_ms")]
    pub render_deadline_ms: u64,

    #[serde(default)]
    pub template: TemplateConfig,

    #[serde(default)]
    pub render: RenderConfig,

    /// Permit error messages and cause chains in 500 bodies. Only honored
    /// in development; unset there means on. Production never exposes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose_errors: Option<bool>,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_render_deadline_ms() -> u64 {
    10_000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for SsrConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::default(),
            api_prefix: default_api_prefix(),
            render_deadline_ms: default_render_deadline_ms(),
            template: TemplateConfig::default(),
            render: RenderConfig::default(),
            expose_errors: None,
            host: default_host(),
            port: default_port(),
        }
    }
}

impl SsrConfig {
    /// Development defaults.
    pub fn development() -> Self {
        Self::default().with_mode(RenderMode::Development)
    }

    /// Production defaults.
    pub fn production() -> Self {
        Self::default()
    }

    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|err| match err {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: None,
            message: e.to_string(),
        })
    }

    /// Read `.env` if present, then apply `FOLIO_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        unless_missing(dotenvy::dotenv())?;
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply `FOLIO_*` overrides from an arbitrary lookup.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("FOLIO_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(prefix) = lookup("FOLIO_API_PREFIX") {
            self.api_prefix = prefix;
        }
        if let Some(ms) = lookup("FOLIO_RENDER_DEADLINE_MS") {
            self.render_deadline_ms = parse_value("FOLIO_RENDER_DEADLINE_MS", &ms)?;
        }
        if let Some(path) = lookup("FOLIO_TEMPLATE") {
            match self.mode {
                RenderMode::Development => self.template.source_path = PathBuf::from(path),
                RenderMode::Production => self.template.dist_path = PathBuf::from(path),
            }
        }
        if let Some(flag) = lookup("FOLIO_EXPOSE_ERRORS") {
            self.expose_errors = Some(parse_bool("FOLIO_EXPOSE_ERRORS", &flag)?);
        }
        if let Some(host) = lookup("FOLIO_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("FOLIO_PORT") {
            self.port = parse_value("FOLIO_PORT", &port)?;
        }
        Ok(self)
    }

    /// Set the render mode.
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the API bypass prefix.
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Set the render deadline.
    pub fn with_render_deadline_ms(mut self, ms: u64) -> Self {
        self.render_deadline_ms = ms;
        self
    }

    /// Set the development template path.
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template.source_path = path.into();
        self
    }

    /// Set the production template path.
    pub fn with_dist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template.dist_path = path.into();
        self
    }

    /// Choose streaming or blocking rendering.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.render.streaming = streaming;
        self
    }

    /// Explicitly allow or forbid detailed error bodies.
    pub fn with_expose_errors(mut self, expose: bool) -> Self {
        self.expose_errors = Some(expose);
        self
    }

    /// Render deadline as a duration.
    pub fn render_deadline(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.render_deadline_ms)
    }

    /// Whether 500 bodies may include the error message and cause chain.
    pub fn exposes_errors(&self) -> bool {
        self.mode.is_development() && self.expose_errors.unwrap_or(true)
    }

    /// The template path for the configured mode.
    pub fn template_path(&self) -> &Path {
        match self.mode {
            RenderMode::Development => &self.template.source_path,
            RenderMode::Production => &self.template.dist_path,
        }
    }

    /// Whether `path` is served by the API layer instead of SSR.
    pub fn is_api_path(&self, path: &str) -> bool {
        !self.api_prefix.is_empty() && path.starts_with(&self.api_prefix)
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn unless_missing<T>(loaded: dotenvy::Result<T>) -> Result<(), ConfigError> {
    match loaded {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ConfigError::Dotenv(err)),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config{}: {message}", path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    Parse {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },

    #[error("failed to load .env: {0}")]
    Dotenv(#[source] dotenvy::Error),
}
