//! `opq.toml` settings. Every key is optional; command-line flags win.
//!
//! ```toml
//! [query]
//! default_time_field = "timestamp"
//! default_from = "now-1h"
//! default_to = "now"
//! format = "viz"
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    #[serde(default = "default_time_field")]
    pub default_time_field: String,
    #[serde(default = "default_from")]
    pub default_from: String,
    #[serde(default = "default_to")]
    pub default_to: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_time_field: default_time_field(),
            default_from: default_from(),
            default_to: default_to(),
            format: default_format(),
        }
    }
}

fn default_time_field() -> String {
    op_query::DEFAULT_TIME_FIELD.to_string()
}
fn default_from() -> String {
    "now-15m".to_string()
}
fn default_to() -> String {
    "now".to_string()
}
fn default_format() -> String {
    "viz".to_string()
}

/// Load `path`, falling back to defaults when the file does not exist.
pub fn load(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: Config = toml::from_str("[query]\ndefault_time_field = \"timestamp\"\n").unwrap();
        assert_eq!(cfg.query.default_time_field, "timestamp");
        assert_eq!(cfg.query.default_from, "now-15m");
        assert_eq!(cfg.query.default_to, "now");
        assert_eq!(cfg.query.format, "viz");
    }

    #[test]
    fn test_empty_config() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.query.default_time_field, "utc_time");
    }

    #[test]
    fn test_missing_file_is_default() {
        let cfg = load(Path::new("/nonexistent/opq.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }
}
