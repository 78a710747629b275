/// Bot configuration: which channels are watched and how often they may be warned.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_COOLDOWN_SECS: u64 = 300;
pub const DEFAULT_SELF_DESTRUCT_SECS: u64 = 300;

/// Environment variable that forces debug mode (cooldowns disabled)
pub const DEBUG_ENV: &str = "CODEBLOCK_SENTRY_DEBUG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Channels subject to the per-channel cooldown
    pub cooldown_channels: Vec<u64>,
    /// Channels that are watched but never put on cooldown
    pub whitelist_channels: Vec<u64>,
    /// Categories whose channels are all watched (help channels)
    pub help_categories: Vec<u64>,
    pub cooldown_secs: u64,
    /// Lifetime of a guidance message before it deletes itself
    pub self_destruct_secs: u64,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cooldown_channels: Vec::new(),
            whitelist_channels: Vec::new(),
            help_categories: Vec::new(),
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            self_destruct_secs: DEFAULT_SELF_DESTRUCT_SECS,
            debug: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Path to the default config file: ~/.codeblock-sentry/config.json
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".codeblock-sentry").join("config.json"))
}

/// Load the config at `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str::<Config>(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        Config::default()
    };

    if std::env::var(DEBUG_ENV).map(|v| v == "1").unwrap_or(false) {
        config.debug = true;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.cooldown_secs, DEFAULT_COOLDOWN_SECS);
        assert_eq!(config.self_destruct_secs, DEFAULT_SELF_DESTRUCT_SECS);
        assert!(config.cooldown_channels.is_empty());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"cooldown_channels": [267624335836053506], "help_categories": [42]}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.cooldown_channels, vec![267624335836053506]);
        assert_eq!(config.help_categories, vec![42]);
        assert!(config.whitelist_channels.is_empty());
        assert_eq!(config.cooldown_secs, DEFAULT_COOLDOWN_SECS);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }
}
