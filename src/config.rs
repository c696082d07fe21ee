//! Configuration loading and management.
//!
//! Configuration is read from the first YAML file found among
//! `./planner-index/config.yaml` and `~/.planner-index/config.yaml`, then
//! environment overrides are applied:
//! - `PLANNER_INDEX_CONFIG_PATH` - explicit config file (skips discovery)
//! - `PLANNER_INDEX_TIME_ZONE` - timezone used for "today"
//! - `PLANNER_INDEX_DEFAULT_K` - default search result limit
//! - `PLANNER_INDEX_FORMAT` - output format (`json` or `markdown`)

use crate::dates::DEFAULT_TIME_ZONE;
use crate::format::OutputFormat;
use crate::types::DEFAULT_SEARCH_LIMIT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the project and user configuration directories.
const CONFIG_DIR_NAME: &str = "planner-index";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Snapshot index settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// IANA timezone used for "today" computations.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Default number of search results.
    #[serde(default = "default_k")]
    pub default_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            default_k: default_k(),
        }
    }
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_k() -> usize {
    DEFAULT_SEARCH_LIMIT
}

/// CLI output settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Candidate config files, highest priority first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_DIR_NAME).join("config.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{}", CONFIG_DIR_NAME)).join("config.yaml"));
        }
        paths
    }

    /// Load from the explicit path, or the first discovered file, or defaults;
    /// then apply environment overrides.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("PLANNER_INDEX_CONFIG_PATH").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::load(&path)?,
            None => Self::discover(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn discover() -> Self {
        for path in Self::search_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config");
                    return config;
                }
                Err(e) => warn!("Ignoring config file {}: {:#}", path.display(), e),
            }
        }
        Self::default()
    }

    /// Apply `PLANNER_INDEX_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(tz) = std::env::var("PLANNER_INDEX_TIME_ZONE")
            && !tz.trim().is_empty()
        {
            self.index.time_zone = tz;
        }

        if let Ok(k) = std::env::var("PLANNER_INDEX_DEFAULT_K") {
            match k.parse() {
                Ok(k) => self.index.default_k = k,
                Err(_) => warn!("Ignoring PLANNER_INDEX_DEFAULT_K={}: not a number", k),
            }
        }

        if let Ok(format) = std::env::var("PLANNER_INDEX_FORMAT") {
            match OutputFormat::from_str(&format) {
                Some(format) => self.output.format = format,
                None => warn!("Ignoring PLANNER_INDEX_FORMAT={}: unknown format", format),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.index.time_zone, "America/New_York");
        assert_eq!(config.index.default_k, 40);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "index:\n  time_zone: Europe/Paris").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.index.time_zone, "Europe/Paris");
        assert_eq!(config.index.default_k, 40);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_output_format_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "output:\n  format: markdown\nindex:\n  default_k: 5").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.output.format, OutputFormat::Markdown);
        assert_eq!(config.index.default_k, 5);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "index: [not, a, map").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(Config::load_or_default(Some(&missing)).is_err());
    }
}
