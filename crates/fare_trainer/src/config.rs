//! Application configuration
//!
//! Values come from three layers: built-in defaults, an optional TOML file
//! with `[paths]` and `[trainer]` sections, and command line flags applied by
//! the binary. `TAXI_FARE_DATA_DIR` replaces the default data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::trainer::FastTreeConfig;

/// Environment variable overriding `paths.data_dir`
pub const DATA_DIR_ENV: &str = "TAXI_FARE_DATA_DIR";

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    /// Relative names resolve against `data_dir`
    pub train_file: PathBuf,
    pub test_file: PathBuf,
    /// Where to persist the trained model; nothing is written when unset
    pub model_path: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Data"),
            train_file: PathBuf::from("taxi-fare-train.csv"),
            test_file: PathBuf::from("taxi-fare-test.csv"),
            model_path: None,
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub trainer: FastTreeConfig,
}

impl AppConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Apply `TAXI_FARE_DATA_DIR` from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any variable lookup.
    ///
    /// The data directory is only replaced while it still has its default
    /// value, so a directory set in the config file is kept.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.paths.data_dir != PathsConfig::default().data_dir {
            return;
        }
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            info!("{} overrides data directory: {}", DATA_DIR_ENV, dir);
            self.paths.data_dir = PathBuf::from(dir);
        }
    }

    pub fn train_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.train_file)
    }

    pub fn test_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.test_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.train_path(), Path::new("Data").join("taxi-fare-train.csv"));
        assert_eq!(config.test_path(), Path::new("Data").join("taxi-fare-test.csv"));
        assert!(config.paths.model_path.is_none());
        assert_eq!(config.trainer, FastTreeConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
            [paths]
            data_dir = "/srv/fares"
            model_path = "out/model.json"

            [trainer]
            number_of_trees = 10
            learning_rate = 0.1
        "#;
        let config = AppConfig::from_toml_str(toml, Path::new("test.toml")).unwrap();

        assert_eq!(config.train_path(), PathBuf::from("/srv/fares/taxi-fare-train.csv"));
        assert_eq!(config.paths.model_path, Some(PathBuf::from("out/model.json")));
        assert_eq!(config.trainer.number_of_trees, 10);
        assert_eq!(config.trainer.learning_rate, 0.1);
        assert_eq!(config.trainer.number_of_leaves, 20);
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml_str("[trainer]\nnumber_of_trees = \"many\"", Path::new("bad.toml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_toml_file("/nonexistent/taxi-fare.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_env_override() {
        let mut config = AppConfig::default();
        config.apply_env_overrides_from(|key| (key == DATA_DIR_ENV).then(|| "/data".to_string()));
        assert_eq!(config.test_path(), PathBuf::from("/data/taxi-fare-test.csv"));

        let mut config = AppConfig::default();
        config.apply_env_overrides_from(|_| Some(String::new()));
        assert_eq!(config.paths.data_dir, PathBuf::from("Data"));

        let mut config = AppConfig::default();
        config.paths.data_dir = PathBuf::from("/from/file");
        config.apply_env_overrides_from(|_| Some("/data".to_string()));
        assert_eq!(config.paths.data_dir, PathBuf::from("/from/file"));
    }
}
