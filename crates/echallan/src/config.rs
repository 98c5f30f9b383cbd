//! Configuration management for echallan.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "echallan";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "rto.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ECHALLAN_`, sections split on `__`)
/// 2. TOML config file at `~/.config/echallan/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Face-match policy configuration.
    pub matching: MatchingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Directory of static frontend files served at `/`, if any.
    pub static_dir: Option<PathBuf>,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/echallan/rto.db`
    pub database_path: Option<PathBuf>,
    /// Seed reference data and drivers into empty tables on open.
    pub seed_on_open: bool,
    /// Number of generated drivers added after the fixed ones.
    pub random_drivers: u32,
    /// RNG seed for generated drivers; random when unset.
    pub seed_rng: Option<u64>,
}

/// Face-match policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// A driver matches only when its distance is strictly below this.
    pub threshold: f32,
    /// Distance reported for the demo fallback driver.
    pub demo_distance: f32,
    /// Fall back to a demo driver when nothing matches.
    pub demo_fallback: bool,
    /// Expected descriptor length.
    pub descriptor_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            seed_on_open: true,
            random_drivers: 500,
            seed_rng: None,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            demo_distance: 0.35,
            demo_fallback: true,
            descriptor_len: 128,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ECHALLAN_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::ConfigValidation {
                message: "server.port must be greater than 0".to_string(),
            });
        }

        if self.matching.threshold.is_nan() || self.matching.threshold <= 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "matching.threshold must be positive, got {}",
                    self.matching.threshold
                ),
            });
        }

        if self.matching.demo_distance.is_nan() || self.matching.demo_distance < 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "matching.demo_distance cannot be negative, got {}",
                    self.matching.demo_distance
                ),
            });
        }

        if self.matching.descriptor_len == 0 {
            return Err(Error::ConfigValidation {
                message: "matching.descriptor_len must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the socket address the server binds to.
    ///
    /// # Errors
    ///
    /// Returns an error if `server.host` is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|e| Error::ConfigValidation {
            message: format!("invalid bind address {addr}: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.port, 3000);
        assert!(config.storage.seed_on_open);
        assert!(config.matching.demo_fallback);
    }

    #[test]
    fn test_default_storage_config() {
        let storage = StorageConfig::default();

        assert!(storage.database_path.is_none());
        assert_eq!(storage.random_drivers, 500);
        assert!(storage.seed_rng.is_none());
    }

    #[test]
    fn test_default_matching_config() {
        let matching = MatchingConfig::default();

        assert!((matching.threshold - 0.5).abs() < f32::EPSILON);
        assert!((matching.demo_distance - 0.35).abs() < f32::EPSILON);
        assert_eq!(matching.descriptor_len, 128);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("server.port"));
    }

    #[test]
    fn test_validate_non_positive_threshold() {
        let mut config = Config::default();
        config.matching.threshold = 0.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("matching.threshold"));
    }

    #[test]
    fn test_validate_negative_demo_distance() {
        let mut config = Config::default();
        config.matching.demo_distance = -0.1;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("matching.demo_distance"));
    }

    #[test]
    fn test_validate_zero_descriptor_len() {
        let mut config = Config::default();
        config.matching.descriptor_len = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config.database_path().to_string_lossy().contains("rto.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/rto.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/rto.sqlite")
        );
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        let addr = config.bind_addr().unwrap();
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_bind_addr_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not a host".to_string();
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("echallan"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 8088\n\n[matching]\nthreshold = 0.6\ndemo_fallback = false\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.server.port, 8088);
        assert!((config.matching.threshold - 0.6).abs() < f32::EPSILON);
        assert!(!config.matching.demo_fallback);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_toml_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[matching]\nthreshold = -1.0\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"random_drivers": 25, "seed_rng": 7}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.random_drivers, 25);
        assert_eq!(storage.seed_rng, Some(7));
        assert!(storage.seed_on_open);
    }
}
