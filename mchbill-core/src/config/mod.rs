//! Configuration management for MCH Billing
//!
//! Defaults, TOML files and `MCHBILL_<SECTION>_<KEY>` environment overrides.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Categories that always have a bucket, even with no items
pub const DEFAULT_INPATIENT_CATEGORIES: &[&str] = &[
    "Admission",
    "Bed Charges",
    "Nursing Care",
    "Procedures",
    "Laboratory",
    "Discharge Medicine",
];

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persistence configuration
    pub storage: StorageConfig,

    /// Catalog configuration
    pub inventory: InventoryConfig,

    /// Account configuration
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one file per storage key
    pub data_dir: PathBuf,

    /// Encrypt stored values with a passphrase-derived key
    pub encrypt: bool,

    /// Inactivity after which the active session is dropped
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
}

/// Catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Inpatient categories kept present even when empty
    pub pinned_categories: Vec<String>,

    /// Baseline catalog used to seed an empty store
    pub seed_path: Option<PathBuf>,
}

/// Account configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Store new credentials as Argon2 hashes instead of as given
    pub hash_passwords: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            encrypt: false,
            idle_timeout: Duration::from_secs(15 * 60),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            pinned_categories: DEFAULT_INPATIENT_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            seed_path: None,
        }
    }
}

impl InventoryConfig {
    /// Configuration without pinned categories
    pub fn unpinned() -> Self {
        Self {
            pinned_categories: Vec::new(),
            seed_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: MCHBILL_<SECTION>_<KEY>
    /// Example: MCHBILL_STORAGE_DATA_DIR=/var/lib/mchbill
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MCHBILL_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Storage config
        if let Some(data_dir) = lookup("MCHBILL_STORAGE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }
        if let Some(encrypt) = lookup("MCHBILL_STORAGE_ENCRYPT") {
            self.storage.encrypt = encrypt
                .parse::<bool>()
                .map_err(|e| ConfigError::InvalidOverride {
                    var: "MCHBILL_STORAGE_ENCRYPT",
                    reason: e.to_string(),
                })?;
        }
        if let Some(timeout) = lookup("MCHBILL_STORAGE_IDLE_TIMEOUT") {
            self.storage.idle_timeout = humantime::parse_duration(&timeout)
                .map_err(|e| ConfigError::InvalidOverride {
                    var: "MCHBILL_STORAGE_IDLE_TIMEOUT",
                    reason: e.to_string(),
                })?;
        }

        // Inventory config
        if let Some(categories) = lookup("MCHBILL_INVENTORY_PINNED_CATEGORIES") {
            self.inventory.pinned_categories = categories
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(seed) = lookup("MCHBILL_INVENTORY_SEED_PATH") {
            self.inventory.seed_path = Some(PathBuf::from(seed));
        }

        // Auth config
        if let Some(hash) = lookup("MCHBILL_AUTH_HASH_PASSWORDS") {
            self.auth.hash_passwords = hash
                .parse::<bool>()
                .map_err(|e| ConfigError::InvalidOverride {
                    var: "MCHBILL_AUTH_HASH_PASSWORDS",
                    reason: e.to_string(),
                })?;
        }

        // Logging config
        if let Some(level) = lookup("MCHBILL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("MCHBILL_LOG_JSON") {
            self.logging.json_format = json
                .parse::<bool>()
                .map_err(|e| ConfigError::InvalidOverride {
                    var: "MCHBILL_LOG_JSON",
                    reason: e.to_string(),
                })?;
        }

        Ok(())
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.idle_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "idle_timeout must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for category in &self.inventory.pinned_categories {
            if category.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "pinned categories must not be blank".to_string(),
                ));
            }
            if !seen.insert(category.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Duplicate pinned category: {}",
                    category
                )));
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}
