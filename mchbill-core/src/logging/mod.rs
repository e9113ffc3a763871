//! Logging subsystem
//!
//! Installs a `tracing` subscriber. Output goes to stderr so command output
//! on stdout (exports, listings) stays machine-readable. `RUST_LOG`
//! overrides the configured level.

use crate::config::LoggingConfig;
use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

mod error;
mod level;

pub use error::LoggingError;
pub use level::LogLevel;

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub with_timestamp: bool,
    pub with_target: bool,
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            with_timestamp: true,
            with_target: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Build from the `[logging]` section of the application config
    pub fn from_settings(settings: &LoggingConfig) -> Result<Self, LoggingError> {
        Ok(Self::new(settings.level.parse()?)
            .with_target(settings.with_target)
            .json_format(settings.json_format))
    }

    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.with_timestamp = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer().with_target(self.with_target).with_writer(io::stderr);
        match (self.json_format, self.with_timestamp) {
            (true, true) => base.json().boxed(),
            (true, false) => base.json().without_time().boxed(),
            (false, true) => base.boxed(),
            (false, false) => base.without_time().boxed(),
        }
    }
}

/// Initialize logging at `info`
pub fn init_logging() -> Result<(), LoggingError> {
    init_logging_with_config(LogConfig::default())
}

/// Initialize logging with a custom configuration
///
/// # Example
/// ```
/// use mchbill_core::logging::{init_logging_with_config, LogConfig, LogLevel};
///
/// let config = LogConfig::new(LogLevel::Debug).with_timestamp(false);
/// init_logging_with_config(config).expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    tracing_subscriber::registry()
        .with(config.layer())
        .with(env_filter)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}
