//! # Core Configuration Module
//!
//! Provides configuration management for the playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance holding runtime settings shared by every playback component.
//! It enforces fail-fast validation so misconfiguration surfaces at startup
//! rather than in the middle of a track change.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .event_buffer_size(256)
//!     .enable_scrobbling(false)
//!     .build()
//!     .expect("Failed to build config");
//!
//! assert!(config.features.enable_predictive_preparation);
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // A zero-sized event buffer cannot deliver any notification
//! let config = CoreConfig::builder()
//!     .event_buffer_size(0)
//!     .build()
//!     .expect("Should fail - empty event buffer");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use crate::logging::LoggingConfig;

/// Core configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Capacity of the playback event bus (per subscriber)
    pub event_buffer_size: usize,

    /// Feature flags
    pub features: FeatureFlags,

    /// Logging configuration applied by hosts that call `init_logging`
    pub logging: LoggingConfig,
}

impl CoreConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            features: FeatureFlags::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Feature flags control optional, best-effort functionality.
///
/// Disabling a flag removes the corresponding side effect from every playback
/// transition without changing the order of the remaining steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Warm up the decoder for the track expected to play next
    pub enable_predictive_preparation: bool,

    /// Notify the scrobble client about outgoing tracks
    pub enable_scrobbling: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_predictive_preparation: true,
            enable_scrobbling: true,
        }
    }
}

/// Builder for [`CoreConfig`].
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
    event_buffer_size: Option<usize>,
    features: FeatureFlags,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Set the event bus capacity.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Enable or disable predictive preparation of the next track.
    pub fn enable_predictive_preparation(mut self, enable: bool) -> Self {
        self.features.enable_predictive_preparation = enable;
        self
    }

    /// Enable or disable scrobbling of outgoing tracks.
    pub fn enable_scrobbling(mut self, enable: bool) -> Self {
        self.features.enable_scrobbling = enable;
        self
    }

    /// Set the logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the event buffer size is zero.
    pub fn build(self) -> Result<CoreConfig> {
        let event_buffer_size = self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        if event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be > 0 so playback notifications can be delivered"
                    .to_string(),
            ));
        }

        Ok(CoreConfig {
            event_buffer_size,
            features: self.features,
            logging: self.logging.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogFormat, LogLevel};

    #[test]
    fn test_builder_defaults() {
        let config = CoreConfig::builder().build().unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert!(config.features.enable_predictive_preparation);
        assert!(config.features.enable_scrobbling);
    }

    #[test]
    fn test_builder_overrides() {
        let config = CoreConfig::builder()
            .event_buffer_size(8)
            .enable_predictive_preparation(false)
            .enable_scrobbling(false)
            .logging(
                LoggingConfig::default()
                    .with_format(LogFormat::Compact)
                    .with_level(LogLevel::Warn),
            )
            .build()
            .unwrap();

        assert_eq!(config.event_buffer_size, 8);
        assert!(!config.features.enable_predictive_preparation);
        assert!(!config.features.enable_scrobbling);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let result = CoreConfig::builder().event_buffer_size(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
