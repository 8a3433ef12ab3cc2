//! Router configuration.
//!
//! Configuration is fixed when a router is created. The spatial grid cell size
//! in particular cannot change afterwards, since every cell id depends on it.

use crate::error::ConfigValidationError;
use crate::tag::{ChannelTag, DEFAULT_CHANNEL};
use serde::{Deserialize, Serialize};

/// Default edge length of a spatial grid cell, in world meters.
pub const DEFAULT_CELL_SIZE: f64 = 16.0;

/// Complete router configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Log every broadcast at info level, including the payload
    #[serde(default)]
    pub log_messages: bool,
    /// Channel used by the "simple" register and broadcast helpers
    #[serde(default = "default_channel_name")]
    pub default_channel: String,
    /// Spatial grid configuration
    #[serde(default)]
    pub spatial: SpatialConfig,
}

/// Spatial grid configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialConfig {
    /// Edge length of a grid cell, in world meters
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
    /// Warn when a single listener overlaps more cells than this
    #[serde(default = "default_overlap_warning_threshold")]
    pub overlap_warning_threshold: usize,
    /// Upper bound on the cells a single listener may overlap. Larger radii
    /// are clamped before any cell is touched.
    #[serde(default = "default_max_cells_per_listener")]
    pub max_cells_per_listener: usize,
}

fn default_channel_name() -> String {
    DEFAULT_CHANNEL.to_string()
}

fn default_cell_size() -> f64 {
    DEFAULT_CELL_SIZE
}

fn default_overlap_warning_threshold() -> usize {
    256
}

fn default_max_cells_per_listener() -> usize {
    4096
}

/// Smallest accepted cell cap: a 3x3 block around the listener.
pub const MIN_CELLS_PER_LISTENER: usize = 9;

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            log_messages: false,
            default_channel: default_channel_name(),
            spatial: SpatialConfig::default(),
        }
    }
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
            overlap_warning_threshold: default_overlap_warning_threshold(),
            max_cells_per_listener: default_max_cells_per_listener(),
        }
    }
}

impl RouterConfig {
    /// Enables or disables per-broadcast message logging
    pub fn with_log_messages(mut self, enabled: bool) -> Self {
        self.log_messages = enabled;
        self
    }

    /// Sets the channel used by the "simple" helpers
    pub fn with_default_channel(mut self, channel: impl Into<String>) -> Self {
        self.default_channel = channel.into();
        self
    }

    /// Sets the spatial grid cell size
    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.spatial.cell_size = cell_size;
        self
    }

    /// Sets the cap on cells a single spatial listener may overlap
    pub fn with_max_cells_per_listener(mut self, max_cells: usize) -> Self {
        self.spatial.max_cells_per_listener = max_cells;
        self
    }

    /// The default channel as a tag. Falls back to the built-in channel if the
    /// configured name does not parse.
    pub fn default_channel_tag(&self) -> ChannelTag {
        ChannelTag::parse(&self.default_channel)
            .ok()
            .filter(|tag| !tag.is_empty())
            .unwrap_or_else(ChannelTag::default_channel)
    }

    /// Validates the configuration and returns the first problem found
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.spatial.cell_size.is_finite() || self.spatial.cell_size <= 0.0 {
            return Err(ConfigValidationError::InvalidCellSize(self.spatial.cell_size));
        }

        if self.spatial.overlap_warning_threshold == 0 {
            return Err(ConfigValidationError::InvalidOverlapThreshold);
        }

        if self.spatial.max_cells_per_listener < MIN_CELLS_PER_LISTENER {
            return Err(ConfigValidationError::InvalidMaxCells(
                self.spatial.max_cells_per_listener,
            ));
        }

        match ChannelTag::parse(&self.default_channel) {
            Ok(tag) if !tag.is_empty() => Ok(()),
            Ok(_) => Err(ConfigValidationError::InvalidDefaultChannel(
                "default channel cannot be empty".to_string(),
            )),
            Err(e) => Err(ConfigValidationError::InvalidDefaultChannel(e.to_string())),
        }
    }
}

/// Preset configurations for common use cases
pub mod presets {
    use super::*;

    /// Development configuration: every broadcast is logged
    pub fn development() -> RouterConfig {
        RouterConfig::default().with_log_messages(true)
    }

    /// Testing configuration: small cells so tests cross boundaries quickly
    pub fn testing() -> RouterConfig {
        RouterConfig::default().with_cell_size(4.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RouterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.spatial.cell_size, 16.0);
        assert_eq!(config.default_channel_tag(), ChannelTag::new("Message"));
        assert!(!config.log_messages);
    }

    #[test]
    fn rejects_bad_cell_size() {
        assert!(RouterConfig::default().with_cell_size(0.0).validate().is_err());
        assert!(RouterConfig::default().with_cell_size(-3.0).validate().is_err());
        assert!(RouterConfig::default().with_cell_size(f64::NAN).validate().is_err());
    }

    #[test]
    fn rejects_tiny_cell_cap() {
        assert!(RouterConfig::default().with_max_cells_per_listener(4).validate().is_err());
        assert!(RouterConfig::default()
            .with_max_cells_per_listener(MIN_CELLS_PER_LISTENER)
            .validate()
            .is_ok());
    }

    #[test]
    fn rejects_bad_default_channel() {
        assert!(RouterConfig::default().with_default_channel("").validate().is_err());
        assert!(RouterConfig::default().with_default_channel("A..B").validate().is_err());

        let config = RouterConfig::default().with_default_channel("Game.Events");
        assert!(config.validate().is_ok());
        assert_eq!(config.default_channel_tag(), ChannelTag::new("Game.Events"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: RouterConfig = serde_json::from_str(r#"{ "log_messages": true }"#)
            .expect("partial config should deserialize");
        assert!(config.log_messages);
        assert_eq!(config.default_channel, "Message");
        assert_eq!(config.spatial, SpatialConfig::default());
    }

    #[test]
    fn presets_validate() {
        assert!(presets::development().validate().is_ok());
        assert!(presets::development().log_messages);
        assert!(presets::testing().validate().is_ok());
    }
}
