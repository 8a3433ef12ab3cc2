//! Configuration management for the router simulation.
//!
//! Settings are loaded from a TOML file. A missing file is created with the
//! default configuration so the user has something to edit.

use gameplay_message_router::RouterConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

fn default_ticks() -> u64 {
    200
}

fn default_tick_interval() -> u64 {
    50 // 20 ticks per second
}

fn default_walkers() -> usize {
    6
}

fn default_guards() -> usize {
    4
}

fn default_world_size() -> f64 {
    128.0
}

fn default_hearing_radius() -> f64 {
    24.0
}

fn default_walker_speed() -> f64 {
    1.5
}

fn default_damage_every() -> u64 {
    10
}

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Router settings shared by the global and spatial routers
    #[serde(default)]
    pub router: RouterConfig,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// World simulation settings
    #[serde(default)]
    pub simulation: SimulationSettings,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Separate level for the router library; falls back to `level`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_level: Option<String>,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            router_level: None,
            json_format: false,
        }
    }
}

/// Shape of the simulated world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Number of ticks to run before shutting down
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Delay between ticks in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Walkers emitting footstep noise
    #[serde(default = "default_walkers")]
    pub walkers: usize,
    /// Guards listening for noise
    #[serde(default = "default_guards")]
    pub guards: usize,
    /// Edge length of the square world, centered on the origin
    #[serde(default = "default_world_size")]
    pub world_size: f64,
    /// How far a guard hears footsteps
    #[serde(default = "default_hearing_radius")]
    pub hearing_radius: f64,
    /// Walker speed in meters per tick
    #[serde(default = "default_walker_speed")]
    pub walker_speed: f64,
    /// A damage event goes through the combat pipeline every this many ticks
    #[serde(default = "default_damage_every")]
    pub damage_every: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            tick_interval_ms: default_tick_interval(),
            walkers: default_walkers(),
            guards: default_guards(),
            world_size: default_world_size(),
            hearing_radius: default_hearing_radius(),
            walker_speed: default_walker_speed(),
            damage_every: default_damage_every(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, writing the default configuration
    /// there first if the file does not exist.
    pub async fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Checks the merged configuration for values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        self.router.validate().map_err(|e| e.to_string())?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }
        if let Some(router_level) = &self.logging.router_level {
            if !valid_levels.contains(&router_level.as_str()) {
                return Err(format!(
                    "Invalid router log level: {router_level}. Must be one of: {valid_levels:?}"
                ));
            }
        }

        let sim = &self.simulation;
        if !(sim.world_size.is_finite() && sim.world_size > 0.0) {
            return Err(format!("World size must be positive, got {}", sim.world_size));
        }
        if !(sim.hearing_radius.is_finite() && sim.hearing_radius >= 0.0) {
            return Err(format!(
                "Hearing radius must be zero or positive, got {}",
                sim.hearing_radius
            ));
        }
        if !sim.walker_speed.is_finite() {
            return Err("Walker speed must be finite".to_string());
        }
        if sim.damage_every == 0 {
            return Err("damage_every must be at least 1".to_string());
        }

        Ok(())
    }
}
