//! # Router Simulation - Main Entry Point
//!
//! Drives the gameplay message router with a small simulated world: walkers
//! make noise that guards hear through the spatial router, and a combat
//! pipeline on the global router exercises priorities, payload overrides and
//! interruption.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! router_sim
//!
//! # Specify custom configuration
//! router_sim --config arena.toml
//!
//! # Override specific settings
//! router_sim --ticks 500 --log-level debug --log-messages
//!
//! # JSON logging
//! router_sim --json-logs
//! ```
//!
//! ## Configuration
//!
//! The simulation loads configuration from a TOML file (default:
//! `router_sim.toml`). If the file doesn't exist, a default configuration
//! will be created.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;
pub mod world;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Runs the simulation with the command-line arguments of the process.
///
/// # Exit Codes
///
/// * **0**: The simulation ran to completion or was stopped by a signal
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let mut logging_settings = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default()
        .logging;
    if let Some(level) = &args.log_level {
        logging_settings.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&logging_settings, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use config::{LoggingSettings, SimulationSettings};
pub use world::{SimWorld, SimulationReport};
