//! Main application logic and lifecycle management.
//!
//! The `Application` loads and validates configuration, builds the simulated
//! world, runs it until the configured tick count (or a shutdown signal) and
//! reports router statistics at the end.

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::logging::display_banner;
use crate::signals::wait_for_shutdown_signal;
use crate::world::{SimWorld, SimulationReport};
use anyhow::{anyhow, Context};
use gameplay_message_router::RouterStats;
use std::time::Duration;
use tracing::{info, warn};

pub struct Application {
    config: AppConfig,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    pub async fn new(args: CliArgs) -> anyhow::Result<Self> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path)
            .await
            .with_context(|| format!("failed to load {}", args.config_path.display()))?;

        Self::apply_overrides(&mut config, &args);

        config
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {e}"))?;
        info!("✅ Configuration loaded and validated successfully");

        display_banner();
        Ok(Self { config })
    }

    fn apply_overrides(config: &mut AppConfig, args: &CliArgs) {
        if let Some(log_level) = &args.log_level {
            config.logging.level = log_level.clone();
        }
        if args.json_logs {
            config.logging.json_format = true;
        }
        if let Some(ticks) = args.ticks {
            config.simulation.ticks = ticks;
        }
        if args.log_messages {
            config.router.log_messages = true;
        }
    }

    /// Runs the simulation to completion, or until a shutdown signal arrives.
    pub async fn run(self) -> anyhow::Result<SimulationReport> {
        info!("🌟 Starting router simulation");
        self.log_configuration_summary();

        let settings = self.config.simulation.clone();
        let mut world = SimWorld::new(&self.config.router, &settings);
        let tick_interval = Duration::from_millis(settings.tick_interval_ms);

        info!("🛑 Press Ctrl+C to stop early");
        let simulation = async {
            for tick in 1..=settings.ticks {
                world.tick(tick);
                if !tick_interval.is_zero() {
                    tokio::time::sleep(tick_interval).await;
                }
            }
        };

        tokio::select! {
            _ = simulation => info!("✅ Simulation finished after {} ticks", settings.ticks),
            signal = wait_for_shutdown_signal() => match signal {
                Ok(()) => info!("🛑 Shutdown signal received, stopping simulation early"),
                Err(e) => warn!("⚠️ Signal handling failed, stopping simulation: {}", e),
            },
        }

        let report = world.finish().await;
        log_report(&report);
        Ok(report)
    }

    fn log_configuration_summary(&self) {
        let sim = &self.config.simulation;
        info!("📋 Configuration Summary:");
        info!("  🏷️ Default channel: {}", self.config.router.default_channel);
        info!("  📐 Grid cell size: {} m", self.config.router.spatial.cell_size);
        info!("  📨 Log every message: {}", self.config.router.log_messages);
        info!(
            "  🗺️ World: {} m | {} walkers | {} guards (hearing {} m)",
            sim.world_size, sim.walkers, sim.guards, sim.hearing_radius
        );
        info!("  ⏱️ {} ticks every {} ms", sim.ticks, sim.tick_interval_ms);
    }
}

fn log_router_stats(name: &str, stats: &RouterStats) {
    info!(
        "  {} router: {} broadcasts | {} deliveries ({:.2}/broadcast) | {} cancelled | {} interrupted | {} listeners",
        name,
        stats.broadcasts,
        stats.deliveries,
        stats.deliveries_per_broadcast(),
        stats.cancelled_broadcasts,
        stats.interrupted_broadcasts,
        stats.active_listeners
    );
}

fn log_report(report: &SimulationReport) {
    info!("📊 Final Simulation Report:");
    info!("  Ticks simulated: {}", report.ticks);
    info!("  Footsteps heard: {}", report.footsteps_heard);
    info!("  Guard alerts: {}", report.alerts);
    info!(
        "  Damage applied: {} | Hits absorbed by shields: {}",
        report.damage_applied, report.hits_blocked
    );
    for (name, health) in &report.health {
        info!("  {}: {} hp", name, health);
    }
    log_router_stats("Global", &report.global);
    log_router_stats("Spatial", &report.spatial);
}
