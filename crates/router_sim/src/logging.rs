//! Logging system setup and configuration.
//!
//! Initializes the tracing-based logging system with either human-readable or
//! JSON output. The router library can log at its own level, which keeps
//! per-registration debug lines out of an otherwise debug-level run.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing target of the router library.
const ROUTER_TARGET: &str = "gameplay_message_router";

/// Filter used when `RUST_LOG` is not set.
fn default_directives(config: &LoggingSettings) -> String {
    let router_level = config.router_level.as_deref().unwrap_or(&config.level);
    format!("{},{}={}", config.level, ROUTER_TARGET, router_level)
}

/// Initializes the logging system.
///
/// # Arguments
///
/// * `config` - Logging configuration from the config file
/// * `json_format` - Whether to force JSON output format (CLI override)
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn setup_logging(
    config: &LoggingSettings,
    json_format: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let directives = default_directives(config);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let registry = tracing_subscriber::registry().with(filter);

    if json_format || config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    info!("🔧 Logging initialized with filter: {}", directives);
    Ok(())
}

/// Displays the startup banner.
pub fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    info!("╔══════════════════════════════════════════╗");
    info!("║        📨 GAMEPLAY MESSAGE ROUTER        ║");
    info!("║           Simulation v{:<19}║", version);
    info!("║                                          ║");
    info!("║  🎯 Priority-Ordered Listeners           ║");
    info!("║  🏷️  Hierarchical Channels                ║");
    info!("║  📍 Spatial Grid Routing                 ║");
    info!("║                                          ║");
    info!("╚══════════════════════════════════════════╝");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_level_defaults_to_app_level() {
        let settings = LoggingSettings {
            level: "debug".to_string(),
            ..LoggingSettings::default()
        };
        assert_eq!(default_directives(&settings), "debug,gameplay_message_router=debug");
    }

    #[test]
    fn router_level_can_be_quieter() {
        let settings = LoggingSettings {
            level: "debug".to_string(),
            router_level: Some("warn".to_string()),
            json_format: false,
        };
        assert_eq!(default_directives(&settings), "debug,gameplay_message_router=warn");
        assert!(EnvFilter::try_new(default_directives(&settings)).is_ok());
    }
}
