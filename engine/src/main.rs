// Turnstile conversation engine
// Main entry point for the turnstile binary

use clap::Parser;
use turnstile_engine::cli::{Cli, Command};
use turnstile_engine::config::Config;
use turnstile_engine::handlers::{
    handle_ask, handle_chat, handle_doctor, handle_history, handle_serve, OutputFormat,
};
use turnstile_engine::telemetry::{effective_level, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    init_telemetry_with_level(effective_level(cli.log.as_deref(), &config.core.log_level));

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Turnstile Engine v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Handle commands
    match cli.command {
        Command::Ask { query, intent } => {
            tracing::info!("Asking: {}", query);
            handle_ask(query, intent, &config, format).await
        }

        Command::Chat => handle_chat(&config, format).await,

        Command::History { limit } => {
            tracing::info!("Showing last {} turns", limit);
            handle_history(limit, &config, format).await
        }

        Command::Serve { bind } => {
            tracing::info!("Starting API server on {}", bind);
            handle_serve(bind, &config).await
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, format).await
        }
    }
}
