// Turnstile provider servers
// Runs the search or summary JSON-RPC server

use clap::{Parser, Subcommand};
use provider_server::{rpc_router, serve, LlmSummarizer, SerperSearch};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use turnstile_engine::config::Config;
use turnstile_engine::llm::openai::OpenAIProvider;
use turnstile_engine::telemetry::{effective_level, init_telemetry_with_level};

/// Turnstile provider servers
#[derive(Parser, Debug)]
#[command(name = "turnstile-providers")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `search` backed by the Serper API
    Search {
        #[arg(long, default_value = "127.0.0.1:8001")]
        bind: SocketAddr,
    },

    /// Serve `summarize` backed by the configured chat model
    Summary {
        #[arg(long, default_value = "127.0.0.1:8002")]
        bind: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    init_telemetry_with_level(effective_level(cli.log.as_deref(), &config.core.log_level));

    let timeout = Duration::from_secs(config.providers.request_timeout_secs);

    match cli.command {
        Command::Search { bind } => {
            let backend = Arc::new(SerperSearch::from_config(&config.search_api, timeout));
            serve(rpc_router(backend), bind, "Search").await?;
        }
        Command::Summary { bind } => {
            let llm = Arc::new(OpenAIProvider::from_config(&config.llm.openai, timeout));
            let backend = Arc::new(LlmSummarizer::new(llm));
            serve(rpc_router(backend), bind, "Summary").await?;
        }
    }

    Ok(())
}
