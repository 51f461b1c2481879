//! CLI interface for Turnstile
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for driving conversation turns.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Turnstile conversation engine
///
/// Routes each query to search, summarize, or a question about earlier
/// turns, and keeps every turn in a local history file.
#[derive(Parser, Debug)]
#[command(name = "turnstile")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one query as a new or replayed turn
    Ask {
        /// The query text
        query: String,

        /// Skip classification (search, summarize, conversation_query)
        #[arg(short, long)]
        intent: Option<String>,
    },

    /// Read queries from stdin until `exit`, `quit` or end of input
    Chat,

    /// Show recent turns
    History {
        /// Number of turns to show (default: 10)
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5001")]
        bind: SocketAddr,
    },

    /// Validate configuration and probe the provider servers
    Doctor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["turnstile", "doctor"]);
        assert!(matches!(cli.command, Command::Doctor));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["turnstile", "--json", "--log", "debug", "chat"]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
        assert!(matches!(cli.command, Command::Chat));
    }

    #[test]
    fn test_ask_command() {
        let cli = Cli::parse_from(["turnstile", "ask", "What is AI?", "--intent", "search"]);
        if let Command::Ask { query, intent } = cli.command {
            assert_eq!(query, "What is AI?");
            assert_eq!(intent.as_deref(), Some("search"));
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_history_command() {
        let cli = Cli::parse_from(["turnstile", "history", "--limit", "20"]);
        if let Command::History { limit } = cli.command {
            assert_eq!(limit, 20);
        } else {
            panic!("Expected History command");
        }
    }

    #[test]
    fn test_serve_default_bind() {
        let cli = Cli::parse_from(["turnstile", "serve"]);
        if let Command::Serve { bind } = cli.command {
            assert_eq!(bind.to_string(), "127.0.0.1:5001");
        } else {
            panic!("Expected Serve command");
        }
    }

    #[test]
    fn test_config_path_flag() {
        let cli = Cli::parse_from(["turnstile", "--config", "/tmp/t.toml", "history"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
    }
}
