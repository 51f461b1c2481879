//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - ask: Run one query through the conductor
//! - chat: Interactive loop over stdin
//! - history: Show the last N turns
//! - serve: Run the HTTP API
//! - doctor: Validate configuration and probe the provider servers

use anyhow::{Context, Result};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::conductor::{
    AnnotatedTurn, Conductor, Intent, LlmConversationResponder, LlmIntentClassifier, Stage,
};
use crate::config::Config;
use crate::history::{HistoryStore, TurnRecord};
use crate::llm::openai::OpenAIProvider;
use crate::llm::{preview, LLMProvider};
use crate::providers::{RpcClient, RpcSearchProvider, RpcSummaryProvider};
use crate::server;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Wire the conductor from configuration: RPC providers for search and
/// summary, and one OpenAI-compatible model for intent and conversation.
pub fn build_conductor(config: &Config) -> Conductor {
    let timeout = Duration::from_secs(config.providers.request_timeout_secs);

    let llm: Arc<dyn LLMProvider> =
        Arc::new(OpenAIProvider::from_config(&config.llm.openai, timeout));
    let search = Arc::new(RpcSearchProvider::new(
        config.providers.search.url.clone(),
        timeout,
    ));
    let summary = Arc::new(RpcSummaryProvider::new(
        config.providers.summary.url.clone(),
        timeout,
    ));

    Conductor::new(
        HistoryStore::new(config.history_path()),
        search,
        summary,
        Arc::new(LlmIntentClassifier::new(Arc::clone(&llm))),
        Arc::new(LlmConversationResponder::new(llm)),
    )
    .with_history_window(config.core.history_window)
}

/// Run one query
pub async fn handle_ask(
    query: String,
    intent: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let intent = intent.as_deref().map(Intent::from_label_or_search);

    let conductor = build_conductor(config);
    run_turn(&conductor, &query, intent, format).await
}

/// Interactive loop: one query per line until `exit`, `quit` or EOF
pub async fn handle_chat(config: &Config, format: OutputFormat) -> Result<()> {
    let conductor = build_conductor(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    if matches!(format, OutputFormat::Text) {
        println!("Turnstile chat. Type 'exit' or 'quit' to leave.");
    }

    loop {
        if matches!(format, OutputFormat::Text) {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
        }

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }

        // A failed turn ends that turn only, not the session
        if let Err(e) = run_turn(&conductor, query, None, format).await {
            tracing::error!("Turn failed: {:#}", e);
            eprintln!("Error: {:#}", e);
        }
    }

    Ok(())
}

async fn run_turn(
    conductor: &Conductor,
    query: &str,
    intent: Option<Intent>,
    format: OutputFormat,
) -> Result<()> {
    let turn = conductor
        .handle_query(query, intent)
        .await
        .context("Failed to handle query")?;

    match format {
        OutputFormat::Text => print_turn(&turn),
        OutputFormat::Json => {
            let mut recent = conductor
                .recent(server::ECHOED_TURNS)
                .await
                .context("Failed to load recent turns")?;
            recent.reverse();
            let output = server::query_response(&turn, &recent);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_turn(turn: &AnnotatedTurn) {
    let record = &turn.record;
    println!("Turn {} [{}]", record.turn, turn.intent);

    for stage in &turn.executed_stages {
        let cached = if turn.cached_stages.contains(stage) {
            " (cached)"
        } else {
            ""
        };
        match stage {
            Stage::Search => {
                println!(
                    "Search{} (confidence {}):",
                    cached,
                    format_confidence(record.search_confidence)
                );
                println!("{}", record.search_result);
            }
            Stage::Summarize => {
                println!(
                    "Summary{} (confidence {}):",
                    cached,
                    format_confidence(record.summary_confidence)
                );
                if !turn.summarized_turns.is_empty() {
                    let turns: Vec<String> = turn
                        .summarized_turns
                        .iter()
                        .map(|t| t.turn.to_string())
                        .collect();
                    println!("  from turns {}", turns.join(", "));
                }
                println!("{}", record.summary);
            }
            Stage::ConversationQuery => {
                println!(
                    "Answer (confidence {}):",
                    format_confidence(record.conversation_confidence)
                );
                println!("{}", record.conversation_response);
            }
        }
    }

    for failure in &turn.failures {
        println!("{} failed: {}", failure.stage, failure.error);
    }
}

fn format_confidence(confidence: Option<f64>) -> String {
    confidence
        .map(|c| format!("{:.2}", c))
        .unwrap_or_else(|| "-".to_string())
}

/// Show the most recent turns
pub async fn handle_history(limit: usize, config: &Config, format: OutputFormat) -> Result<()> {
    let store = HistoryStore::new(config.history_path());
    let records = store.load().await.context("Failed to load history")?;
    let mut turns: Vec<TurnRecord> = crate::history::recent(&records, limit)
        .into_iter()
        .cloned()
        .collect();
    turns.reverse();

    match format {
        OutputFormat::Text => {
            if turns.is_empty() {
                println!("No turns in history");
                return Ok(());
            }

            println!("Turn History (last {} turns):", limit);
            println!();

            for record in &turns {
                println!("Turn {}: {}", record.turn, record.query);
                println!("  Progress: {}", record.progress());
                if record.has_search() {
                    println!("  Search: {}", preview(&record.search_result, 80));
                }
                if record.has_summary() {
                    println!("  Summary: {}", preview(&record.summary, 80));
                }
                if !record.conversation_response.trim().is_empty() {
                    println!("  Answer: {}", preview(&record.conversation_response, 80));
                }
                println!();
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "turns": turns,
                "count": turns.len(),
                "limit": limit
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Serve the HTTP API until Ctrl-C
pub async fn handle_serve(bind: SocketAddr, config: &Config) -> Result<()> {
    let conductor = Arc::new(build_conductor(config));
    server::serve(conductor, bind)
        .await
        .context("API server failed")
}

/// Validate configuration and probe both provider servers
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks: Vec<(String, String)> = Vec::new();

    // Config is already validated when loaded
    checks.push(("Configuration".into(), "Valid".into()));

    let history_path = config.history_path();
    let store = HistoryStore::new(&history_path);
    match store.load().await {
        Ok(records) => checks.push(("History".into(), format!("{} turns", records.len()))),
        Err(e) => {
            checks.push(("History".into(), "Unreadable".into()));
            issues.push(e.to_string());
        }
    }

    let timeout = Duration::from_secs(config.providers.request_timeout_secs);
    for (name, url) in [
        ("Search server", &config.providers.search.url),
        ("Summary server", &config.providers.summary.url),
    ] {
        let client = RpcClient::new(url.clone(), timeout);
        match client.list_tools().await {
            Ok(tools) => checks.push((name.into(), format!("OK ({})", tools.join(", ")))),
            Err(e) => {
                checks.push((name.into(), "Unreachable".into()));
                issues.push(format!("{} at {}: {}", name, url, e));
            }
        }
    }

    let llm = OpenAIProvider::from_config(&config.llm.openai, timeout);
    let (status, issue) = llm_check(&llm, &config.llm.openai.api_key_env).await;
    checks.push(("Chat model".into(), status));
    issues.extend(issue);

    match format {
        OutputFormat::Text => {
            println!("Turnstile Doctor");
            println!();
            for (check, status) in &checks {
                println!("  {:<16} {}", check, status);
            }
            println!();
            if issues.is_empty() {
                println!("No issues found");
            } else {
                println!("Issues:");
                for issue in &issues {
                    println!("  - {}", issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks
                    .iter()
                    .map(|(check, status)| json!({ "check": check, "status": status }))
                    .collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Doctor line for the chat model, plus an issue when it is unusable
async fn llm_check(llm: &dyn LLMProvider, key_env: &str) -> (String, Option<String>) {
    if llm.check_health().await {
        (format!("OK ({} {})", llm.name(), llm.model()), None)
    } else {
        (
            "Not configured".to_string(),
            Some(format!(
                "{} is not set; intent detection will default to search",
                key_env
            )),
        )
    }
}
