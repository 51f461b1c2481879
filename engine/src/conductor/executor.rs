//! Turn Executor
//!
//! Runs the search and summarize stages of a plan against a record, calling
//! the providers only for stages whose result is not already cached.

use crate::conductor::types::{ExecutionReport, Stage, StageFailure, StagePlan, SummarizedTurn};
use crate::history::{HistoryStore, TurnRecord};
use crate::llm::preview;
use crate::providers::{SearchProvider, SummaryProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Number of most recent content records fed to the summarizer
pub const SUMMARY_SOURCE_TURNS: usize = 3;

/// Preview length for records reported in `summarized_turns`
const SUMMARY_PREVIEW_CHARS: usize = 200;

pub struct Executor {
    search: Arc<dyn SearchProvider>,
    summary: Arc<dyn SummaryProvider>,
    store: HistoryStore,
}

impl Executor {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        summary: Arc<dyn SummaryProvider>,
        store: HistoryStore,
    ) -> Self {
        Self {
            search,
            summary,
            store,
        }
    }

    /// Run every stage of `plan` in order.
    ///
    /// A failed stage leaves its fields untouched and is reported in
    /// `failures`; the remaining stages still run.
    pub async fn execute(&self, record: TurnRecord, plan: &StagePlan) -> ExecutionReport {
        let mut report = ExecutionReport {
            record,
            executed_stages: Vec::new(),
            failures: Vec::new(),
            summarized_turns: Vec::new(),
        };

        for stage in &plan.stages {
            let stage = *stage;
            if plan.is_cached(stage) {
                debug!("Turn {}: {} served from cache", report.record.turn, stage);
                report.executed_stages.push(stage);
                continue;
            }

            let start = Instant::now();
            let outcome = match stage {
                Stage::Search => self.run_search(&mut report.record).await,
                Stage::Summarize => {
                    self.run_summarize(&mut report.record, &mut report.summarized_turns)
                        .await
                }
                Stage::ConversationQuery => {
                    Err("conversation queries are answered outside the executor".to_string())
                }
            };

            match outcome {
                Ok(()) => {
                    info!(
                        "Turn {}: {} completed in {}ms",
                        report.record.turn,
                        stage,
                        start.elapsed().as_millis()
                    );
                    report.executed_stages.push(stage);
                }
                Err(error) => {
                    warn!("Turn {}: {} failed: {}", report.record.turn, stage, error);
                    report.failures.push(StageFailure { stage, error });
                }
            }
        }

        report
    }

    async fn run_search(&self, record: &mut TurnRecord) -> Result<(), String> {
        info!(
            "Searching with {} for: {}",
            self.search.name(),
            preview(&record.query, 50)
        );
        let reply = self
            .search
            .search(&record.query)
            .await
            .map_err(|e| e.to_string())?;

        record.search_result = reply.text;
        record.search_confidence = Some(reply.confidence);
        Ok(())
    }

    async fn run_summarize(
        &self,
        record: &mut TurnRecord,
        summarized: &mut Vec<SummarizedTurn>,
    ) -> Result<(), String> {
        let history = self.store.load().await.map_err(|e| e.to_string())?;
        let sources = summary_sources(&history, SUMMARY_SOURCE_TURNS);
        let combined = combine_responses(&sources);

        info!(
            "Summarizing with {} over turns {:?}",
            self.summary.name(),
            sources.iter().map(|r| r.turn).collect::<Vec<_>>()
        );
        if sources.is_empty() {
            debug!("No prior responses; summarizing empty input");
        }

        let reply = self
            .summary
            .summarize(&[combined])
            .await
            .map_err(|e| e.to_string())?;

        record.summary = reply.text;
        record.summary_confidence = Some(reply.confidence);
        *summarized = sources
            .iter()
            .map(|r| SummarizedTurn {
                turn: r.turn,
                query: r.query.clone(),
                preview: preview(r.latest_output(), SUMMARY_PREVIEW_CHARS),
            })
            .collect();
        Ok(())
    }
}

/// The last `n` records with a search result or summary, oldest first
pub fn summary_sources(records: &[TurnRecord], n: usize) -> Vec<&TurnRecord> {
    let mut sources: Vec<&TurnRecord> = records.iter().filter(|r| r.has_content()).collect();
    sources.sort_by_key(|r| r.turn);
    let skip = sources.len().saturating_sub(n);
    sources.split_off(skip)
}

/// Join records as `Response {i}: {text}` blocks separated by a blank line
pub fn combine_responses(sources: &[&TurnRecord]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, r)| format!("Response {}: {}", i + 1, r.latest_output()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn searched(turn: u64, text: &str) -> TurnRecord {
        let mut r = TurnRecord::new(turn, format!("q{}", turn));
        r.search_result = text.into();
        r
    }

    #[test]
    fn test_sources_take_last_three_ascending() {
        let records: Vec<TurnRecord> = [5, 1, 4, 2, 3]
            .iter()
            .map(|t| searched(*t, &format!("r{}", t)))
            .collect();
        let turns: Vec<u64> = summary_sources(&records, 3).iter().map(|r| r.turn).collect();
        assert_eq!(turns, vec![3, 4, 5]);
    }

    #[test]
    fn test_sources_skip_records_without_content() {
        let records = vec![searched(1, "a"), TurnRecord::new(2, "empty"), searched(3, "c")];
        let turns: Vec<u64> = summary_sources(&records, 3).iter().map(|r| r.turn).collect();
        assert_eq!(turns, vec![1, 3]);
    }

    #[test]
    fn test_combine_prefers_summary() {
        let mut summarized = searched(2, "raw");
        summarized.summary = "digest".into();
        let plain = searched(1, "first");

        let combined = combine_responses(&[&plain, &summarized]);
        assert_eq!(combined, "Response 1: first\n\nResponse 2: digest");
    }

    #[test]
    fn test_combine_empty_is_empty_string() {
        assert_eq!(combine_responses(&[]), "");
    }
}
