//! Conductor System
//!
//! Orchestrates one conversation turn: classify the intent, resolve the
//! record it belongs to, plan stages, execute them, and persist the result.

pub mod conversation;
pub mod executor;
pub mod intent;
pub mod planner;
pub mod resolver;
pub mod types;

pub use conversation::{ConversationReply, ConversationResponder, LlmConversationResponder};
pub use executor::Executor;
pub use intent::{FixedIntentClassifier, IntentClassifier, LlmIntentClassifier};
pub use planner::Planner;
pub use resolver::{Resolution, TurnResolver};
pub use types::{AnnotatedTurn, Intent, Stage, StageFailure, StagePlan, SummarizedTurn};

use crate::history::{self, HistoryStore, TurnRecord};
use crate::providers::{SearchProvider, SummaryProvider};
use sdk::EngineError;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Default number of recent turns shown to the classifier and responder
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

pub struct Conductor {
    store: HistoryStore,
    resolver: TurnResolver,
    planner: Planner,
    executor: Executor,
    classifier: Arc<dyn IntentClassifier>,
    responder: Arc<dyn ConversationResponder>,
    history_window: usize,
    /// Held for the whole read-modify-write of a turn
    turn_lock: Mutex<()>,
}

impl Conductor {
    pub fn new(
        store: HistoryStore,
        search: Arc<dyn SearchProvider>,
        summary: Arc<dyn SummaryProvider>,
        classifier: Arc<dyn IntentClassifier>,
        responder: Arc<dyn ConversationResponder>,
    ) -> Self {
        Self {
            resolver: TurnResolver::new(store.clone()),
            planner: Planner::new(),
            executor: Executor::new(search, summary, store.clone()),
            store,
            classifier,
            responder,
            history_window: DEFAULT_HISTORY_WINDOW,
            turn_lock: Mutex::new(()),
        }
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Run one query through the pipeline and persist the resulting record.
    ///
    /// `intent` skips classification when given. Provider failures are
    /// reported on the returned turn; only store I/O and a blank query fail
    /// the call.
    pub async fn handle_query(
        &self,
        query: &str,
        intent: Option<Intent>,
    ) -> Result<AnnotatedTurn, EngineError> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidQuery("query is empty".to_string()));
        }

        let _guard = self.turn_lock.lock().await;

        let records = self.store.load().await?;
        let window = history::recent(&records, self.history_window);

        let intent = match intent {
            Some(intent) => intent,
            None => {
                let chronological: Vec<&TurnRecord> = window.iter().rev().copied().collect();
                self.classifier.classify(query, &chronological).await
            }
        };
        info!("Handling query with intent {}", intent);

        if intent == Intent::ConversationQuery {
            return self.answer_conversation(query, records).await;
        }

        let resolution = self.resolver.resolve(query, Some(intent)).await?;
        let plan = self
            .planner
            .plan(query, intent, &resolution.record, &window);
        let report = self.executor.execute(resolution.record, &plan).await;

        let mut records = resolution.records;
        history::upsert(&mut records, report.record.clone());
        self.store.save(&records).await?;

        info!(
            "Turn {} saved: executed {:?}, {} failures",
            report.record.turn,
            report.executed_stages,
            report.failures.len()
        );

        Ok(AnnotatedTurn {
            record: report.record,
            intent,
            planned_stages: plan.stages,
            executed_stages: report.executed_stages,
            cached_stages: plan.cached,
            failures: report.failures,
            anchor_turn: resolution.anchor_turn,
            summarized_turns: report.summarized_turns,
        })
    }

    async fn answer_conversation(
        &self,
        query: &str,
        mut records: Vec<TurnRecord>,
    ) -> Result<AnnotatedTurn, EngineError> {
        let resolution = resolver::resolve_in(records.clone(), query, Some(Intent::ConversationQuery));
        let mut record = resolution.record;
        let window = history::recent(&records, self.history_window);
        let plan = self
            .planner
            .plan(query, Intent::ConversationQuery, &record, &window);

        let mut executed_stages = Vec::new();
        let mut failures = Vec::new();
        match conversation::answer_from_history(self.responder.as_ref(), query, &window).await {
            Ok(reply) => {
                record.conversation_response = reply.text;
                record.conversation_confidence = Some(reply.confidence);
                executed_stages.push(Stage::ConversationQuery);
            }
            Err(e) => {
                warn!("Conversation query failed: {}", e);
                failures.push(StageFailure {
                    stage: Stage::ConversationQuery,
                    error: e.to_string(),
                });
            }
        }

        history::upsert(&mut records, record.clone());
        self.store.save(&records).await?;
        info!("Turn {} saved as conversation query", record.turn);

        Ok(AnnotatedTurn {
            record,
            intent: Intent::ConversationQuery,
            planned_stages: plan.stages,
            executed_stages,
            cached_stages: plan.cached,
            failures,
            anchor_turn: None,
            summarized_turns: Vec::new(),
        })
    }

    /// Every persisted record in turn order
    pub async fn history(&self) -> Result<Vec<TurnRecord>, EngineError> {
        let mut records = self.store.load().await?;
        records.sort_by_key(|r| r.turn);
        Ok(records)
    }

    /// The `n` most recent records, highest turn first
    pub async fn recent(&self, n: usize) -> Result<Vec<TurnRecord>, EngineError> {
        let records = self.store.load().await?;
        Ok(history::recent(&records, n).into_iter().cloned().collect())
    }
}
