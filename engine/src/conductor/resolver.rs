//! Turn Resolver
//!
//! Finds the history record a query belongs to, or creates a fresh one.

use crate::conductor::types::Intent;
use crate::history::{self, HistoryStore, TurnRecord};
use tracing::debug;

/// The record a query resolved to, and the table it was found in
#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: TurnRecord,
    pub records: Vec<TurnRecord>,
    /// Most recent record with content, for summarize requests
    pub anchor_turn: Option<u64>,
    /// True when `record` is new and not yet in `records`
    pub created: bool,
}

pub struct TurnResolver {
    store: HistoryStore,
}

impl TurnResolver {
    pub fn new(store: HistoryStore) -> Self {
        Self { store }
    }

    /// Re-read the full table and resolve `query` against it
    pub async fn resolve(&self, query: &str, intent: Option<Intent>) -> history::Result<Resolution> {
        let records = self.store.load().await?;
        Ok(resolve_in(records, query, intent))
    }
}

/// Resolution rules applied to an already loaded table.
///
/// - summarize: the anchor is the highest-turn record with a search result or
///   summary. If it was produced by this same query and already carries a
///   summary, it is reused so the summary is served from cache. Otherwise a
///   new turn is created.
/// - conversation_query: always a new turn.
/// - anything else: the lowest-turn record whose query matches exactly.
/// - no match: a new record one past the highest turn.
pub fn resolve_in(records: Vec<TurnRecord>, query: &str, intent: Option<Intent>) -> Resolution {
    let mut anchor_turn = None;

    let existing = match intent {
        Some(Intent::Summarize) => {
            let anchor = records
                .iter()
                .filter(|r| r.has_content())
                .max_by_key(|r| r.turn);
            anchor_turn = anchor.map(|r| r.turn);
            anchor
                .filter(|r| r.query == query && r.has_summary())
                .cloned()
        }
        Some(Intent::ConversationQuery) => None,
        Some(Intent::Search) | None => records
            .iter()
            .filter(|r| r.query == query)
            .min_by_key(|r| r.turn)
            .cloned(),
    };

    match existing {
        Some(record) => {
            debug!("Query resolved to existing turn {}", record.turn);
            Resolution {
                record,
                records,
                anchor_turn,
                created: false,
            }
        }
        None => {
            let turn = history::next_turn(&records);
            debug!("Query resolved to new turn {}", turn);
            Resolution {
                record: TurnRecord::new(turn, query),
                records,
                anchor_turn,
                created: true,
            }
        }
    }
}
