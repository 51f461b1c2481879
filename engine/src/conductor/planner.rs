//! Stage Planner
//!
//! Maps a classified intent onto the stages that satisfy it and marks the
//! ones whose result the resolved record already carries.

use crate::conductor::types::{Intent, Stage, StagePlan};
use crate::history::TurnRecord;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    /// Build the plan for one turn.
    ///
    /// `history` is the recent window the intent was classified against. The
    /// mapping itself is one stage per intent, so it is only logged here.
    pub fn plan(
        &self,
        query: &str,
        intent: Intent,
        record: &TurnRecord,
        history: &[&TurnRecord],
    ) -> StagePlan {
        let stages = vec![intent.stage()];
        let cached: Vec<Stage> = stages
            .iter()
            .copied()
            .filter(|stage| is_cached(*stage, record))
            .collect();

        debug!(
            "Planned {:?} for turn {} ({} chars, {} turns of context), cached {:?}",
            stages,
            record.turn,
            query.chars().count(),
            history.len(),
            cached
        );

        StagePlan { stages, cached }
    }
}

fn is_cached(stage: Stage, record: &TurnRecord) -> bool {
    match stage {
        Stage::Search => record.has_search(),
        Stage::Summarize => record.has_summary(),
        Stage::ConversationQuery => false,
    }
}
