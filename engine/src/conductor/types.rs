use crate::history::TurnRecord;
use sdk::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the user wants from a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// New information from the search provider
    Search,
    /// A summary of the most recent agent responses
    Summarize,
    /// A question about earlier turns
    ConversationQuery,
}

impl Intent {
    pub const ALL: [Intent; 3] = [Intent::Search, Intent::Summarize, Intent::ConversationQuery];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Search => "search",
            Intent::Summarize => "summarize",
            Intent::ConversationQuery => "conversation_query",
        }
    }

    /// Parse an explicitly requested intent. Unrecognised labels fall back
    /// to search, the same default the classifier uses.
    pub fn from_label_or_search(label: &str) -> Intent {
        label.parse().unwrap_or_else(|e: EngineError| {
            tracing::warn!("{}; planning as search", e);
            Intent::Search
        })
    }

    /// The single stage that satisfies this intent
    pub fn stage(&self) -> Stage {
        match self {
            Intent::Search => Stage::Search,
            Intent::Summarize => Stage::Summarize,
            Intent::ConversationQuery => Stage::ConversationQuery,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Ok(Intent::Search),
            "summarize" => Ok(Intent::Summarize),
            "conversation_query" => Ok(Intent::ConversationQuery),
            other => Err(EngineError::UnknownIntent(other.to_string())),
        }
    }
}

/// One planned unit of work for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Search,
    Summarize,
    ConversationQuery,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Search => "search",
            Stage::Summarize => "summarize",
            Stage::ConversationQuery => "conversation_query",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered stages for a turn, plus the ones whose result the record already holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePlan {
    pub stages: Vec<Stage>,
    pub cached: Vec<Stage>,
}

impl StagePlan {
    pub fn is_cached(&self, stage: Stage) -> bool {
        self.cached.contains(&stage)
    }
}

/// A stage that was planned but did not produce a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: String,
}

/// One prior turn that fed a summarize call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizedTurn {
    pub turn: u64,
    pub query: String,
    pub preview: String,
}

/// Outcome of running a plan against a record
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub record: TurnRecord,
    pub executed_stages: Vec<Stage>,
    pub failures: Vec<StageFailure>,
    pub summarized_turns: Vec<SummarizedTurn>,
}

/// Persisted record plus what happened while producing it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedTurn {
    pub record: TurnRecord,
    pub intent: Intent,
    pub planned_stages: Vec<Stage>,
    pub executed_stages: Vec<Stage>,
    pub cached_stages: Vec<Stage>,
    pub failures: Vec<StageFailure>,
    /// Most recent turn with content when the intent was summarize
    pub anchor_turn: Option<u64>,
    pub summarized_turns: Vec<SummarizedTurn>,
}

impl AnnotatedTurn {
    pub fn executed(&self, stage: Stage) -> bool {
        self.executed_stages.contains(&stage)
    }

    /// Planned but absent from `executed_stages`
    pub fn missed_stages(&self) -> Vec<Stage> {
        self.planned_stages
            .iter()
            .copied()
            .filter(|s| !self.executed_stages.contains(s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_parsing() {
        assert_eq!("search".parse::<Intent>().unwrap(), Intent::Search);
        assert_eq!(" Summarize ".parse::<Intent>().unwrap(), Intent::Summarize);
        assert_eq!(
            "conversation_query".parse::<Intent>().unwrap(),
            Intent::ConversationQuery
        );
        assert!(matches!(
            "review".parse::<Intent>(),
            Err(EngineError::UnknownIntent(_))
        ));
    }

    #[test]
    fn test_unrecognised_label_plans_as_search() {
        assert_eq!(Intent::from_label_or_search("review"), Intent::Search);
        assert_eq!(Intent::from_label_or_search(""), Intent::Search);
        assert_eq!(Intent::from_label_or_search("summarize"), Intent::Summarize);
    }

    #[test]
    fn test_intent_maps_to_one_stage() {
        for intent in Intent::ALL {
            assert_eq!(intent.stage().as_str(), intent.as_str());
        }
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&vec![Stage::Search, Stage::ConversationQuery]).unwrap();
        assert_eq!(json, r#"["search","conversation_query"]"#);
    }

    #[test]
    fn test_missed_stages() {
        let turn = AnnotatedTurn {
            record: TurnRecord::new(1, "q"),
            intent: Intent::Search,
            planned_stages: vec![Stage::Search],
            executed_stages: vec![],
            cached_stages: vec![],
            failures: vec![],
            anchor_turn: None,
            summarized_turns: vec![],
        };
        assert_eq!(turn.missed_stages(), vec![Stage::Search]);
        assert!(!turn.executed(Stage::Search));
    }
}
