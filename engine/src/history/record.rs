//! Turn records and their persisted column layout

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Persisted column order. Columns outside this list are dropped on save.
pub const COLUMNS: [&str; 12] = [
    "query",
    "turn",
    "search_results",
    "search_confidence",
    "summary",
    "summary_confidence",
    "reviewed_summary",
    "review_confidence",
    "insights",
    "insights_confidence",
    "conversation_response",
    "conversation_confidence",
];

/// Columns a row cannot be loaded without
pub const REQUIRED_COLUMNS: [&str; 2] = ["query", "turn"];

/// One conversation exchange
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub query: String,
    pub turn: u64,
    #[serde(rename = "search_results")]
    pub search_result: String,
    pub search_confidence: Option<f64>,
    pub summary: String,
    pub summary_confidence: Option<f64>,
    pub reviewed_summary: String,
    pub review_confidence: Option<f64>,
    pub insights: String,
    pub insights_confidence: Option<f64>,
    pub conversation_response: String,
    pub conversation_confidence: Option<f64>,
}

/// How far a record has progressed through the result fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnProgress {
    Init,
    Searched,
    Summarized,
    Reviewed,
    Insighted,
}

impl fmt::Display for TurnProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TurnProgress::Init => "INIT",
            TurnProgress::Searched => "SEARCHED",
            TurnProgress::Summarized => "SUMMARIZED",
            TurnProgress::Reviewed => "REVIEWED",
            TurnProgress::Insighted => "INSIGHTED",
        };
        f.write_str(s)
    }
}

/// Why a persisted row could not be turned into a record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedRow {
    #[error("expected {expected} cells, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("missing turn number")]
    MissingTurn,

    #[error("unparsable turn number '{0}'")]
    BadTurn(String),

    #[error("unparsable {column} '{value}'")]
    BadConfidence { column: &'static str, value: String },

    #[error("turn {0} already loaded")]
    DuplicateTurn(u64),
}

fn has_text(s: &str) -> bool {
    !s.trim().is_empty()
}

impl TurnRecord {
    /// Fresh record with only `turn` and `query` set
    pub fn new(turn: u64, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            turn,
            ..Default::default()
        }
    }

    /// Set once a search has been stored, even if the text is blank
    pub fn has_search(&self) -> bool {
        !self.search_result.is_empty()
    }

    pub fn has_summary(&self) -> bool {
        !self.summary.is_empty()
    }

    /// True when the record holds agent output a summary can draw on.
    /// Blank output does not count.
    pub fn has_content(&self) -> bool {
        has_text(&self.search_result) || has_text(&self.summary)
    }

    /// Most recent agent output on this record: the summary when present,
    /// otherwise the search result.
    pub fn latest_output(&self) -> &str {
        if self.has_summary() {
            &self.summary
        } else {
            &self.search_result
        }
    }

    pub fn progress(&self) -> TurnProgress {
        if !self.has_search() {
            TurnProgress::Init
        } else if !self.has_summary() {
            TurnProgress::Searched
        } else if !has_text(&self.reviewed_summary) {
            TurnProgress::Summarized
        } else if !has_text(&self.insights) {
            TurnProgress::Reviewed
        } else {
            TurnProgress::Insighted
        }
    }

    /// Cells in `COLUMNS` order
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.query.clone(),
            self.turn.to_string(),
            self.search_result.clone(),
            format_confidence(self.search_confidence),
            self.summary.clone(),
            format_confidence(self.summary_confidence),
            self.reviewed_summary.clone(),
            format_confidence(self.review_confidence),
            self.insights.clone(),
            format_confidence(self.insights_confidence),
            self.conversation_response.clone(),
            format_confidence(self.conversation_confidence),
        ]
    }

    /// Build a record from a header-keyed row. Unrecognised keys are ignored,
    /// recognised ones that are absent default to empty.
    pub fn from_cells(cells: &HashMap<&str, &str>) -> Result<Self, MalformedRow> {
        let text = |column: &str| cells.get(column).map(|v| v.to_string()).unwrap_or_default();

        let turn_cell = cells.get("turn").map(|t| t.trim()).unwrap_or("");
        if turn_cell.is_empty() {
            return Err(MalformedRow::MissingTurn);
        }
        let turn = match turn_cell.parse::<u64>() {
            Ok(t) if t > 0 => t,
            _ => return Err(MalformedRow::BadTurn(turn_cell.to_string())),
        };

        Ok(Self {
            query: text("query"),
            turn,
            search_result: text("search_results"),
            search_confidence: parse_confidence(cells, "search_confidence")?,
            summary: text("summary"),
            summary_confidence: parse_confidence(cells, "summary_confidence")?,
            reviewed_summary: text("reviewed_summary"),
            review_confidence: parse_confidence(cells, "review_confidence")?,
            insights: text("insights"),
            insights_confidence: parse_confidence(cells, "insights_confidence")?,
            conversation_response: text("conversation_response"),
            conversation_confidence: parse_confidence(cells, "conversation_confidence")?,
        })
    }
}

fn format_confidence(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_confidence(
    cells: &HashMap<&str, &str>,
    column: &'static str,
) -> Result<Option<f64>, MalformedRow> {
    let raw = cells.get(column).map(|v| v.trim()).unwrap_or("");
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(MalformedRow::BadConfidence {
            column,
            value: raw.to_string(),
        }),
    }
}
