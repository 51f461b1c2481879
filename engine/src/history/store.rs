//! Flat-file history store
//!
//! The whole table is read on every load and rewritten on every save. Saves
//! go through a sibling temporary file and a rename, so a crash mid-write
//! leaves the previous table intact.

use super::codec;
use super::record::{MalformedRow, TurnRecord, COLUMNS, REQUIRED_COLUMNS};
use super::{HistoryError, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Table of turn records persisted to a delimited text file
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every well-formed record in file order.
    ///
    /// A missing file is an empty table. Malformed rows are skipped with a
    /// warning; only an unreadable file is an error.
    pub async fn load(&self) -> Result<Vec<TurnRecord>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("History file {} not found, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(HistoryError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(decode_table(&contents))
    }

    /// Replace the persisted table with `records`
    pub async fn save(&self, records: &[TurnRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| HistoryError::Write {
                        path: self.path.clone(),
                        source,
                    })?;
            }
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, encode_table(records))
            .await
            .map_err(|source| HistoryError::Write {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| HistoryError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!("Saved {} turns to {}", records.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Encode records with a header row in `COLUMNS` order
pub fn encode_table(records: &[TurnRecord]) -> String {
    let mut out = codec::encode_row(&COLUMNS);
    for record in records {
        out.push_str(&codec::encode_row(&record.to_cells()));
    }
    out
}

/// Decode a table, skipping rows that do not form a valid record
pub fn decode_table(contents: &str) -> Vec<TurnRecord> {
    let mut rows = codec::parse(contents).into_iter();

    let header = match rows.next() {
        Some(h) => h,
        None => return Vec::new(),
    };

    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|c| !header.iter().any(|h| h.trim() == **c))
    {
        warn!("History header lacks required column '{}', ignoring table", missing);
        return Vec::new();
    }

    let mut records = Vec::new();
    let mut seen = HashSet::new();

    // Row 1 is the header; data rows are numbered from 2
    for (idx, row) in rows.enumerate() {
        let line = idx + 2;

        if row.len() == 1 && row[0].is_empty() {
            continue;
        }

        match decode_row(&header, &row, &seen) {
            Ok(record) => {
                seen.insert(record.turn);
                records.push(record);
            }
            Err(e) => warn!("Skipping history row {}: {}", line, e),
        }
    }

    records
}

fn decode_row(
    header: &[String],
    row: &[String],
    seen: &HashSet<u64>,
) -> std::result::Result<TurnRecord, MalformedRow> {
    if row.len() != header.len() {
        return Err(MalformedRow::ColumnCount {
            expected: header.len(),
            found: row.len(),
        });
    }

    let cells: HashMap<&str, &str> = header
        .iter()
        .map(|h| h.trim())
        .zip(row.iter().map(String::as_str))
        .collect();

    let record = TurnRecord::from_cells(&cells)?;
    if seen.contains(&record.turn) {
        return Err(MalformedRow::DuplicateTurn(record.turn));
    }
    Ok(record)
}

/// Next unused turn number: one past the highest, or 1 for an empty table
pub fn next_turn(records: &[TurnRecord]) -> u64 {
    records.iter().map(|r| r.turn).max().unwrap_or(0) + 1
}

/// The `n` most recent records, highest turn first
pub fn recent(records: &[TurnRecord], n: usize) -> Vec<&TurnRecord> {
    let mut sorted: Vec<&TurnRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.turn.cmp(&a.turn));
    sorted.truncate(n);
    sorted
}

/// Replace the record with the same turn, or append it
pub fn upsert(records: &mut Vec<TurnRecord>, record: TurnRecord) {
    match records.iter_mut().find(|r| r.turn == record.turn) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(turn: u64, query: &str) -> TurnRecord {
        TurnRecord::new(turn, query)
    }

    #[test]
    fn test_header_only_table_is_empty() {
        assert!(decode_table(&encode_table(&[])).is_empty());
        assert!(decode_table("").is_empty());
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let text = "query,turn,search_results\n\
                    good,1,found\n\
                    short,2\n\
                    bad,x,found\n\
                    ,,\n\
                    also good,3,\n";
        let records = decode_table(text);
        let turns: Vec<u64> = records.iter().map(|r| r.turn).collect();
        assert_eq!(turns, vec![1, 3]);
        assert_eq!(records[0].search_result, "found");
    }

    #[test]
    fn test_duplicate_turn_keeps_first() {
        let text = "query,turn\nfirst,1\nsecond,1\n";
        let records = decode_table(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query, "first");
    }

    #[test]
    fn test_header_without_turn_ignored() {
        assert!(decode_table("query,summary\nq,s\n").is_empty());
    }

    #[test]
    fn test_reordered_and_partial_header() {
        let text = "turn,summary,query\n2,digest,hello\n";
        let records = decode_table(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].query, "hello");
        assert_eq!(records[0].summary, "digest");
        assert_eq!(records[0].conversation_response, "");
    }

    #[test]
    fn test_next_turn() {
        assert_eq!(next_turn(&[]), 1);
        assert_eq!(next_turn(&[record(4, "a"), record(2, "b")]), 5);
    }

    #[test]
    fn test_recent_orders_by_turn_descending() {
        let records = vec![record(2, "b"), record(5, "e"), record(1, "a"), record(3, "c")];
        let turns: Vec<u64> = recent(&records, 3).iter().map(|r| r.turn).collect();
        assert_eq!(turns, vec![5, 3, 2]);
        assert_eq!(recent(&records, 10).len(), 4);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut records = vec![record(1, "a"), record(2, "b")];
        let mut updated = record(1, "a");
        updated.summary = "s".into();
        upsert(&mut records, updated);
        upsert(&mut records, record(3, "c"));

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].summary, "s");
        assert_eq!(records[2].turn, 3);
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nope.csv"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_creates_parent_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.csv");
        let store = HistoryStore::new(&path);

        store.save(&[record(1, "a")]).await.unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("nested").join("state.csv.tmp").exists());
        assert_eq!(store.load().await.unwrap(), vec![record(1, "a")]);
    }
}
