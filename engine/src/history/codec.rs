//! Comma-delimited text codec for the history file
//!
//! Fields containing a comma, a double quote, CR or LF are wrapped in double
//! quotes with inner quotes doubled, so search snippets and multi-line
//! summaries survive a save/load cycle unchanged. The reader accepts both
//! `\n` and `\r\n` row terminators.

/// Split delimited text into rows of cells.
///
/// A trailing newline does not produce an empty row. An unterminated quoted
/// field runs to end of input.
pub fn parse(input: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // Set once any character (or a quote pair) has been read for the current row
    let mut row_started = false;

    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' => {
                in_quotes = true;
                row_started = true;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                row_started = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                row_started = false;
            }
            _ => {
                field.push(ch);
                row_started = true;
            }
        }
    }

    if row_started || !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// Encode a single cell, quoting only when needed
pub fn encode_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Encode one row, terminated with `\n`
pub fn encode_row<S: AsRef<str>>(cells: &[S]) -> String {
    let mut line = cells
        .iter()
        .map(|c| encode_field(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}
