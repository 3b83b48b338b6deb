//! File-level parsing: bytes in, raw records out.
//!
//! CSV handling is deliberately naive: fields split on unescaped commas,
//! quotes stripped, nothing unescaped. A backslash-escaped comma inside a
//! value (`a\, b`) keeps the field in one piece, but the backslash itself
//! imports verbatim, matching the documented upload format.

use serde_json::{Map, Value};
use thiserror::Error;

pub const MAX_CSV_ROWS: usize = 1000;
pub const MAX_JSON_RECORDS: usize = 2500;

/// Which upload path a file takes; the two paths keep distinct failure
/// policies (see `validate::FailurePolicy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportChannel {
    Csv,
    Json,
}

/// Fatal pre-processing rejections: nothing is parsed or committed.
#[derive(Debug, Error)]
pub enum RejectError {
    #[error("unsupported file type: {0} (expected .csv or .json)")]
    BadExtension(String),
    #[error("file contains no records")]
    Empty,
    #[error("too many records: {count} exceeds the limit of {limit}")]
    TooManyRows { count: usize, limit: usize },
    #[error("file is not valid JSON: {0}")]
    InvalidJson(String),
}

impl RejectError {
    pub fn code(&self) -> &'static str {
        match self {
            RejectError::BadExtension(_) => "bad_extension",
            RejectError::Empty => "empty_file",
            RejectError::TooManyRows { .. } => "too_many_rows",
            RejectError::InvalidJson(_) => "invalid_json",
        }
    }
}

/// One input record. `index` is 1-based and matches the source file's own
/// numbering: JSON record 0 reports as 1; CSV rows report their physical
/// line number (the first data row is line 2 when the header sits on line
/// 1, and blank lines keep their positions).
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub index: usize,
    pub fields: Map<String, Value>,
}

pub fn channel_for(file_name: &str) -> Result<ImportChannel, RejectError> {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".csv") {
        Ok(ImportChannel::Csv)
    } else if lower.ends_with(".json") {
        Ok(ImportChannel::Json)
    } else {
        Err(RejectError::BadExtension(file_name.to_string()))
    }
}

pub fn parse(channel: ImportChannel, content: &str) -> Result<Vec<RawRecord>, RejectError> {
    match channel {
        ImportChannel::Csv => parse_csv(content),
        ImportChannel::Json => parse_json(content),
    }
}

fn parse_csv(content: &str) -> Result<Vec<RawRecord>, RejectError> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header_line)) = lines.next() else {
        return Err(RejectError::Empty);
    };
    let data: Vec<(usize, &str)> = lines.collect();
    if data.is_empty() {
        return Err(RejectError::Empty);
    }
    if data.len() > MAX_CSV_ROWS {
        return Err(RejectError::TooManyRows {
            count: data.len(),
            limit: MAX_CSV_ROWS,
        });
    }

    let header = split_fields(header_line);

    let mut out: Vec<RawRecord> = Vec::with_capacity(data.len());
    for (line_no, line) in data {
        let parts = split_fields(line);
        let mut fields = Map::new();
        for (col, name) in header.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            // Missing trailing values become null.
            let value = match parts.get(col) {
                Some(v) => Value::String(v.clone()),
                None => Value::Null,
            };
            fields.insert(name.clone(), value);
        }
        out.push(RawRecord {
            // Blank lines are skipped but still counted, so the index is
            // the row's physical line number.
            index: line_no + 1,
            fields,
        });
    }
    Ok(out)
}

/// A comma preceded by a backslash does not split the field; the backslash
/// stays in the value.
fn split_fields(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in line.chars() {
        if c == ',' && !escaped {
            out.push(strip_quotes(&current));
            current.clear();
        } else {
            current.push(c);
        }
        escaped = c == '\\';
    }
    out.push(strip_quotes(&current));
    out
}

fn parse_json(content: &str) -> Result<Vec<RawRecord>, RejectError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| RejectError::InvalidJson(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(RejectError::InvalidJson(
            "expected a top-level array of records".to_string(),
        ));
    };
    if items.is_empty() {
        return Err(RejectError::Empty);
    }
    if items.len() > MAX_JSON_RECORDS {
        return Err(RejectError::TooManyRows {
            count: items.len(),
            limit: MAX_JSON_RECORDS,
        });
    }

    let mut out: Vec<RawRecord> = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let Value::Object(fields) = item else {
            return Err(RejectError::InvalidJson(format!(
                "record {} is not an object",
                i + 1
            )));
        };
        out.push(RawRecord {
            index: i + 1,
            fields,
        });
    }
    Ok(out)
}

fn strip_quotes(s: &str) -> String {
    let mut out = s.trim().to_string();
    if out.starts_with('"') && out.ends_with('"') && out.len() >= 2 {
        out = out[1..out.len() - 1].to_string();
    }
    out.trim().to_string()
}
