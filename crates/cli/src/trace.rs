//! Text trace parser.
//!
//! One record per line, whitespace separated:
//!
//! ```text
//! # time thread kind size addr
//! 0      0      R    4    0x1000
//! 0      1      W    8    0x2040
//! 1      0      read 4    4100
//! ```
//!
//! `kind` is `R`/`W` or `read`/`write` in any case. Numbers are decimal or `0x` hex.
//! Blank lines and `#` comments are skipped.

use std::io::BufRead;

use cachereplay_core::{AccessKind, AccessRecord};

/// What went wrong on a trace line.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TraceErrorKind {
    /// Wrong number of fields.
    #[error("expected 5 fields (time thread kind size addr), found {found}")]
    FieldCount {
        /// Fields present.
        found: usize,
    },
    /// A numeric field did not parse.
    #[error("invalid {field} `{value}`")]
    Number {
        /// Field name.
        field: &'static str,
        /// Offending text.
        value: String,
    },
    /// The kind field is neither read nor write.
    #[error("unknown access kind `{0}`")]
    Kind(String),
    /// The underlying reader failed.
    #[error("read failed: {0}")]
    Io(String),
}

/// A trace parse failure with its 1-based line number.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("trace line {line}: {kind}")]
pub struct TraceError {
    /// 1-based line number.
    pub line: usize,
    /// Failure reason.
    pub kind: TraceErrorKind,
}

/// Parses every record from `reader`.
///
/// # Errors
///
/// The first [`TraceError`] encountered.
pub fn parse<R: BufRead>(reader: R) -> Result<Vec<AccessRecord>, TraceError> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let text = line.map_err(|e| TraceError {
            line: line_no,
            kind: TraceErrorKind::Io(e.to_string()),
        })?;
        if let Some(record) = parse_line(&text).map_err(|kind| TraceError {
            line: line_no,
            kind,
        })? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Parses one line; `Ok(None)` for blank or comment lines.
fn parse_line(text: &str) -> Result<Option<AccessRecord>, TraceErrorKind> {
    let body = text.split_once('#').map_or(text, |(before, _)| before);
    let fields: Vec<&str> = body.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None);
    }
    let [time, thread, kind, size, addr] = fields[..] else {
        return Err(TraceErrorKind::FieldCount {
            found: fields.len(),
        });
    };
    Ok(Some(AccessRecord::new(
        number(time, "time")?,
        number(thread, "thread")?,
        access_kind(kind)?,
        number(size, "size")?,
        number(addr, "addr")?,
    )))
}

fn access_kind(text: &str) -> Result<AccessKind, TraceErrorKind> {
    match text.to_ascii_lowercase().as_str() {
        "r" | "read" => Ok(AccessKind::Read),
        "w" | "write" => Ok(AccessKind::Write),
        _ => Err(TraceErrorKind::Kind(text.to_owned())),
    }
}

fn number<T: TryFrom<u64>>(text: &str, field: &'static str) -> Result<T, TraceErrorKind> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed
        .ok()
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| TraceErrorKind::Number {
            field,
            value: text.to_owned(),
        })
}
