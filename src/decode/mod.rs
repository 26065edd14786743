// src/decode/mod.rs

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use encoding_rs::{Encoding, EUC_KR, UTF_8};
use std::{fs, path::Path};
use tracing::{debug, warn};

/// Candidate encodings, tried in order. EUC-KR first: both publishers
/// export from Korean-locale spreadsheets, and a UTF-8 file that happens to
/// survive an EUC-KR decode is the publishers' problem, not ours.
static ENCODING_CANDIDATES: &[&'static Encoding] = &[EUC_KR, UTF_8];

/// Decoded tabular content, layout-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column names from the header row, as the file claims them.
    pub headers: Vec<String>,
    /// Each data row, one String per field.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Decode the file at `path` into a `RawTable`, trying each candidate
/// encoding in order and accepting the first one that yields a well-formed
/// table (header row present, consistent column count).
///
/// A missing file, or a file no candidate can parse, is reported as `None`:
/// absence of a dataset is a normal outcome the caller renders as
/// "unavailable", never an error to propagate.
pub fn decode_file(path: &Path) -> Option<RawTable> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!(path = %path.display(), "source unavailable: {}", e);
            return None;
        }
    };

    for encoding in ENCODING_CANDIDATES {
        let (text, _, had_errors) = encoding.decode(&bytes);
        if had_errors {
            debug!(
                path = %path.display(),
                encoding = encoding.name(),
                "rejected candidate: malformed byte sequences"
            );
            continue;
        }
        match parse_table(&text) {
            Ok(table) => {
                debug!(
                    path = %path.display(),
                    encoding = encoding.name(),
                    columns = table.headers.len(),
                    rows = table.rows.len(),
                    "decoded"
                );
                return Some(table);
            }
            Err(e) => {
                debug!(
                    path = %path.display(),
                    encoding = encoding.name(),
                    "rejected candidate: {:#}",
                    e
                );
            }
        }
    }

    warn!(
        path = %path.display(),
        "source unavailable: no candidate encoding produced a well-formed table"
    );
    None
}

/// Parse decoded text as CSV. Non-flexible: a record whose field count
/// disagrees with the header row fails the whole candidate.
fn parse_table(text: &str) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        anyhow::bail!("no header row");
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("CSV parse error at record {}", idx))?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    Ok(RawTable { headers, rows })
}
