//! Input helpers for the `pmml-eval` command line tool.
//!
//! Rows are read as JSON lines: one JSON object per line mapping field names
//! to numbers, strings or booleans. Expected outputs are one number per line,
//! optionally wrapped in `[...]`.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use pmml_eval::{Engine, ErrorKind, Row};
use thiserror::Error;
use tracing::debug;

/// Largest absolute difference accepted by [`check`].
pub const TOLERANCE: f64 = 1e-8;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: invalid row: {source}")]
    Row {
        line: usize,
        source: serde_json::Error,
    },

    #[error("line {line}: invalid expected value {text:?}")]
    Expected { line: usize, text: String },

    #[error("{rows} rows but {expected} expected values")]
    LengthMismatch { rows: usize, expected: usize },

    #[error(transparent)]
    Engine(#[from] pmml_eval::Error),
}

pub type CliResult<T> = Result<T, CliError>;

pub fn read_rows<R: BufRead>(reader: R) -> CliResult<Vec<Row>> {
    let mut rows = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|source| CliError::Row {
            line: i + 1,
            source,
        })?;
        rows.push(row);
    }
    debug!(rows = rows.len(), "rows loaded");
    Ok(rows)
}

pub fn read_rows_file<P: AsRef<Path>>(path: P) -> CliResult<Vec<Row>> {
    read_rows(BufReader::new(File::open(path)?))
}

pub fn read_expected<R: BufRead>(reader: R) -> CliResult<Vec<f64>> {
    let mut values = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let inner = text.strip_prefix('[').unwrap_or(text);
        let inner = inner.strip_suffix(']').unwrap_or(inner);
        let value = inner.trim().parse::<f64>().map_err(|_| CliError::Expected {
            line: i + 1,
            text: text.to_string(),
        })?;
        values.push(value);
    }
    Ok(values)
}

pub fn read_expected_file<P: AsRef<Path>>(path: P) -> CliResult<Vec<f64>> {
    read_expected(BufReader::new(File::open(path)?))
}

/// Why a row failed the expected-output check.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    Differs { expected: f64, actual: f64 },
    /// The output is absent or not numeric.
    NotNumeric { expected: f64 },
    NoResult { expected: f64 },
    Failed { expected: f64, kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowMismatch {
    pub row: usize,
    pub mismatch: Mismatch,
}

/// Scores every row and compares `output` against the expected value of the
/// same index. Returns the rows that do not match within [`TOLERANCE`].
pub fn check(
    engine: &Engine,
    rows: &[Row],
    expected: &[f64],
    output: &str,
) -> CliResult<Vec<RowMismatch>> {
    if rows.len() != expected.len() {
        return Err(CliError::LengthMismatch {
            rows: rows.len(),
            expected: expected.len(),
        });
    }

    let results = engine.evaluate_batch(rows);
    let mismatches = results
        .into_iter()
        .zip(expected)
        .enumerate()
        .filter_map(|(row, (result, &expected))| {
            let mismatch = match result {
                Err(err) => Mismatch::Failed {
                    expected,
                    kind: err.kind(),
                    message: err.to_string(),
                },
                Ok(None) => Mismatch::NoResult { expected },
                Ok(Some(outputs)) => match outputs.get(output).and_then(|v| v.as_number()) {
                    Some(actual) if (actual - expected).abs() <= TOLERANCE => return None,
                    Some(actual) => Mismatch::Differs { expected, actual },
                    None => Mismatch::NotNumeric { expected },
                },
            };
            Some(RowMismatch { row, mismatch })
        })
        .collect();
    Ok(mismatches)
}
