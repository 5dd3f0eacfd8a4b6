//! Event table loading and normalization
//!
//! Parses a persisted tab-delimited behavioral event log (one row per trial,
//! one file per subject/task/run) into typed rows. Beyond the required
//! `onset`, `duration`, `junk` and `response_time` columns, event files carry
//! a task-dependent vocabulary of categorical and numeric columns (trial
//! type, cue type, risk, cue-target interval, ...), so every cell is kept
//! addressable by column name for the rule evaluator.

use crate::types::{ExtractError, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Columns every events file must carry, regardless of task.
const REQUIRED_COLUMNS: [&str; 4] = ["onset", "duration", "junk", "response_time"];

/// A single typed cell of the event table
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Finite numeric value
    Number(f64),
    /// Categorical label
    Text(String),
    /// Boolean flag (e.g. the `junk` column)
    Bool(bool),
    /// Absent value (`n/a`, empty field, or NaN in the source file)
    Missing,
}

impl CellValue {
    /// Convert to f64 for numeric use. Text and missing cells do not convert.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            CellValue::Text(_) | CellValue::Missing => None,
        }
    }

    /// Convert to bool. Numbers convert only from exact 0/1.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(v) => Some(*v),
            CellValue::Number(v) if *v == 0.0 => Some(false),
            CellValue::Number(v) if *v == 1.0 => Some(true),
            _ => None,
        }
    }

    /// True if this cell holds no value
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Bool(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            CellValue::Missing => write!(f, "n/a"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            CellValue::Number(v)
        } else {
            CellValue::Missing
        }
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

/// Parse one raw field from an events file into a typed cell
fn parse_cell(field: &str) -> CellValue {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") || trimmed.eq_ignore_ascii_case("na") {
        return CellValue::Missing;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        // "nan"/"inf" parse as floats; treat anything non-finite as absent
        return if v.is_finite() {
            CellValue::Number(v)
        } else {
            CellValue::Missing
        };
    }
    CellValue::Text(trimmed.to_string())
}

/// One behavioral trial
///
/// The typed fields cover the columns every task shares; the full cell map
/// (typed columns included) backs by-name lookups from condition specs.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    /// Trial onset in seconds from scan start
    pub onset: f64,
    /// Trial duration in seconds
    pub duration: f64,
    /// True if this trial is excluded from primary regressors
    pub junk: bool,
    /// All cells of this row, keyed by column name
    columns: HashMap<String, CellValue>,
}

impl EventRow {
    /// Create a row with the required typed columns set
    pub fn new(onset: f64, duration: f64, junk: bool) -> Self {
        let mut columns = HashMap::new();
        columns.insert("onset".to_string(), CellValue::Number(onset));
        columns.insert("duration".to_string(), CellValue::Number(duration));
        columns.insert("junk".to_string(), CellValue::Bool(junk));
        columns.insert("response_time".to_string(), CellValue::Missing);
        Self {
            onset,
            duration,
            junk,
            columns,
        }
    }

    /// Builder method: set a cell by column name
    pub fn with(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.columns.insert(column.to_string(), value.into());
        self
    }

    /// Look up a cell by column name
    pub fn value(&self, column: &str) -> Option<&CellValue> {
        self.columns.get(column)
    }

    /// Response time in seconds, if the trial has one
    pub fn response_time(&self) -> Option<f64> {
        self.columns.get("response_time").and_then(|c| c.as_f64())
    }
}

/// An ordered event table: one row per behavioral trial within one scan run
#[derive(Debug, Clone, PartialEq)]
pub struct EventTable {
    columns: Vec<String>,
    rows: Vec<EventRow>,
}

impl EventTable {
    /// Load an events file from disk
    ///
    /// The file must be tab-delimited with a header row naming at least the
    /// `onset`, `duration`, `junk` and `response_time` columns.
    pub fn from_path(path: &Path) -> Result<Self> {
        log::info!("Loading events file: {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::EventsParseError(format!("Failed to read file {:?}: {}", path, e))
        })?;

        let table = Self::parse_str(&content)?;
        log::info!("Loaded {} trials from {:?}", table.len(), path);
        Ok(table)
    }

    /// Parse an events table from tab-delimited text
    pub fn parse_str(content: &str) -> Result<Self> {
        let mut lines = content.lines().enumerate();

        let (_, header_line) = lines.next().ok_or_else(|| {
            ExtractError::EventsParseError("events file is empty".to_string())
        })?;
        let columns: Vec<String> = header_line.split('\t').map(|c| c.trim().to_string()).collect();

        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c == required) {
                return Err(ExtractError::EventsParseError(format!(
                    "missing required column '{}'",
                    required
                )));
            }
        }

        let mut rows = Vec::new();
        for (line_no, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != columns.len() {
                return Err(ExtractError::EventsParseError(format!(
                    "line {}: expected {} fields, found {}",
                    line_no + 1,
                    columns.len(),
                    fields.len()
                )));
            }

            let mut cells: HashMap<String, CellValue> = columns
                .iter()
                .zip(fields.iter())
                .map(|(name, field)| (name.clone(), parse_cell(field)))
                .collect();

            let onset = require_f64(&cells, "onset", line_no + 1)?;
            let duration = require_f64(&cells, "duration", line_no + 1)?;
            let junk = cells
                .get("junk")
                .and_then(|c| c.as_bool())
                .ok_or_else(|| {
                    ExtractError::EventsParseError(format!(
                        "line {}: column 'junk' must be a boolean",
                        line_no + 1
                    ))
                })?;
            // Normalize 0/1-encoded junk flags so grouping on `junk` sees a Bool
            cells.insert("junk".to_string(), CellValue::Bool(junk));

            rows.push(EventRow {
                onset,
                duration,
                junk,
                columns: cells,
            });
        }

        Ok(Self { columns, rows })
    }

    /// Build a table from rows constructed in code
    pub fn from_rows(rows: Vec<EventRow>) -> Self {
        let mut columns: Vec<String> = rows
            .iter()
            .flat_map(|r| r.columns.keys().cloned())
            .collect();
        columns.sort();
        columns.dedup();
        Self { columns, rows }
    }

    /// Number of trials in the table
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no trials
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over trials in file order
    pub fn iter(&self) -> std::slice::Iter<'_, EventRow> {
        self.rows.iter()
    }

    /// Column names as declared in the header
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// True if the header declares the given column
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

fn require_f64(cells: &HashMap<String, CellValue>, column: &str, line: usize) -> Result<f64> {
    cells
        .get(column)
        .and_then(|c| c.as_f64())
        .ok_or_else(|| {
            ExtractError::EventsParseError(format!(
                "line {}: column '{}' must be numeric and non-missing",
                line, column
            ))
        })
}
