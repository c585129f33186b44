//! Tabular outputs shared by every stage
//!
//! Two shapes exist on disk:
//! - [`AggregateTable`]: ragged `problem,v0,v1,...` rows, one value per valid
//!   fold. Written by the collator, read back by the averager and comparator.
//! - [`SummaryTable`]: a header row of classifier names and one cell per
//!   classifier, blank when there is nothing to report.
//!
//! Rows are always kept in sorted problem order so reruns produce identical files.

use crate::error::{CollateError, Result};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Render a number with at most six decimals and no trailing zeros
pub fn format_decimal(value: f64) -> String {
    let text = format!("{:.6}", value);
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text.as_str()
    };
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Ordered `problem -> values` rows
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTable<T> {
    rows: BTreeMap<String, Vec<T>>,
}

impl<T> Default for AggregateTable<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T> AggregateTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with an empty row for every problem, so that problems with no
    /// valid folds still appear in the output.
    pub fn with_problems<S: AsRef<str>>(problems: &[S]) -> Self {
        let rows = problems
            .iter()
            .map(|p| (p.as_ref().to_string(), Vec::new()))
            .collect();
        Self { rows }
    }

    pub fn push(&mut self, problem: &str, value: T) {
        self.rows.entry(problem.to_string()).or_default().push(value);
    }

    pub fn row(&self, problem: &str) -> Option<&[T]> {
        self.rows.get(problem).map(Vec::as_slice)
    }

    pub fn problems(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.rows.iter().map(|(p, v)| (p.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: Display> AggregateTable<T> {
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for (problem, values) in &self.rows {
            out.push_str(problem);
            for v in values {
                out.push(',');
                out.push_str(&v.to_string());
            }
            out.push('\n');
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_csv()).map_err(|e| CollateError::io(path, e))
    }
}

impl<T: FromStr> AggregateTable<T> {
    /// Parse `problem,v0,v1,...` rows. Blank lines and trailing empty fields are ignored.
    pub fn from_csv(text: &str) -> std::result::Result<Self, String> {
        let mut table = Self::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields: Vec<&str> = line.split(',').map(str::trim).collect();
            while fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
                fields.pop();
            }
            let problem = fields[0];
            let row = table.rows.entry(problem.to_string()).or_default();
            for field in &fields[1..] {
                let value = field.parse::<T>().map_err(|_| {
                    format!("line {}: cannot parse value '{}'", line_no + 1, field)
                })?;
                row.push(value);
            }
        }
        Ok(table)
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CollateError::io(path, e))?;
        Self::from_csv(&text).map_err(|reason| CollateError::CorruptResultFile {
            path: path.to_path_buf(),
            reason,
            fields: Vec::new(),
        })
    }

    /// Like [`AggregateTable::read_csv`], but an absent file is `None`
    pub fn read_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::debug!("No table at {}", path.display());
            return Ok(None);
        }
        Self::read_csv(path).map(Some)
    }
}

/// Cross-classifier table: header of classifier names, one optional cell each
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryTable {
    pub columns: Vec<String>,
    pub rows: Vec<(String, Vec<Option<f64>>)>,
}

impl SummaryTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, problem: &str, cells: Vec<Option<f64>>) {
        self.rows.push((problem.to_string(), cells));
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for c in &self.columns {
            out.push(',');
            out.push_str(c);
        }
        out.push('\n');
        for (problem, cells) in &self.rows {
            out.push_str(problem);
            for cell in cells {
                out.push(',');
                if let Some(v) = cell {
                    out.push_str(&format_decimal(*v));
                }
            }
            out.push('\n');
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_csv()).map_err(|e| CollateError::io(path, e))
    }

    /// Parse a header row plus `problem,cell,...` rows; blank cells are `None`.
    pub fn from_csv(text: &str) -> std::result::Result<Self, String> {
        let mut lines = text.lines();
        let header = lines.next().ok_or_else(|| "empty table".to_string())?;
        let columns: Vec<String> = header
            .split(',')
            .skip(1)
            .map(|s| s.trim().to_string())
            .collect();

        let mut table = Self::new(columns);
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split(',').map(str::trim);
            let problem = fields.next().unwrap_or_default();
            let mut cells = Vec::with_capacity(table.columns.len());
            for field in fields {
                if field.is_empty() {
                    cells.push(None);
                } else {
                    let v = field
                        .parse::<f64>()
                        .map_err(|_| format!("cannot parse cell '{}' for {}", field, problem))?;
                    cells.push(Some(v));
                }
            }
            cells.resize(table.columns.len(), None);
            table.push_row(problem, cells);
        }
        Ok(table)
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CollateError::io(path, e))?;
        Self::from_csv(&text).map_err(|reason| CollateError::CorruptResultFile {
            path: path.to_path_buf(),
            reason,
            fields: Vec::new(),
        })
    }
}
