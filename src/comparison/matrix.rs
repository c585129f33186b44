// Problem x classifier matrix of one averaged statistic

use crate::table::SummaryTable;
use anyhow::{Context, Result};
use std::path::Path;

/// Legacy sentinel for "no value" in older averaged tables
const LEGACY_ABSENT: f64 = -1.0;

/// `data[problem][classifier]`, `None` where a classifier has no value
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonMatrix {
    pub classifiers: Vec<String>,
    pub problems: Vec<String>,
    data: Vec<Vec<Option<f64>>>,
}

impl ComparisonMatrix {
    pub fn new(classifiers: Vec<String>, rows: Vec<(String, Vec<Option<f64>>)>) -> Self {
        let k = classifiers.len();
        let mut problems = Vec::with_capacity(rows.len());
        let mut data = Vec::with_capacity(rows.len());
        for (problem, mut cells) in rows {
            cells.resize(k, None);
            for cell in cells.iter_mut() {
                if *cell == Some(LEGACY_ABSENT) {
                    *cell = None;
                }
            }
            problems.push(problem);
            data.push(cells);
        }
        Self {
            classifiers,
            problems,
            data,
        }
    }

    /// Columns are taken by position; the file's header is not trusted to match.
    pub fn from_summary(table: &SummaryTable, classifiers: &[String]) -> Self {
        Self::new(classifiers.to_vec(), table.rows.clone())
    }

    pub fn load(path: &Path, classifiers: &[String]) -> Result<Self> {
        let table = SummaryTable::read_csv(path)
            .with_context(|| format!("Failed to load averaged table {}", path.display()))?;
        Ok(Self::from_summary(&table, classifiers))
    }

    pub fn num_classifiers(&self) -> usize {
        self.classifiers.len()
    }

    pub fn num_problems(&self) -> usize {
        self.problems.len()
    }

    pub fn get(&self, problem: usize, classifier: usize) -> Option<f64> {
        self.data
            .get(problem)
            .and_then(|row| row.get(classifier).copied().flatten())
    }

    /// `(x, y)` values on problems where both classifiers have one
    pub fn paired(&self, x: usize, y: usize) -> Vec<(f64, f64)> {
        (0..self.num_problems())
            .filter_map(|p| Some((self.get(p, x)?, self.get(p, y)?)))
            .collect()
    }

    /// Rows where every classifier has a value
    pub fn complete_rows(&self) -> Vec<Vec<f64>> {
        self.data
            .iter()
            .filter_map(|row| row.iter().copied().collect::<Option<Vec<f64>>>())
            .collect()
    }
}
