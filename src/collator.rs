//! Fold collation: one classifier's per-fold files into per-metric tables
//!
//! For every problem and fold the result file is loaded and every available
//! metric appended to that problem's row. Missing folds are recorded and
//! skipped; a corrupt fold aborts the run.
//!
//! Outputs land in `<results>/<classifier>/SummaryStats/`.

use crate::config::{ClassifierSpec, CollationContext};
use crate::error::CollateError;
use crate::results::{derive_metrics, load_fold, validate_fold_file, DerivedMetrics, FoldOutcome, FoldResult};
use crate::table::AggregateTable;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Partial parameter files are numbered `fold<j>_<k>.csv` for `k` in `1..MAX_PARTIAL_FILES`
pub const MAX_PARTIAL_FILES: usize = 1180;

/// A per-fold statistic collated into its own table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    TestAcc,
    TestBAcc,
    TestF1,
    TestNLL,
    TestAUROC,
    TestMCC,
    TrainCVAcc,
    Timings,
    Memory,
}

impl Metric {
    /// Every metric written by the collator
    pub const COLLATED: [Metric; 9] = [
        Metric::TestAcc,
        Metric::TestBAcc,
        Metric::TestF1,
        Metric::TestNLL,
        Metric::TestAUROC,
        Metric::TestMCC,
        Metric::TrainCVAcc,
        Metric::Timings,
        Metric::Memory,
    ];

    /// Metrics averaged across classifiers
    pub const AVERAGED: [Metric; 8] = [
        Metric::TestAcc,
        Metric::TrainCVAcc,
        Metric::TestNLL,
        Metric::TestBAcc,
        Metric::TestAUROC,
        Metric::TestF1,
        Metric::Timings,
        Metric::Memory,
    ];

    /// Metrics compared pairwise
    pub const COMPARED: [Metric; 4] = [
        Metric::TestAcc,
        Metric::TestBAcc,
        Metric::TestNLL,
        Metric::TestAUROC,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::TestAcc => "TestAcc",
            Metric::TestBAcc => "TestBAcc",
            Metric::TestF1 => "TestF1",
            Metric::TestNLL => "TestNLL",
            Metric::TestAUROC => "TestAUROC",
            Metric::TestMCC => "TestMCC",
            Metric::TrainCVAcc => "TrainCVAcc",
            Metric::Timings => "Timings",
            Metric::Memory => "Memory",
        }
    }

    /// `<classifier><Metric>.csv`
    pub fn file_name(self, classifier: &str) -> String {
        format!("{}{}.csv", classifier, self.name())
    }

    /// Value for one valid fold; NaN when the fold cannot provide it, so every
    /// valid fold occupies exactly one cell in every table.
    fn fold_value(self, result: &FoldResult, derived: Option<&DerivedMetrics>) -> f64 {
        let value = match self {
            Metric::TestAcc => Some(result.accuracy),
            Metric::TestBAcc => derived.map(|d| d.balanced_accuracy),
            Metric::TestF1 => derived.map(|d| d.f1),
            Metric::TestNLL => derived.and_then(|d| d.nll),
            Metric::TestAUROC => derived.and_then(|d| d.auroc),
            Metric::TestMCC => derived.map(|d| d.mcc),
            Metric::TrainCVAcc => result.train_cv_accuracy,
            Metric::Timings => result.build_time,
            Metric::Memory => result.memory,
        };
        value.unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything collated for one classifier
#[derive(Debug, Clone)]
pub struct ClassifierTables {
    pub classifier: String,
    pub metrics: BTreeMap<Metric, AggregateTable<f64>>,
    /// Valid folds per problem
    pub counts: AggregateTable<usize>,
    /// One table per declared parameter; blank cells where a fold did not report it
    pub parameters: Vec<AggregateTable<String>>,
    pub tuning_accuracies: AggregateTable<String>,
    /// Only problems with at least one missing fold appear
    pub missing_folds: AggregateTable<usize>,
    pub partial_counts: Option<AggregateTable<usize>>,
}

impl ClassifierTables {
    fn new(ctx: &CollationContext, spec: &ClassifierSpec) -> Self {
        let problems = &ctx.problems;
        Self {
            classifier: spec.name.clone(),
            metrics: Metric::COLLATED
                .iter()
                .map(|&m| (m, AggregateTable::with_problems(problems)))
                .collect(),
            counts: AggregateTable::with_problems(problems),
            parameters: (0..spec.num_params)
                .map(|_| AggregateTable::with_problems(problems))
                .collect(),
            tuning_accuracies: AggregateTable::with_problems(problems),
            missing_folds: AggregateTable::new(),
            partial_counts: ctx
                .count_partials
                .then(|| AggregateTable::with_problems(problems)),
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<&AggregateTable<f64>> {
        self.metrics.get(&metric)
    }

    fn record(&mut self, problem: &str, result: &FoldResult, num_params: usize) {
        let derived = derive_metrics(&result.predictions);
        for (metric, table) in self.metrics.iter_mut() {
            table.push(problem, metric.fold_value(result, derived.as_ref()));
        }
        let (params, tuning) = result.parameters(num_params);
        for (table, value) in self.parameters.iter_mut().zip(params) {
            table.push(problem, value.unwrap_or_default());
        }
        for t in tuning {
            self.tuning_accuracies.push(problem, t);
        }
    }

    /// Write every table into `dir`
    pub fn write(&self, dir: &Path) -> Result<()> {
        let cls = &self.classifier;
        for (metric, table) in &self.metrics {
            table.write_csv(&dir.join(metric.file_name(cls)))?;
        }
        self.counts
            .write_csv(&dir.join(format!("{}Counts.csv", cls)))?;
        for (i, table) in self.parameters.iter().enumerate() {
            table.write_csv(&dir.join(format!("{}Parameter{}.csv", cls, i + 1)))?;
        }
        self.tuning_accuracies
            .write_csv(&dir.join(format!("{}AllTuningAccuracies.csv", cls)))?;
        if !self.missing_folds.is_empty() {
            self.missing_folds
                .write_csv(&dir.join(format!("{}MissingFolds.csv", cls)))?;
        }
        if let Some(partials) = &self.partial_counts {
            partials.write_csv(&dir.join(format!("{}PartialCounts.csv", cls)))?;
        }
        Ok(())
    }
}

/// Number of valid partial parameter files for a missing fold
fn count_partial_files(predictions: &Path, fold: usize) -> usize {
    (1..MAX_PARTIAL_FILES)
        .filter(|k| validate_fold_file(&predictions.join(format!("fold{}_{}.csv", fold, k))))
        .count()
}

/// Collate one classifier. Nothing is written except the merged prediction
/// files and, on corruption, `Corrupted.csv`.
pub fn collate_classifier(ctx: &CollationContext, spec: &ClassifierSpec) -> Result<ClassifierTables> {
    let cls = spec.name.as_str();
    let cls_dir = ctx.classifier_dir(cls);
    if !cls_dir.is_dir() {
        return Err(CollateError::MissingClassifierDirectory {
            classifier: cls.to_string(),
            path: cls_dir,
        }
        .into());
    }
    tracing::info!("Processing classifier {}", cls);

    let summary_dir = ctx.summary_dir(cls);
    fs::create_dir_all(&summary_dir)
        .with_context(|| format!("Failed to create {}", summary_dir.display()))?;
    let corrupted_path = summary_dir.join(format!("{}Corrupted.csv", cls));
    fs::write(&corrupted_path, "")
        .with_context(|| format!("Failed to write {}", corrupted_path.display()))?;

    let mut tables = ClassifierTables::new(ctx, spec);
    for problem in &ctx.problems {
        let predictions = ctx.predictions_dir(cls, problem);
        let mut merged = String::new();
        let mut missing = 0;

        for fold in 0..ctx.folds {
            let path = predictions.join(format!("testFold{}.csv", fold));
            match load_fold(&path, ctx.format) {
                FoldOutcome::Valid(result) => {
                    tables.record(problem, &result, spec.num_params);
                    merged.push_str(&result.predictions_to_csv());
                    if let Some(partials) = tables.partial_counts.as_mut() {
                        partials.push(problem, 0);
                    }
                }
                FoldOutcome::Missing => {
                    tracing::debug!("{} {} fold {} missing", cls, problem, fold);
                    missing += 1;
                    tables.missing_folds.push(problem, fold);
                    if let Some(partials) = tables.partial_counts.as_mut() {
                        partials.push(problem, count_partial_files(&predictions, fold));
                    }
                }
                FoldOutcome::Corrupt { reason, fields } => {
                    tracing::error!(
                        "Corrupt result file {} (problem {}, fold {}): {}; line 2 has {} fields: {}",
                        path.display(),
                        problem,
                        fold,
                        reason,
                        fields.len(),
                        fields.join(",")
                    );
                    fs::write(&corrupted_path, format!("{},{}\n", problem, fold))
                        .with_context(|| format!("Failed to write {}", corrupted_path.display()))?;
                    return Err(CollateError::CorruptResultFile {
                        path,
                        reason,
                        fields,
                    }
                    .into());
                }
            }
        }

        tables.counts.push(problem, ctx.folds - missing);
        if missing > 0 {
            tracing::info!("{} {}: {} of {} folds present", cls, problem, ctx.folds - missing, ctx.folds);
        }

        let merged_path = summary_dir.join(format!("{}AllTestPrediction{}.csv", cls, problem));
        fs::write(&merged_path, merged)
            .with_context(|| format!("Failed to write {}", merged_path.display()))?;
    }
    Ok(tables)
}

/// Collate every classifier in order, writing each one's tables before moving
/// on. A failure leaves earlier classifiers' outputs in place.
pub fn collate_folds(ctx: &CollationContext) -> Result<Vec<ClassifierTables>> {
    let mut collated = Vec::with_capacity(ctx.classifiers.len());
    for spec in &ctx.classifiers {
        let tables = collate_classifier(ctx, spec)?;
        tables.write(&ctx.summary_dir(&spec.name))?;
        collated.push(tables);
    }
    Ok(collated)
}
