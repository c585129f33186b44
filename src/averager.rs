//! Cross-classifier averaging of collated fold tables
//!
//! Reads each classifier's `SummaryStats/<cls><Metric>.csv` and writes one
//! mean table and one standard deviation table per metric, plus a counts
//! table. A problem with no values for a classifier gets a blank cell.

use crate::collator::Metric;
use crate::config::CollationContext;
use crate::stats::summarise;
use crate::table::{AggregateTable, SummaryTable};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Averaged outputs for a classifier set
#[derive(Debug, Clone, Default)]
pub struct SummaryTables {
    pub means: BTreeMap<Metric, SummaryTable>,
    pub std_devs: BTreeMap<Metric, SummaryTable>,
    pub counts: SummaryTable,
}

pub fn mean_file_name(metric: Metric, names: &str) -> String {
    format!("Mean{}{}.csv", metric, names)
}

pub fn std_dev_file_name(metric: Metric, names: &str) -> String {
    format!("Mean{}StDev{}.csv", metric, names)
}

pub fn counts_file_name(names: &str) -> String {
    format!("Counts{}.csv", names)
}

/// Load a collated per-fold table, or `None` if the classifier never produced it
pub(crate) fn read_optional<T: std::str::FromStr>(path: &Path) -> Result<Option<AggregateTable<T>>> {
    AggregateTable::read_optional(path)
        .with_context(|| format!("Failed to read collated table {}", path.display()))
}

/// Average each metric over folds for every classifier and problem.
pub fn average_over_folds(ctx: &CollationContext) -> Result<SummaryTables> {
    let names: Vec<String> = ctx.classifier_names().iter().map(|s| s.to_string()).collect();
    let label = ctx.names_label();
    let out_dir: PathBuf = ctx.averaged_dir();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut summary = SummaryTables {
        counts: SummaryTable::new(names.clone()),
        ..SummaryTables::default()
    };

    for metric in Metric::AVERAGED {
        let tables = names
            .iter()
            .map(|cls| read_optional::<f64>(&ctx.summary_dir(cls).join(metric.file_name(cls))))
            .collect::<Result<Vec<_>>>()?;

        let mut means = SummaryTable::new(names.clone());
        let mut std_devs = SummaryTable::new(names.clone());
        for problem in &ctx.problems {
            let stats: Vec<_> = tables
                .iter()
                .map(|t| {
                    t.as_ref()
                        .and_then(|t| t.row(problem))
                        .and_then(summarise)
                })
                .collect();
            means.push_row(problem, stats.iter().map(|s| s.map(|s| s.mean)).collect());
            std_devs.push_row(problem, stats.iter().map(|s| s.map(|s| s.std_dev)).collect());
        }

        means.write_csv(&out_dir.join(mean_file_name(metric, &label)))?;
        std_devs.write_csv(&out_dir.join(std_dev_file_name(metric, &label)))?;
        summary.means.insert(metric, means);
        summary.std_devs.insert(metric, std_devs);
    }

    let counts = names
        .iter()
        .map(|cls| read_optional::<usize>(&ctx.summary_dir(cls).join(format!("{}Counts.csv", cls))))
        .collect::<Result<Vec<_>>>()?;
    for problem in &ctx.problems {
        let cells = counts
            .iter()
            .map(|t| {
                t.as_ref()
                    .and_then(|t| t.row(problem))
                    .and_then(|row| row.first())
                    .map(|&c| c as f64)
            })
            .collect();
        summary.counts.push_row(problem, cells);
    }
    summary
        .counts
        .write_csv(&out_dir.join(counts_file_name(&label)))?;

    tracing::info!(
        "Averaged {} metrics over {} problems into {}",
        Metric::AVERAGED.len(),
        ctx.problems.len(),
        out_dir.display()
    );
    Ok(summary)
}
