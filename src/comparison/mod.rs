//! Pairwise statistical comparison of classifiers
//!
//! For each compared statistic the averaged `Mean<Statistic><names>.csv` is
//! loaded into a [`ComparisonMatrix`]. Every ordered pair `x < y` gets a
//! [`PairwiseComparison`]; the per-fold tables provide the per-problem
//! significance counts. A global [`SignRankBlock`] follows the pairs.

mod matrix;
mod multiple;
mod pairwise;
mod report;

pub use matrix::ComparisonMatrix;
pub use multiple::{sign_rank_block, SignRankBlock, ALPHA};
pub use pairwise::{
    compare_means, count_significant, win_draw_loss, PairwiseComparison, SIG_LOSS_P, SIG_WIN_P,
};
pub use report::{ComparisonReport, StatisticComparison};

use crate::averager::{mean_file_name, read_optional};
use crate::collator::Metric;
use crate::config::CollationContext;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub fn report_path(ctx: &CollationContext) -> PathBuf {
    ctx.base_path
        .join(format!("summaryTests{}.csv", ctx.names_label()))
}

pub fn json_report_path(ctx: &CollationContext) -> PathBuf {
    ctx.base_path
        .join(format!("summaryTests{}.json", ctx.names_label()))
}

/// Compare one statistic across every classifier pair
pub fn compare_statistic(ctx: &CollationContext, metric: Metric) -> Result<StatisticComparison> {
    let names: Vec<String> = ctx.classifier_names().iter().map(|s| s.to_string()).collect();
    let path = ctx
        .averaged_dir()
        .join(mean_file_name(metric, &ctx.names_label()));
    tracing::debug!("Loading {}", path.display());
    let matrix = ComparisonMatrix::load(&path, &names)?;

    let per_fold = names
        .iter()
        .map(|cls| read_optional::<f64>(&ctx.summary_dir(cls).join(metric.file_name(cls))))
        .collect::<Result<Vec<_>>>()?;

    let mut pairs = Vec::new();
    for x in 0..names.len() {
        for y in (x + 1)..names.len() {
            let mut pair = compare_means(&matrix, x, y);
            if let (Some(first), Some(second)) = (&per_fold[x], &per_fold[y]) {
                let (sig_wins, sig_losses) =
                    count_significant(first, second, &ctx.problems, ctx.folds)?;
                pair.sig_wins = sig_wins;
                pair.sig_losses = sig_losses;
            }
            tracing::info!(
                "{},{},{},WIN/DRAW/LOSE,{},{},{}",
                metric,
                pair.first,
                pair.second,
                pair.wins,
                pair.draws,
                pair.losses
            );
            pairs.push(pair);
        }
    }

    Ok(StatisticComparison {
        statistic: metric,
        pairs,
        sign_rank: sign_rank_block(&matrix)?,
    })
}

/// Run every comparison and write the report. `None` with fewer than two classifiers.
pub fn basic_summary_comparisons(ctx: &CollationContext) -> Result<Option<ComparisonReport>> {
    if ctx.classifiers.len() < 2 {
        tracing::info!("Fewer than two classifiers, skipping comparisons");
        return Ok(None);
    }

    let statistics = Metric::COMPARED
        .iter()
        .map(|&metric| compare_statistic(ctx, metric))
        .collect::<Result<Vec<_>>>()?;
    let report = ComparisonReport {
        classifiers: ctx.classifier_names().iter().map(|s| s.to_string()).collect(),
        statistics,
    };

    let path = report_path(ctx);
    fs::write(&path, report.to_text())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    if ctx.write_json {
        let path = json_report_path(ctx);
        fs::write(&path, report.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(Some(report))
}

#[cfg(test)]
mod tests;
