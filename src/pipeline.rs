//! Stage sequencing for a collation run

use crate::averager::{average_over_folds, SummaryTables};
use crate::collator::{collate_folds, ClassifierTables};
use crate::comparison::{basic_summary_comparisons, ComparisonReport};
use crate::config::CollationContext;
use crate::error::CollateError;
use anyhow::Result;

/// Which stages to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Collate, average and compare
    All,
    Average,
    Compare,
}

/// Everything produced by a run
#[derive(Debug, Default)]
pub struct CollationSummary {
    pub classifiers: Vec<ClassifierTables>,
    pub averages: Option<SummaryTables>,
    pub comparisons: Option<ComparisonReport>,
}

fn check(ctx: &CollationContext) -> Result<()> {
    ctx.validate().map_err(CollateError::InvalidConfig)?;
    tracing::info!(
        "Collating {} classifiers over {} problems and {} folds in {}",
        ctx.classifiers.len(),
        ctx.problems.len(),
        ctx.folds,
        ctx.base_path.display()
    );
    Ok(())
}

/// Run the requested stages in order. Each stage reads what the previous wrote.
pub fn run(ctx: &CollationContext, stage: Stage) -> Result<CollationSummary> {
    check(ctx)?;
    let mut summary = CollationSummary::default();
    match stage {
        Stage::All => {
            summary.classifiers = collate_folds(ctx)?;
            summary.averages = Some(average_over_folds(ctx)?);
            summary.comparisons = basic_summary_comparisons(ctx)?;
        }
        Stage::Average => summary.averages = Some(average_over_folds(ctx)?),
        Stage::Compare => summary.comparisons = basic_summary_comparisons(ctx)?,
    }
    Ok(summary)
}

/// Collate every fold, average over folds, then compare classifiers
pub fn collate(ctx: &CollationContext) -> Result<CollationSummary> {
    run(ctx, Stage::All)
}
