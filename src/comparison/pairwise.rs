// Pairwise comparison of two classifiers on one statistic
//
// Summary level: wins/draws/losses and mean difference over problems where
// both have an averaged value, plus the binomial sign test.
// Fold level: a paired t-test per problem on the per-fold values.

use super::matrix::ComparisonMatrix;
use crate::stats::{paired_lower_tail_p, sign_test_p, summarise};
use crate::table::AggregateTable;
use anyhow::Result;
use serde::Serialize;

/// Lower-tail t probability at or above which a problem counts as a significant win
pub const SIG_WIN_P: f64 = 0.95;

/// Lower-tail t probability at or below which a problem counts as a significant loss
pub const SIG_LOSS_P: f64 = 0.05;

/// Verdict for `first` against `second`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseComparison {
    pub first: String,
    pub second: String,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub sign_test_p: f64,
    /// Problems where both classifiers have a value
    pub count: usize,
    pub mean_diff: Option<f64>,
    /// Population standard deviation of the per-problem differences
    pub std_diff: Option<f64>,
    pub sig_wins: usize,
    pub sig_losses: usize,
}

/// Strict comparison of each pair: `x > y` win, equal draw, otherwise loss
pub fn win_draw_loss(pairs: &[(f64, f64)]) -> (usize, usize, usize) {
    let mut counts = (0, 0, 0);
    for &(x, y) in pairs {
        if x > y {
            counts.0 += 1;
        } else if x == y {
            counts.1 += 1;
        } else {
            counts.2 += 1;
        }
    }
    counts
}

/// Summary-level comparison of columns `x` and `y`. Significance counts start at zero.
pub fn compare_means(matrix: &ComparisonMatrix, x: usize, y: usize) -> PairwiseComparison {
    let pairs = matrix.paired(x, y);
    let (wins, draws, losses) = win_draw_loss(&pairs);
    let diffs: Vec<f64> = pairs.iter().map(|(a, b)| a - b).collect();
    let diff_summary = summarise(&diffs);

    PairwiseComparison {
        first: matrix.classifiers[x].clone(),
        second: matrix.classifiers[y].clone(),
        wins,
        draws,
        losses,
        sign_test_p: sign_test_p(wins, losses),
        count: pairs.len(),
        mean_diff: diff_summary.map(|s| s.mean),
        std_diff: diff_summary.map(|s| s.std_dev),
        sig_wins: 0,
        sig_losses: 0,
    }
}

/// Count problems where `first` is significantly better / worse than `second`
/// over the first `folds` fold values.
///
/// Problems where either row holds fewer than `folds` values are skipped, as
/// are problems with a NaN fold value and problems whose fold values are
/// identical for both classifiers.
pub fn count_significant(
    first: &AggregateTable<f64>,
    second: &AggregateTable<f64>,
    problems: &[String],
    folds: usize,
) -> Result<(usize, usize)> {
    let mut sig_wins = 0;
    let mut sig_losses = 0;
    for problem in problems {
        let (Some(x), Some(y)) = (first.row(problem), second.row(problem)) else {
            continue;
        };
        if x.len() < folds || y.len() < folds {
            continue;
        }
        let diffs: Vec<f64> = x[..folds]
            .iter()
            .zip(&y[..folds])
            .map(|(a, b)| a - b)
            .collect();
        if diffs.iter().any(|d| d.is_nan()) {
            tracing::debug!("{}: fold without a value, no test", problem);
            continue;
        }
        match paired_lower_tail_p(&diffs)? {
            Some(p) if p >= SIG_WIN_P => sig_wins += 1,
            Some(p) if p <= SIG_LOSS_P => sig_losses += 1,
            Some(_) => {}
            None => tracing::debug!("{}: fold values identical, no test", problem),
        }
    }
    Ok((sig_wins, sig_losses))
}
