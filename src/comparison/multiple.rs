// Global sign-rank block over the problems every classifier has results for

use super::matrix::ComparisonMatrix;
use crate::stats::one_sample_tests;
use anyhow::{Context, Result};
use serde::Serialize;

/// Family-wise significance level before the control adjustment
pub const ALPHA: f64 = 0.05;

/// p-value matrices for every classifier pair. Only the upper triangle
/// (`i < j`) holds values; `diff = column i - column j`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignRankBlock {
    pub classifiers: Vec<String>,
    /// Number of problems with a value for every classifier
    pub problems: usize,
    /// `ALPHA / (k - 1)`
    pub alpha: f64,
    pub t_test: Vec<Vec<Option<f64>>>,
    pub sign_test: Vec<Vec<Option<f64>>>,
    pub sign_rank: Vec<Vec<Option<f64>>>,
    /// Symmetric; true where the sign-rank p is not below `alpha`
    pub no_difference: Vec<Vec<bool>>,
}

/// Run the one-sample tests for every pair over the complete rows.
///
/// `None` when fewer than two classifiers or fewer than two complete problems.
pub fn sign_rank_block(matrix: &ComparisonMatrix) -> Result<Option<SignRankBlock>> {
    let k = matrix.num_classifiers();
    let rows = matrix.complete_rows();
    tracing::debug!("Reduced data size = {}", rows.len());
    if k < 2 || rows.len() < 2 {
        return Ok(None);
    }

    let alpha = ALPHA / (k - 1) as f64;
    let mut block = SignRankBlock {
        classifiers: matrix.classifiers.clone(),
        problems: rows.len(),
        alpha,
        t_test: vec![vec![None; k]; k],
        sign_test: vec![vec![None; k]; k],
        sign_rank: vec![vec![None; k]; k],
        no_difference: vec![vec![true; k]; k],
    };

    for i in 0..k {
        for j in (i + 1)..k {
            let diffs: Vec<f64> = rows.iter().map(|r| r[i] - r[j]).collect();
            let tests = one_sample_tests(&diffs).with_context(|| {
                format!(
                    "Failed to test {} against {}",
                    matrix.classifiers[i], matrix.classifiers[j]
                )
            })?;
            block.t_test[i][j] = Some(tests.t_test.p_value);
            block.sign_test[i][j] = Some(tests.sign_test.p_value);
            block.sign_rank[i][j] = Some(tests.sign_rank.p_value);
            let same = tests.sign_rank.p_value >= alpha;
            block.no_difference[i][j] = same;
            block.no_difference[j][i] = same;
        }
    }
    Ok(Some(block))
}
