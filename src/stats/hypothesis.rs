// Significance tests used by the pairwise comparison
//
// - Binomial sign test on win/loss counts
// - One-sample tests on paired differences against a zero median:
//   Student t (statistic from aprender), sign test, Wilcoxon signed-rank
//
// Distributions come from statrs. Sample sizes below 50 use the exact
// binomial for the sign test, larger ones the normal approximation.

use super::descriptive::average_ranks;
use anyhow::{Context, Result};
use serde::Serialize;
use statrs::distribution::{Binomial, ContinuousCDF, DiscreteCDF, Normal, StudentsT};

/// Below this many observations the sign test uses the exact binomial
const EXACT_SIGN_TEST_LIMIT: usize = 50;

/// p reported by every test when the differences are all identical
const IDENTICAL_SERIES_P: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

/// The three one-sample tests run on the same differences
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OneSampleTests {
    pub t_test: TestOutcome,
    pub sign_test: TestOutcome,
    pub sign_rank: TestOutcome,
}

fn all_identical(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

fn binomial_cdf(n: usize, k: u64) -> Result<f64> {
    let dist = Binomial::new(0.5, n as u64)
        .map_err(|e| anyhow::anyhow!("Invalid binomial distribution (n={}): {}", n, e))?;
    Ok(dist.cdf(k))
}

fn normal_cdf(mean: f64, std_dev: f64, x: f64) -> Result<f64> {
    let dist = Normal::new(mean, std_dev).map_err(|e| {
        anyhow::anyhow!("Invalid normal distribution ({}, {}): {}", mean, std_dev, e)
    })?;
    Ok(dist.cdf(x))
}

fn students_t_cdf(t: f64, df: f64) -> Result<f64> {
    if t.is_nan() {
        return Ok(0.5);
    }
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| anyhow::anyhow!("Invalid Student t distribution (df={}): {}", df, e))?;
    Ok(dist.cdf(t))
}

/// Two-sided binomial sign test p-value for win/loss counts (draws excluded).
///
/// The binomial(n, 0.5) CDF is evaluated at the smaller count and folded to
/// `min(p, 1 - p)`, so swapping wins and losses leaves p unchanged. No
/// decisive comparisons gives 1.
///
/// Summary files written by the older Java tooling took the upper tail above
/// the larger count instead, so their `p =` values differ from these: 2/0/0
/// reads 0 there and 0.25 here.
pub fn sign_test_p(wins: usize, losses: usize) -> f64 {
    let n = wins + losses;
    if n == 0 {
        return 1.0;
    }
    match binomial_cdf(n, wins.min(losses) as u64) {
        Ok(p) => p.min(1.0 - p),
        Err(e) => {
            tracing::warn!("Sign test failed for {}/{}: {}", wins, losses, e);
            1.0
        }
    }
}

/// One-sample t statistic of `diffs` against zero (aprender).
fn t_statistic(diffs: &[f64]) -> Result<(f64, f64)> {
    let sample: Vec<f32> = diffs.iter().map(|&d| d as f32).collect();
    let result =
        aprender::stats::hypothesis::ttest_1samp(&sample, 0.0).context("Failed to compute t-test")?;
    Ok((f64::from(result.statistic), f64::from(result.df)))
}

/// Lower-tail Student t probability of the mean difference being below zero.
///
/// Values near 1 mean the first series is consistently higher. `None` when the
/// differences are all identical and no test is run.
pub fn paired_lower_tail_p(diffs: &[f64]) -> Result<Option<f64>> {
    if diffs.len() < 2 || all_identical(diffs) {
        return Ok(None);
    }
    let (t, df) = t_statistic(diffs)?;
    students_t_cdf(t, df).map(Some)
}

fn t_test(diffs: &[f64]) -> Result<TestOutcome> {
    let (t, df) = t_statistic(diffs)?;
    let p = 2.0 * (1.0 - students_t_cdf(t.abs(), df)?);
    Ok(TestOutcome {
        statistic: t,
        p_value: p.min(1.0),
    })
}

/// Sign test against a zero median. Zero differences are shared between the
/// two sides; with an odd number of zeros and an exact test one is discarded.
fn sign_test(diffs: &[f64]) -> Result<TestOutcome> {
    let below = diffs.iter().filter(|&&d| d < 0.0).count();
    let above = diffs.iter().filter(|&&d| d > 0.0).count();
    let mut zeros = diffs.len() - below - above;
    let mut n = diffs.len();
    if zeros % 2 == 1 && n < EXACT_SIGN_TEST_LIMIT {
        n -= 1;
        zeros -= 1;
    }
    let shared = zeros as f64 / 2.0;
    let statistic = (below as f64 + shared).min(above as f64 + shared);

    let lower = if n < EXACT_SIGN_TEST_LIMIT {
        binomial_cdf(n, statistic.floor() as u64)?
    } else {
        let n = n as f64;
        normal_cdf(n / 2.0, n.sqrt() / 2.0, statistic)?
    };
    Ok(TestOutcome {
        statistic,
        p_value: (2.0 * lower).min(1.0),
    })
}

/// Wilcoxon signed-rank test with the normal approximation. The statistic is
/// the larger of the positive and negative rank sums.
fn sign_rank_test(diffs: &[f64]) -> Result<TestOutcome> {
    let nonzero: Vec<f64> = diffs.iter().copied().filter(|&d| d != 0.0).collect();
    if nonzero.is_empty() {
        return Ok(TestOutcome {
            statistic: 0.0,
            p_value: 1.0,
        });
    }
    let magnitudes: Vec<f64> = nonzero.iter().map(|d| d.abs()).collect();
    let ranks = average_ranks(&magnitudes);

    let (mut over, mut under) = (0.0, 0.0);
    for (d, r) in nonzero.iter().zip(&ranks) {
        if *d < 0.0 {
            under += r;
        } else {
            over += r;
        }
    }
    let statistic = f64::max(over, under);

    let m = nonzero.len() as f64;
    let mean = m * (m + 1.0) / 4.0;
    let std_dev = (m * (m + 1.0) * (2.0 * m + 1.0) / 24.0).sqrt();
    let p = 2.0 * (1.0 - normal_cdf(mean, std_dev, statistic)?);
    Ok(TestOutcome {
        statistic,
        p_value: p.min(1.0),
    })
}

/// Run the t, sign and signed-rank tests on paired differences.
pub fn one_sample_tests(diffs: &[f64]) -> Result<OneSampleTests> {
    if diffs.len() < 2 {
        anyhow::bail!("Need at least 2 paired values for one-sample tests");
    }
    if all_identical(diffs) {
        let flat = TestOutcome {
            statistic: 0.0,
            p_value: IDENTICAL_SERIES_P,
        };
        return Ok(OneSampleTests {
            t_test: flat,
            sign_test: flat,
            sign_rank: flat,
        });
    }
    Ok(OneSampleTests {
        t_test: t_test(diffs)?,
        sign_test: sign_test(diffs)?,
        sign_rank: sign_rank_test(diffs)?,
    })
}
