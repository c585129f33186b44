// Descriptive statistics over fold values
//
// Standard deviation is the population form computed the naive way,
// sqrt(sum(x^2)/n - mean^2), so published tables can be reproduced exactly.
// Rounding can push the radicand slightly below zero; it is clamped.

use serde::Serialize;

/// Mean, population standard deviation and count of a set of values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

/// Summary of the non-NaN values; `None` when there are none.
///
/// NaN marks a fold that could not report the statistic.
pub fn summarise(values: &[f64]) -> Option<Summary> {
    let present = || values.iter().filter(|v| !v.is_nan());
    let count = present().count();
    if count == 0 {
        return None;
    }
    let n = count as f64;
    let sum: f64 = present().sum();
    let sum_squares: f64 = present().map(|v| v * v).sum();
    let mean = sum / n;
    let radicand = sum_squares / n - mean * mean;
    Some(Summary {
        count,
        mean,
        std_dev: radicand.max(0.0).sqrt(),
    })
}

pub fn mean(values: &[f64]) -> Option<f64> {
    summarise(values).map(|s| s.mean)
}

pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    summarise(values).map(|s| s.std_dev)
}

/// 1-based ranks with tied values sharing their average rank
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let shared = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = shared;
        }
        i = j + 1;
    }
    ranks
}
