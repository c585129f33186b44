// Metrics derived from instance-level predictions
//
// Definitions follow the benchmark archive conventions:
// - balanced accuracy: mean per-class recall over classes present in the test set
// - F1: minority class for two-class problems, class average otherwise
// - NLL: base-2, a zero probability for the true class costs log2(0.01)
// - AUROC: class 1 for two-class problems, prior-weighted one-vs-rest otherwise

use crate::results::format::Prediction;
use serde::Serialize;
use std::collections::BTreeMap;

/// Penalty added for a zero probability on the true class (log2 of 0.01)
pub const NLL_PENALTY: f64 = -6.64;

/// Value returned by F1 for a class with no true positives
const NO_TRUE_POSITIVE_F1: f64 = 0.000_000_1;

/// Statistics computed from one fold's predictions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    pub f1: f64,
    pub mcc: f64,
    /// Only available when every prediction carries a distribution
    pub nll: Option<f64>,
    pub auroc: Option<f64>,
}

/// Confusion matrix indexed `[actual][predicted]`.
///
/// Only observed cells are stored, so class labels are unbounded. Classes that
/// never appear still count towards `num_classes`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    num_classes: usize,
    cells: BTreeMap<(usize, usize), f64>,
    /// Instances per true class
    actual: BTreeMap<usize, f64>,
    /// Instances per predicted class
    predicted: BTreeMap<usize, f64>,
}

impl ConfusionMatrix {
    pub fn build(predictions: &[Prediction], num_classes: usize) -> Self {
        let mut cm = Self {
            num_classes,
            cells: BTreeMap::new(),
            actual: BTreeMap::new(),
            predicted: BTreeMap::new(),
        };
        for p in predictions {
            *cm.cells.entry((p.true_class, p.predicted_class)).or_default() += 1.0;
            *cm.actual.entry(p.true_class).or_default() += 1.0;
            *cm.predicted.entry(p.predicted_class).or_default() += 1.0;
        }
        cm
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn get(&self, actual: usize, predicted: usize) -> f64 {
        self.cells.get(&(actual, predicted)).copied().unwrap_or(0.0)
    }

    /// Number of instances whose true class is `c`
    pub fn class_count(&self, c: usize) -> f64 {
        self.actual.get(&c).copied().unwrap_or(0.0)
    }

    fn predicted_count(&self, c: usize) -> f64 {
        self.predicted.get(&c).copied().unwrap_or(0.0)
    }

    fn total(&self) -> f64 {
        self.actual.values().sum()
    }

    fn trace(&self) -> f64 {
        self.cells
            .iter()
            .filter(|((a, p), _)| a == p)
            .map(|(_, n)| n)
            .sum()
    }

    /// Classes with at least one true positive
    fn hit_classes(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells.keys().filter(|(a, p)| a == p).map(|&(a, _)| a)
    }

    fn f_measure(&self, c: usize, beta: f64) -> f64 {
        let tp = self.get(c, c);
        if tp == 0.0 {
            return NO_TRUE_POSITIVE_F1;
        }
        let fp = self.predicted_count(c) - tp;
        let fn_ = self.class_count(c) - tp;
        let precision = zero_if_nan(tp / (tp + fp));
        let recall = zero_if_nan(tp / (tp + fn_));
        (1.0 + beta * beta) * (precision * recall) / ((beta * beta) * precision + recall)
    }
}

fn zero_if_nan(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

/// Number of classes implied by the predictions
pub fn infer_num_classes(predictions: &[Prediction]) -> usize {
    let from_dist = predictions
        .iter()
        .filter_map(|p| p.distribution.as_ref().map(Vec::len))
        .max()
        .unwrap_or(0);
    let from_labels = predictions
        .iter()
        .map(|p| p.true_class.max(p.predicted_class).saturating_add(1))
        .max()
        .unwrap_or(0);
    from_dist.max(from_labels)
}

/// Compute all derived statistics. `None` when there are no predictions.
pub fn derive_metrics(predictions: &[Prediction]) -> Option<DerivedMetrics> {
    if predictions.is_empty() {
        return None;
    }
    let num_classes = infer_num_classes(predictions);
    let cm = ConfusionMatrix::build(predictions, num_classes);

    let correct = predictions.iter().filter(|p| p.is_correct()).count();
    let accuracy = correct as f64 / predictions.len() as f64;

    let has_distributions = predictions.iter().all(|p| p.distribution.is_some());

    Some(DerivedMetrics {
        accuracy,
        balanced_accuracy: balanced_accuracy(&cm),
        f1: f1(&cm),
        mcc: mcc(&cm),
        nll: has_distributions.then(|| nll(predictions)),
        auroc: has_distributions.then(|| mean_auroc(predictions, num_classes)),
    })
}

pub fn balanced_accuracy(cm: &ConfusionMatrix) -> f64 {
    if cm.actual.is_empty() {
        return 0.0;
    }
    let recalls: f64 = cm.actual.iter().map(|(&c, &n)| cm.get(c, c) / n).sum();
    recalls / cm.actual.len() as f64
}

pub fn f1(cm: &ConfusionMatrix) -> f64 {
    let k = cm.num_classes();
    if k == 2 {
        let minority = if cm.class_count(0) < cm.class_count(1) { 0 } else { 1 };
        return cm.f_measure(minority, 1.0);
    }
    if k == 0 {
        return 0.0;
    }
    // every class without a true positive scores the same floor value
    let hits: Vec<usize> = cm.hit_classes().collect();
    let scored: f64 = hits.iter().map(|&c| cm.f_measure(c, 1.0)).sum();
    let misses = k.saturating_sub(hits.len()) as f64;
    (scored + misses * NO_TRUE_POSITIVE_F1) / k as f64
}

/// Multi-class Matthews correlation coefficient (Gorodkin's R_K)
pub fn mcc(cm: &ConfusionMatrix) -> f64 {
    let total = cm.total();
    let agreement: f64 = cm
        .actual
        .iter()
        .map(|(&c, &n)| n * cm.predicted_count(c))
        .sum();
    let num = cm.trace() * total - agreement;
    if num == 0.0 {
        return 0.0;
    }
    let squares = |counts: &BTreeMap<usize, f64>| counts.values().map(|n| n * n).sum::<f64>();
    let den_predicted = total * total - squares(&cm.predicted);
    let den_actual = total * total - squares(&cm.actual);
    num / (den_predicted.sqrt() * den_actual.sqrt())
}

/// Mean negative log2-likelihood of the true class
pub fn nll(predictions: &[Prediction]) -> f64 {
    let mut total = 0.0;
    for p in predictions {
        let prob = p
            .distribution
            .as_ref()
            .and_then(|d| d.get(p.true_class).copied())
            .unwrap_or(0.0);
        total += if prob == 0.0 { NLL_PENALTY } else { prob.log2() };
    }
    // a perfect fold sums to -0.0
    -total / predictions.len() as f64 + 0.0
}

/// One-vs-rest area under the ROC curve for class `c`.
///
/// Rank formulation with tied scores sharing their average rank. A class with
/// no positive or no negative instances gives 0.5.
pub fn auroc(predictions: &[Prediction], c: usize) -> f64 {
    let mut scored: Vec<(f64, bool)> = predictions
        .iter()
        .map(|p| {
            let score = p
                .distribution
                .as_ref()
                .and_then(|d| d.get(c).copied())
                .unwrap_or(0.0);
            (score, p.true_class == c)
        })
        .collect();
    let positives = scored.iter().filter(|(_, pos)| *pos).count() as f64;
    let negatives = scored.len() as f64 - positives;
    if positives == 0.0 || negatives == 0.0 {
        return 0.5;
    }

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < scored.len() {
        let mut j = i;
        while j + 1 < scored.len() && scored[j + 1].0 == scored[i].0 {
            j += 1;
        }
        // ranks are 1-based; tied block i..=j shares the mean rank
        let shared = (i + j) as f64 / 2.0 + 1.0;
        rank_sum += shared * scored[i..=j].iter().filter(|(_, pos)| *pos).count() as f64;
        i = j + 1;
    }
    (rank_sum - positives * (positives + 1.0) / 2.0) / (positives * negatives)
}

pub fn mean_auroc(predictions: &[Prediction], num_classes: usize) -> f64 {
    if num_classes == 2 {
        return auroc(predictions, 1);
    }
    let n = predictions.len() as f64;
    let mut priors: BTreeMap<usize, f64> = BTreeMap::new();
    for p in predictions {
        *priors.entry(p.true_class).or_default() += 1.0;
    }
    priors
        .iter()
        .map(|(&c, &count)| auroc(predictions, c) * count / n)
        .sum()
}
