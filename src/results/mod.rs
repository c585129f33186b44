// Per-fold result records
//
// A result file is read once into an immutable `FoldResult`. Reading never
// panics and never aborts on its own: the caller gets an explicit
// `FoldOutcome` tag and decides whether the outcome is tolerated (missing)
// or fatal (corrupt).

mod format;
mod metrics;

pub use format::{FoldResult, ParseFailure, Prediction, ResultFileFormat, ResultHeader};
pub use metrics::{
    auroc, balanced_accuracy, derive_metrics, f1, infer_num_classes, mcc, mean_auroc, nll,
    ConfusionMatrix, DerivedMetrics, NLL_PENALTY,
};

use std::fs;
use std::path::Path;

/// Outcome of reading one fold's result file
#[derive(Debug, Clone, PartialEq)]
pub enum FoldOutcome {
    /// File present and well formed
    Valid(FoldResult),
    /// File absent, or present but empty (the empty file is removed)
    Missing,
    /// File present and non-empty but structurally broken
    Corrupt { reason: String, fields: Vec<String> },
}

impl FoldOutcome {
    pub fn is_missing(&self) -> bool {
        matches!(self, FoldOutcome::Missing)
    }
}

/// True if the file exists and is non-empty. An existing empty file is deleted.
pub fn validate_fold_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => {
            tracing::warn!("Deleting empty result file {}", path.display());
            if let Err(e) = fs::remove_file(path) {
                tracing::warn!("Failed to delete {}: {}", path.display(), e);
            }
            false
        }
        Ok(meta) => meta.is_file(),
        Err(_) => false,
    }
}

/// Read and parse a fold's result file
pub fn load_fold(path: &Path, format: ResultFileFormat) -> FoldOutcome {
    if !validate_fold_file(path) {
        return FoldOutcome::Missing;
    }
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            return FoldOutcome::Corrupt {
                reason: format!("unreadable: {}", e),
                fields: Vec::new(),
            }
        }
    };
    match FoldResult::parse(&text, format) {
        Ok(result) => FoldOutcome::Valid(result),
        Err(failure) => FoldOutcome::Corrupt {
            reason: failure.reason,
            fields: failure.fields,
        },
    }
}
