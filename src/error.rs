//! Error taxonomy for collation runs
//!
//! Absence of data is not an error (see [`crate::results::FoldOutcome`]).
//! Everything here is either fatal for the run or a usage error.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a collation stage
#[derive(Error, Debug)]
pub enum CollateError {
    /// A classifier named in the run has no results directory.
    #[error("Classifier {classifier} has no results directory: {}", path.display())]
    MissingClassifierDirectory { classifier: String, path: PathBuf },

    /// A result file exists and is non-empty but cannot be parsed.
    #[error("Corrupt result file {}: {reason} (fields: [{}])", path.display(), fields.join(","))]
    CorruptResultFile {
        path: PathBuf,
        reason: String,
        fields: Vec<String>,
    },

    /// Accuracy recomputed from predictions disagrees with the stored value.
    #[error(
        "Mismatch in accuracy for {}: stored {stored}, calculated from predictions {computed}",
        path.display()
    )]
    AccuracyMismatch {
        path: PathBuf,
        stored: f64,
        computed: f64,
    },

    /// Reference source tag not in the configured set of roots.
    #[error("Unknown reference source: {0}")]
    UnknownReferenceSource(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CollateError {
    /// Usage errors are reported but do not make the process fail.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, CollateError::UnknownReferenceSource(_))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CollateError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for operations that only fail with [`CollateError`]
pub type Result<T> = std::result::Result<T, CollateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_message_names_path() {
        let err = CollateError::MissingClassifierDirectory {
            classifier: "RotF".to_string(),
            path: PathBuf::from("/results/RotF"),
        };
        let msg = err.to_string();
        assert!(msg.contains("RotF"));
        assert!(msg.contains("/results/RotF"));
    }

    #[test]
    fn test_corrupt_message_includes_fields() {
        let err = CollateError::CorruptResultFile {
            path: PathBuf::from("testFold2.csv"),
            reason: "bad build time".to_string(),
            fields: vec!["BuildTime".to_string(), "abc".to_string()],
        };
        assert!(err.to_string().contains("BuildTime,abc"));
    }

    #[test]
    fn test_usage_error_classification() {
        assert!(CollateError::UnknownReferenceSource("FOO".into()).is_usage_error());
        assert!(!CollateError::InvalidConfig("x".into()).is_usage_error());
    }
}
