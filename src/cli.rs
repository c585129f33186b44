//! CLI argument parsing for foldstat

use crate::config::{load_problems, ClassifierSpec, CollationContext, FileConfig};
use crate::error::CollateError;
use crate::reference::{ReferenceRequest, ReferenceSource};
use crate::results::ResultFileFormat;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "foldstat")]
#[command(version)]
#[command(about = "Collate per-fold classifier results and compare classifiers statistically", long_about = None)]
pub struct Cli {
    /// TOML configuration file; command-line values take precedence
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output (to stderr)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collate folds, average over folds and compare classifiers
    Collate(RunArgs),
    /// Average already collated tables
    Average(RunArgs),
    /// Compare classifiers using already averaged tables
    Compare(RunArgs),
    /// Summarise one classifier and compare it with reference results
    Reference(ReferenceArgs),
}

/// Arguments shared by the collation stages
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Results root containing one directory per classifier
    #[arg(long, value_name = "DIR")]
    pub results: Option<PathBuf>,

    /// Problem directory or problem list file
    #[arg(long, value_name = "PATH")]
    pub problems: Option<PathBuf>,

    /// Number of resamples per problem
    #[arg(long, value_name = "N")]
    pub folds: Option<usize>,

    /// Count partially written fold files
    #[arg(long)]
    pub count_partials: bool,

    /// Result file layout
    #[arg(long, value_enum)]
    pub format: Option<ResultFileFormat>,

    /// Also write the comparison report as JSON
    #[arg(long)]
    pub json: bool,

    /// Classifiers to collate, as NAME or NAME:PARAMS
    #[arg(value_name = "CLASSIFIER[:PARAMS]")]
    pub classifiers: Vec<ClassifierSpec>,
}

#[derive(Args, Debug, Clone)]
pub struct ReferenceArgs {
    /// Directory of the classifier to summarise, `<results>/<Classifier>`
    #[arg(value_name = "PRIMARY")]
    pub primary: PathBuf,

    /// Number of resamples per problem
    #[arg(long, value_name = "N")]
    pub folds: Option<usize>,

    /// Recompute accuracy from the predictions and fail on disagreement
    #[arg(long)]
    pub recalc_accuracy: bool,

    /// Result file layout
    #[arg(long, value_enum)]
    pub format: Option<ResultFileFormat>,

    /// Reference classifier to compare against, as TAG,NAME (repeatable)
    #[arg(long = "against", value_name = "TAG,NAME")]
    pub against: Vec<ReferenceSource>,
}

impl Cli {
    pub fn file_config(&self) -> Result<FileConfig> {
        match &self.config {
            Some(path) => FileConfig::from_toml(path),
            None => Ok(FileConfig::default()),
        }
    }
}

impl RunArgs {
    /// Merge with file configuration and build the run context.
    pub fn into_context(self, file: &FileConfig) -> Result<CollationContext> {
        let base = self
            .results
            .or_else(|| file.results.clone())
            .ok_or_else(|| CollateError::InvalidConfig("no results directory given".into()))?;
        let problems_path = self
            .problems
            .or_else(|| file.problems.clone())
            .ok_or_else(|| CollateError::InvalidConfig("no problem list given".into()))?;
        let folds = self
            .folds
            .or(file.folds)
            .ok_or_else(|| CollateError::InvalidConfig("number of folds not given".into()))?;
        let classifiers = if self.classifiers.is_empty() {
            file.classifier_specs()?
        } else {
            self.classifiers
        };

        let problems = load_problems(&problems_path)
            .with_context(|| format!("Failed to load problems from {}", problems_path.display()))?;
        let mut ctx = CollationContext::new(base, problems, folds, classifiers);
        ctx.count_partials = self.count_partials || file.count_partials.unwrap_or(false);
        ctx.format = self.format.or(file.format).unwrap_or_default();
        ctx.write_json = self.json || file.json.unwrap_or(false);
        Ok(ctx)
    }
}

impl ReferenceArgs {
    pub fn into_request(self, file: &FileConfig) -> Result<ReferenceRequest> {
        let folds = self
            .folds
            .or(file.folds)
            .ok_or_else(|| CollateError::InvalidConfig("number of folds not given".into()))?;
        if folds == 0 {
            anyhow::bail!(CollateError::InvalidConfig("folds must be > 0".into()));
        }
        Ok(ReferenceRequest {
            primary: self.primary,
            recalc_accuracy: self.recalc_accuracy,
            folds,
            format: self.format.or(file.format).unwrap_or_default(),
            sources: self.against,
            roots: file.reference_roots(),
        })
    }
}
