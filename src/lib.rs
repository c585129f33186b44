//! foldstat - collation and statistical comparison of classifier benchmark results
//!
//! A run reads one result file per (classifier, problem, fold), writes per-classifier
//! summary tables, averages them over folds across classifiers, and compares every
//! classifier pair with win/draw/loss counts and paired significance tests. A
//! separate stage summarises one classifier and lines it up against published
//! reference results.

pub mod averager;
pub mod cli;
pub mod collator;
pub mod comparison;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod reference;
pub mod results;
pub mod stats;
pub mod table;
