//! Quick results for one classifier and comparison against reference tables
//!
//! Reads `<primary>/Predictions/<problem>/testFold<j>.csv` for every problem,
//! writes accuracy and timing summaries under `<primary>/QuickResults/`, and
//! optionally lines the results up against published reference collections
//! identified by a tag (`BAKEOFF`, `HIVE-COTE`, `REDUX`, or any configured root).

use crate::error::CollateError;
use crate::results::ResultFileFormat;
use crate::table::AggregateTable;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Largest tolerated difference between stored and recomputed accuracy
pub const ACCURACY_TOLERANCE: f64 = 1e-9;

/// Problem names used by older reference tables, and their current spelling
const PROBLEM_ALIASES: [(&str, &str); 4] = [
    ("CinCECGtorso", "CinCECGTorso"),
    ("StarlightCurves", "StarLightCurves"),
    ("NonInvasiveFatalECGThorax1", "NonInvasiveFetalECGThorax1"),
    ("NonInvasiveFatalECGThorax2", "NonInvasiveFetalECGThorax2"),
];

pub fn normalise_problem_name(name: &str) -> &str {
    PROBLEM_ALIASES
        .iter()
        .find(|(old, _)| *old == name)
        .map(|(_, new)| *new)
        .unwrap_or(name)
}

/// A reference classifier: collection tag plus classifier name, written `TAG,NAME`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSource {
    pub tag: String,
    pub classifier: String,
}

impl FromStr for ReferenceSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(',') {
            Some((tag, cls)) if !tag.trim().is_empty() && !cls.trim().is_empty() => Ok(Self {
                tag: tag.trim().to_uppercase(),
                classifier: cls.trim().to_string(),
            }),
            _ => Err(format!("expected TAG,CLASSIFIER but got '{}'", s)),
        }
    }
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.tag, self.classifier)
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceRequest {
    /// `<results>/<ClassifierName>`
    pub primary: PathBuf,
    pub recalc_accuracy: bool,
    pub folds: usize,
    pub format: ResultFileFormat,
    pub sources: Vec<ReferenceSource>,
    pub roots: BTreeMap<String, PathBuf>,
}

/// Results for one problem that had every fold readable
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteProblem {
    pub problem: String,
    pub accuracies: Vec<f64>,
    pub times: Vec<Option<f64>>,
    pub train_files: usize,
}

impl CompleteProblem {
    pub fn mean_accuracy(&self) -> f64 {
        self.accuracies.iter().sum::<f64>() / self.accuracies.len() as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceOutcome {
    pub classifier: String,
    pub complete: Vec<CompleteProblem>,
    /// Problems abandoned because some fold could not be read
    pub incomplete: Vec<String>,
    /// Fold 0 accuracy for every problem where fold 0 was read
    pub train_test: BTreeMap<String, f64>,
    pub timings_written: bool,
    /// Files written under `QuickResults/`
    pub written: Vec<PathBuf>,
}

/// Accuracy and time read from the head of one fold file
struct FoldHead {
    accuracy: f64,
    time: Option<f64>,
}

/// Read one fold. `Ok(None)` means the fold is unusable and the problem is
/// abandoned; an accuracy mismatch is an error.
fn read_fold_head(path: &Path, format: ResultFileFormat, recalc: bool) -> Result<Option<FoldHead>> {
    let Ok(text) = fs::read_to_string(path) else {
        return Ok(None);
    };
    let mut lines = text.lines();
    let (Some(_), Some(second), Some(third)) = (lines.next(), lines.next(), lines.next()) else {
        return Ok(None);
    };
    let (accuracy, time) = format.accuracy_and_time(second, third);
    let Ok(accuracy) = accuracy else {
        return Ok(None);
    };

    if recalc {
        let mut count = 0usize;
        let mut correct = 0usize;
        for line in lines.filter(|l| !l.trim().is_empty()) {
            let mut fields = line.split(',').map(str::trim);
            count += 1;
            if fields.next() == fields.next() {
                correct += 1;
            }
        }
        if count > 0 {
            let computed = correct as f64 / count as f64;
            if (computed - accuracy).abs() > ACCURACY_TOLERANCE {
                return Err(CollateError::AccuracyMismatch {
                    path: path.to_path_buf(),
                    stored: accuracy,
                    computed,
                }
                .into());
            }
        }
    }
    Ok(Some(FoldHead { accuracy, time }))
}

fn list_problems(predictions: &Path) -> Result<Vec<String>> {
    let mut problems = Vec::new();
    for entry in fs::read_dir(predictions)
        .with_context(|| format!("Failed to list {}", predictions.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            problems.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    problems.sort();
    Ok(problems)
}

/// Read a two-column `problem,value` reference table; absent file gives an empty map
fn load_reference_table(path: &Path) -> Result<BTreeMap<String, f64>> {
    let mut values = BTreeMap::new();
    if !path.exists() {
        tracing::warn!("Reference table {} not found", path.display());
        return Ok(values);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read reference table {}", path.display()))?;
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let mut fields = line.split(',').map(str::trim);
        let problem = fields.next().unwrap_or_default();
        let value = fields
            .next()
            .unwrap_or_default()
            .parse::<f64>()
            .with_context(|| format!("Bad value for {} in {}", problem, path.display()))?;
        values.insert(normalise_problem_name(problem).to_string(), value);
    }
    Ok(values)
}

fn write_text(path: PathBuf, text: &str, written: &mut Vec<PathBuf>) -> Result<()> {
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    written.push(path);
    Ok(())
}

fn write_table<T: fmt::Display>(
    path: PathBuf,
    table: &AggregateTable<T>,
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    table.write_csv(&path)?;
    written.push(path);
    Ok(())
}

/// Header plus `problem,primary,ref...` rows. Returns (all rows, complete-only rows).
fn comparison_rows<'a>(
    header: &str,
    primary: impl Iterator<Item = (&'a str, f64)>,
    references: &[BTreeMap<String, f64>],
) -> (String, String) {
    let mut all = header.to_string();
    let mut complete = header.to_string();
    for (problem, value) in primary {
        let mut line = format!("{},{}", problem, value);
        let mut present = true;
        for reference in references {
            line.push(',');
            match reference.get(problem) {
                Some(v) => line.push_str(&v.to_string()),
                None => present = false,
            }
        }
        line.push('\n');
        all.push_str(&line);
        if present {
            complete.push_str(&line);
        }
    }
    (all, complete)
}

/// Summarise a classifier's results and compare them with reference tables.
pub fn compare_to_reference(request: &ReferenceRequest) -> Result<ReferenceOutcome> {
    let classifier = request
        .primary
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            CollateError::InvalidConfig(format!(
                "cannot take a classifier name from {}",
                request.primary.display()
            ))
        })?;

    let mut roots = Vec::with_capacity(request.sources.len());
    for source in &request.sources {
        let root = request
            .roots
            .get(&source.tag.to_uppercase())
            .ok_or_else(|| CollateError::UnknownReferenceSource(source.tag.clone()))?;
        roots.push(root.clone());
    }

    tracing::info!("Primary classifier = {}", classifier);
    let quick = request.primary.join("QuickResults");
    fs::create_dir_all(&quick).with_context(|| format!("Failed to create {}", quick.display()))?;
    let predictions = request.primary.join("Predictions");

    let mut outcome = ReferenceOutcome {
        classifier: classifier.clone(),
        ..ReferenceOutcome::default()
    };
    let mut read_times = true;

    for problem in list_problems(&predictions)? {
        let dir = predictions.join(&problem);
        let mut accuracies = Vec::with_capacity(request.folds);
        let mut times = Vec::with_capacity(request.folds);
        let mut train_files = 0;
        let mut complete = true;

        for fold in 0..request.folds {
            let path = dir.join(format!("testFold{}.csv", fold));
            let Some(head) = read_fold_head(&path, request.format, request.recalc_accuracy)? else {
                tracing::warn!("Error processing {}, abandoning problem {}", path.display(), problem);
                complete = false;
                break;
            };
            if head.time.is_none() && read_times {
                tracing::warn!(
                    "Cannot read times from {} (format {}), continuing without timing",
                    path.display(),
                    request.format
                );
                read_times = false;
            }
            if fold == 0 {
                outcome.train_test.insert(problem.clone(), head.accuracy);
            }
            accuracies.push(head.accuracy);
            times.push(head.time);
            if dir.join(format!("trainFold{}.csv", fold)).exists() {
                train_files += 1;
            }
        }

        if complete {
            outcome.complete.push(CompleteProblem {
                problem,
                accuracies,
                times,
                train_files,
            });
        } else {
            outcome.incomplete.push(problem);
        }
    }

    let folds = request.folds;
    let mut train_test = AggregateTable::new();
    for (problem, acc) in &outcome.train_test {
        train_test.push(problem, *acc);
    }
    let mut means = AggregateTable::new();
    let mut all_folds = AggregateTable::new();
    let mut train_counts = AggregateTable::new();
    for p in &outcome.complete {
        means.push(&p.problem, p.mean_accuracy());
        for a in &p.accuracies {
            all_folds.push(&p.problem, *a);
        }
        train_counts.push(&p.problem, p.train_files);
    }
    let written = &mut outcome.written;
    write_table(quick.join(format!("TrainTest{}.csv", classifier)), &train_test, written)?;
    write_table(quick.join(format!("Average{}{}.csv", folds, classifier)), &means, written)?;
    write_table(quick.join(format!("AllFolds{}.csv", classifier)), &all_folds, written)?;
    write_table(quick.join(format!("trainFileCount{}.csv", classifier)), &train_counts, written)?;

    if read_times {
        let mut tt_times = AggregateTable::new();
        let mut mean_times = AggregateTable::new();
        let mut all_times = AggregateTable::new();
        for p in &outcome.complete {
            let times: Vec<f64> = p.times.iter().flatten().copied().collect();
            if let Some(first) = times.first() {
                tt_times.push(&p.problem, *first);
            }
            mean_times.push(&p.problem, times.iter().sum::<f64>() / times.len() as f64);
            for t in &times {
                all_times.push(&p.problem, *t);
            }
        }
        write_table(quick.join(format!("TimesTrainTest{}.csv", classifier)), &tt_times, written)?;
        write_table(quick.join(format!("TimeAverage{}{}.csv", folds, classifier)), &mean_times, written)?;
        write_table(quick.join(format!("TimeAllFolds{}.csv", classifier)), &all_times, written)?;
    }
    outcome.timings_written = read_times;

    if !request.sources.is_empty() {
        let mut header = format!("Problem,{}", classifier);
        let mut train_tests = Vec::with_capacity(roots.len());
        let mut averages = Vec::with_capacity(roots.len());
        for (source, root) in request.sources.iter().zip(&roots) {
            tracing::info!("Comparing {} to {}", classifier, source);
            header.push_str(&format!(",{}", source));
            train_tests.push(load_reference_table(
                &root
                    .join("TrainTest")
                    .join(format!("TrainTest{}.csv", source.classifier)),
            )?);
            averages.push(load_reference_table(
                &root
                    .join("Average30")
                    .join(format!("Average30{}.csv", source.classifier)),
            )?);
        }
        header.push('\n');

        let (all, complete) = comparison_rows(
            &header,
            outcome.train_test.iter().map(|(p, v)| (p.as_str(), *v)),
            &train_tests,
        );
        let written = &mut outcome.written;
        write_text(quick.join(format!("CompareTrainTest{}.csv", classifier)), &all, written)?;
        write_text(
            quick.join(format!("CompareTrainTestCompleteOnly{}.csv", classifier)),
            &complete,
            written,
        )?;

        let (all, complete) = comparison_rows(
            &header,
            outcome
                .complete
                .iter()
                .map(|p| (p.problem.as_str(), p.mean_accuracy())),
            &averages,
        );
        let written = &mut outcome.written;
        write_text(quick.join(format!("CompareAverage{}_{}.csv", folds, classifier)), &all, written)?;
        write_text(
            quick.join(format!("CompareAverageCompleteOnly{}.csv", classifier)),
            &complete,
            written,
        )?;
    }

    tracing::info!(
        "{}: {} complete problems, {} incomplete",
        classifier,
        outcome.complete.len(),
        outcome.incomplete.len()
    );
    Ok(outcome)
}
