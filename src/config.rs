// Run configuration
//
// Every stage receives an explicit `CollationContext` instead of reading shared
// mutable settings. The context can be built from CLI arguments, from a
// `foldstat.toml` file, or from both (CLI values win).

use crate::results::ResultFileFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A classifier to collate and the number of parameter columns it reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierSpec {
    pub name: String,
    pub num_params: usize,
}

impl ClassifierSpec {
    pub fn new(name: impl Into<String>, num_params: usize) -> Self {
        Self {
            name: name.into(),
            num_params,
        }
    }
}

impl FromStr for ClassifierSpec {
    type Err = String;

    /// `NAME` or `NAME:NUM_PARAMS`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, params) = match s.rsplit_once(':') {
            Some((name, n)) => {
                let n = n
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("invalid parameter count in '{}'", s))?;
                (name.trim(), n)
            }
            None => (s.trim(), 0),
        };
        if name.is_empty() {
            return Err(format!("empty classifier name in '{}'", s));
        }
        Ok(Self::new(name, params))
    }
}

impl fmt::Display for ClassifierSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num_params == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.name, self.num_params)
        }
    }
}

/// Everything a collation stage needs to know about a run
#[derive(Debug, Clone)]
pub struct CollationContext {
    /// Results root: contains one directory per classifier
    pub base_path: PathBuf,
    /// Sorted, de-duplicated problem names
    pub problems: Vec<String>,
    pub folds: usize,
    pub classifiers: Vec<ClassifierSpec>,
    pub count_partials: bool,
    pub format: ResultFileFormat,
    /// Also write the comparison report as JSON
    pub write_json: bool,
}

impl CollationContext {
    pub fn new(
        base_path: impl Into<PathBuf>,
        problems: Vec<String>,
        folds: usize,
        classifiers: Vec<ClassifierSpec>,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            problems: normalise_problems(problems),
            folds,
            classifiers,
            count_partials: false,
            format: ResultFileFormat::default(),
            write_json: false,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.folds == 0 {
            return Err("folds must be > 0".to_string());
        }
        if self.classifiers.is_empty() {
            return Err("at least one classifier is required".to_string());
        }
        let mut seen = HashSet::new();
        for c in &self.classifiers {
            if !seen.insert(c.name.as_str()) {
                return Err(format!("classifier '{}' listed more than once", c.name));
            }
        }
        Ok(())
    }

    pub fn classifier_names(&self) -> Vec<&str> {
        self.classifiers.iter().map(|c| c.name.as_str()).collect()
    }

    /// Concatenated classifier names used to label cross-classifier outputs
    pub fn names_label(&self) -> String {
        self.classifier_names().concat()
    }

    pub fn classifier_dir(&self, classifier: &str) -> PathBuf {
        self.base_path.join(classifier)
    }

    pub fn summary_dir(&self, classifier: &str) -> PathBuf {
        self.classifier_dir(classifier).join("SummaryStats")
    }

    pub fn predictions_dir(&self, classifier: &str, problem: &str) -> PathBuf {
        self.classifier_dir(classifier)
            .join("Predictions")
            .join(problem)
    }

    /// Where cross-classifier tables go: a directory named after the classifier
    /// set, or the classifier's own `SummaryStats` when there is only one.
    pub fn averaged_dir(&self) -> PathBuf {
        match self.classifiers.as_slice() {
            [only] => self.summary_dir(&only.name),
            _ => self.base_path.join(self.names_label()),
        }
    }
}

/// Sort and de-duplicate problem names, dropping blanks
pub fn normalise_problems(problems: Vec<String>) -> Vec<String> {
    let mut problems: Vec<String> = problems
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    problems.sort();
    problems.dedup();
    problems
}

/// Read the problem universe: every sub-directory of a directory, or one name
/// per line of a list file (first comma-separated field).
pub fn load_problems(path: &Path) -> Result<Vec<String>> {
    let problems = if path.is_dir() {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)
            .with_context(|| format!("Failed to list problem directory: {}", path.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names
    } else {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read problem list: {}", path.display()))?;
        content
            .lines()
            .filter_map(|l| l.split(',').next())
            .map(str::to_string)
            .collect()
    };
    Ok(normalise_problems(problems))
}

/// Default locations of the reference result collections, keyed by tag
pub fn default_reference_roots() -> BTreeMap<String, PathBuf> {
    [
        ("BAKEOFF", "ReferenceResults/Bakeoff2015/byClassifier"),
        ("HIVE-COTE", "ReferenceResults/HIVE-COTE2017"),
        ("REDUX", "ReferenceResults/BakeoffRedux2019"),
    ]
    .into_iter()
    .map(|(tag, root)| (tag.to_string(), PathBuf::from(root)))
    .collect()
}

/// Contents of a `foldstat.toml` file. Every field is optional.
///
/// # Example TOML
/// ```toml
/// results = "/data/results"
/// problems = "/data/problems.txt"
/// folds = 30
/// classifiers = ["RotF:2", "TSF"]
/// format = "current"
///
/// [reference_roots]
/// BAKEOFF = "/data/reference/Bakeoff2015/byClassifier"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub results: Option<PathBuf>,
    pub problems: Option<PathBuf>,
    pub folds: Option<usize>,
    pub classifiers: Vec<String>,
    pub count_partials: Option<bool>,
    pub format: Option<ResultFileFormat>,
    pub json: Option<bool>,
    pub reference_roots: BTreeMap<String, PathBuf>,
}

impl FileConfig {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    pub fn classifier_specs(&self) -> Result<Vec<ClassifierSpec>> {
        self.classifiers
            .iter()
            .map(|s| s.parse::<ClassifierSpec>().map_err(anyhow::Error::msg))
            .collect()
    }

    /// Built-in reference roots overridden by the file's entries. Tags are upper-cased.
    pub fn reference_roots(&self) -> BTreeMap<String, PathBuf> {
        let mut roots = default_reference_roots();
        for (tag, root) in &self.reference_roots {
            roots.insert(tag.to_uppercase(), root.clone());
        }
        roots
    }
}
