// Shared fixtures for the integration tests: a results tree on disk
#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// Legacy-layout fold file with two instances, accuracy consistent with predictions
pub fn legacy_fold(problem: &str, classifier: &str, correct: usize) -> String {
    let first = if correct >= 1 { "0,0,0.8,0.2" } else { "0,1,0.4,0.6" };
    let second = if correct >= 2 { "1,1,0.3,0.7" } else { "1,0,0.6,0.4" };
    format!(
        "{},{},test\nBuildTime,25,CVAcc,0.9\n{}\n{}\n{}\n",
        problem,
        classifier,
        correct as f64 / 2.0,
        first,
        second
    )
}

pub fn write_fold(root: &Path, classifier: &str, problem: &str, fold: usize, text: &str) {
    let dir = root.join(classifier).join("Predictions").join(problem);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("testFold{}.csv", fold)), text).unwrap();
}

/// Every fold of every problem present, with `correct` instances right
pub fn write_classifier(root: &Path, classifier: &str, problems: &[&str], folds: usize, correct: usize) {
    for problem in problems {
        for fold in 0..folds {
            write_fold(root, classifier, problem, fold, &legacy_fold(problem, classifier, correct));
        }
    }
}

pub fn write_problem_list(root: &Path, problems: &[&str]) -> std::path::PathBuf {
    let path = root.join("problems.txt");
    fs::write(&path, problems.join("\n")).unwrap();
    path
}

pub fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path.as_ref())
        .unwrap_or_else(|e| panic!("cannot read {}: {}", path.as_ref().display(), e))
}
