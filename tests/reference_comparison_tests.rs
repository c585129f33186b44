//! Integration tests for the quick-results and reference comparison stage

mod common;

use common::{legacy_fold, read, write_fold};
use foldstat::config::FileConfig;
use foldstat::error::CollateError;
use foldstat::reference::{compare_to_reference, ReferenceRequest};
use foldstat::results::ResultFileFormat;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn request(primary: &Path, folds: usize, file: &FileConfig) -> ReferenceRequest {
    ReferenceRequest {
        primary: primary.to_path_buf(),
        recalc_accuracy: true,
        folds,
        format: ResultFileFormat::Legacy,
        sources: Vec::new(),
        roots: file.reference_roots(),
    }
}

fn write_reference(root: &Path, classifier: &str, train_test: &str, average: &str) {
    fs::create_dir_all(root.join("TrainTest")).unwrap();
    fs::create_dir_all(root.join("Average30")).unwrap();
    fs::write(root.join("TrainTest").join(format!("TrainTest{}.csv", classifier)), train_test).unwrap();
    fs::write(root.join("Average30").join(format!("Average30{}.csv", classifier)), average).unwrap();
}

#[test]
fn test_consistent_results_with_two_reference_sources() {
    let dir = TempDir::new().unwrap();
    let results = dir.path().join("results");
    for fold in 0..2 {
        write_fold(&results, "TSF", "Beef", fold, &legacy_fold("Beef", "TSF", 2));
        write_fold(&results, "TSF", "CinCECGTorso", fold, &legacy_fold("CinCECGTorso", "TSF", 1));
    }
    write_reference(&dir.path().join("bakeoff"), "ST", "Beef,0.9\nCinCECGtorso,0.85\n", "Beef,0.88\n");
    write_reference(&dir.path().join("redux"), "BOSS", "Beef,0.8\n", "Beef,0.82\nCinCECGTorso,0.9\n");

    let file = FileConfig::from_toml_str(&format!(
        "[reference_roots]\nbakeoff = {:?}\nREDUX = {:?}\n",
        dir.path().join("bakeoff"),
        dir.path().join("redux")
    ))
    .unwrap();
    let primary = results.join("TSF");
    let mut req = request(&primary, 2, &file);
    req.sources = vec!["BAKEOFF,ST".parse().unwrap(), "redux,BOSS".parse().unwrap()];

    let outcome = compare_to_reference(&req).unwrap();
    assert_eq!(outcome.complete.len(), 2);
    assert!(outcome.incomplete.is_empty());

    let quick = primary.join("QuickResults");
    assert_eq!(
        read(quick.join("CompareTrainTestTSF.csv")),
        "Problem,TSF,BAKEOFF_ST,REDUX_BOSS\nBeef,1,0.9,0.8\nCinCECGTorso,0.5,0.85,\n"
    );
    assert_eq!(
        read(quick.join("CompareTrainTestCompleteOnlyTSF.csv")),
        "Problem,TSF,BAKEOFF_ST,REDUX_BOSS\nBeef,1,0.9,0.8\n"
    );
    assert_eq!(
        read(quick.join("CompareAverage2_TSF.csv")),
        "Problem,TSF,BAKEOFF_ST,REDUX_BOSS\nBeef,1,0.88,0.82\nCinCECGTorso,0.5,,0.9\n"
    );
    assert_eq!(read(quick.join("trainFileCountTSF.csv")), "Beef,0\nCinCECGTorso,0\n");
    assert_eq!(read(quick.join("TimesTrainTestTSF.csv")), "Beef,25\nCinCECGTorso,25\n");
}

#[test]
fn test_accuracy_mismatch_stops_the_run() {
    let dir = TempDir::new().unwrap();
    let text = "Beef,TSF,test\nBuildTime,25,CVAcc,0.9\n1\n0,0,0.8,0.2\n1,0,0.6,0.4\n";
    write_fold(dir.path(), "TSF", "Beef", 0, text);

    let req = request(&dir.path().join("TSF"), 1, &FileConfig::default());
    let err = compare_to_reference(&req).unwrap_err();
    match err.downcast_ref::<CollateError>() {
        Some(CollateError::AccuracyMismatch { stored, computed, .. }) => {
            assert_eq!((*stored, *computed), (1.0, 0.5));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_unknown_reference_tag_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write_fold(dir.path(), "TSF", "Beef", 0, &legacy_fold("Beef", "TSF", 2));

    let mut req = request(&dir.path().join("TSF"), 1, &FileConfig::default());
    req.sources = vec!["ELSEWHERE,ST".parse().unwrap()];
    let err = compare_to_reference(&req).unwrap_err();
    assert!(err.downcast_ref::<CollateError>().unwrap().is_usage_error());
    assert!(!dir.path().join("TSF/QuickResults").exists());
}

#[test]
fn test_current_layout_reads_time_from_line_three() {
    let dir = TempDir::new().unwrap();
    let text = "Beef,TSF,test,0,MILLISECONDS,PREDICTIONS,\nCVAcc,0.9\n0.5,40,3,-1,100,2\n0,0,,0.9,0.1\n1,0,,0.6,0.4\n";
    write_fold(dir.path(), "TSF", "Beef", 0, text);

    let mut req = request(&dir.path().join("TSF"), 1, &FileConfig::default());
    req.format = ResultFileFormat::Current;
    let outcome = compare_to_reference(&req).unwrap();
    assert_eq!(outcome.complete[0].times, vec![Some(40.0)]);
    assert_eq!(read(dir.path().join("TSF/QuickResults/TimeAllFoldsTSF.csv")), "Beef,40\n");
}
