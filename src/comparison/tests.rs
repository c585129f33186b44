// Tests for pairwise and global classifier comparison

use super::*;
use crate::config::ClassifierSpec;
use crate::stats::paired_lower_tail_p;
use crate::table::AggregateTable;
use tempfile::TempDir;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn matrix(classifiers: &[&str], rows: Vec<(&str, Vec<Option<f64>>)>) -> ComparisonMatrix {
    ComparisonMatrix::new(
        names(classifiers),
        rows.into_iter()
            .map(|(p, cells)| (p.to_string(), cells))
            .collect(),
    )
}

fn fold_table(rows: Vec<(&str, Vec<f64>)>) -> AggregateTable<f64> {
    let mut table = AggregateTable::new();
    for (problem, values) in rows {
        for v in values {
            table.push(problem, v);
        }
    }
    table
}

#[test]
fn test_win_draw_loss_totals_and_swap() {
    let pairs = [(0.9, 0.8), (0.5, 0.5), (0.1, 0.3), (0.7, 0.6)];
    let (w, d, l) = win_draw_loss(&pairs);
    assert_eq!((w, d, l), (2, 1, 1));
    assert_eq!(w + d + l, pairs.len());

    let swapped: Vec<(f64, f64)> = pairs.iter().map(|&(x, y)| (y, x)).collect();
    assert_eq!(win_draw_loss(&swapped), (l, d, w));
}

#[test]
fn test_matrix_absent_values() {
    let m = matrix(
        &["A", "B"],
        vec![("Beef", vec![Some(0.8), Some(-1.0)]), ("Coffee", vec![Some(0.9)])],
    );
    assert_eq!(m.get(0, 1), None);
    assert_eq!(m.get(1, 1), None);
    assert!(m.paired(0, 1).is_empty());
    assert!(m.complete_rows().is_empty());
}

#[test]
fn test_compare_means_only_uses_common_problems() {
    let m = matrix(
        &["A", "B"],
        vec![
            ("Beef", vec![Some(0.8), Some(0.7)]),
            ("Coffee", vec![Some(0.6), Some(0.8)]),
            ("Wine", vec![None, Some(0.9)]),
        ],
    );
    let pair = compare_means(&m, 0, 1);
    assert_eq!((pair.wins, pair.draws, pair.losses), (1, 0, 1));
    assert_eq!(pair.count, 2);
    assert!((pair.mean_diff.unwrap() - (-0.05)).abs() < 1e-12);
    assert!((pair.std_diff.unwrap() - 0.15).abs() < 1e-12);
    assert!((pair.sign_test_p - 0.25).abs() < 1e-12);
}

#[test]
fn test_scenario_listed_values_run_paired_test() {
    let a = [0.80, 0.82, 0.81];
    let b = [0.75, 0.90, 0.78];
    let mean_a = crate::stats::mean(&a).unwrap();
    let mean_b = crate::stats::mean(&b).unwrap();
    assert!((mean_a - 0.81).abs() < 1e-9);
    assert!((mean_b - 0.81).abs() < 1e-9);

    let diffs: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x - y).collect();
    assert!(paired_lower_tail_p(&diffs).unwrap().is_some());

    let first = fold_table(vec![("ItalyPowerDemand", a.to_vec())]);
    let second = fold_table(vec![("ItalyPowerDemand", b.to_vec())]);
    let problems = names(&["ItalyPowerDemand"]);
    assert_eq!(count_significant(&first, &second, &problems, 3).unwrap(), (0, 0));
}

#[test]
fn test_scenario_one_loss_for_first_classifier() {
    let a = [0.80, 0.82, 0.81];
    let b = [0.75, 0.90, 0.88];
    let m = matrix(
        &["A", "B"],
        vec![(
            "ItalyPowerDemand",
            vec![crate::stats::mean(&a), crate::stats::mean(&b)],
        )],
    );
    assert!((m.get(0, 1).unwrap() - 0.843_333).abs() < 1e-6);

    let pair = compare_means(&m, 0, 1);
    assert_eq!((pair.wins, pair.draws, pair.losses), (0, 0, 1));

    let first = fold_table(vec![("ItalyPowerDemand", a.to_vec())]);
    let second = fold_table(vec![("ItalyPowerDemand", b.to_vec())]);
    let problems = names(&["ItalyPowerDemand"]);
    // paired test runs but is not significant at either threshold
    assert_eq!(count_significant(&first, &second, &problems, 3).unwrap(), (0, 0));
}

#[test]
fn test_count_significant_thresholds_and_skips() {
    let first = fold_table(vec![
        ("Coffee", vec![0.9, 0.91, 0.92]),
        ("Beef", vec![0.5, 0.52, 0.51]),
        ("Wine", vec![0.7, 0.7]),
        ("Adiac", vec![0.6, 0.6, 0.6]),
    ]);
    let second = fold_table(vec![
        ("Coffee", vec![0.8, 0.79, 0.81]),
        ("Beef", vec![0.7, 0.71, 0.73]),
        ("Wine", vec![0.1, 0.1, 0.1]),
        ("Adiac", vec![0.6, 0.6, 0.6]),
    ]);
    let problems = names(&["Adiac", "Beef", "Coffee", "Wine"]);
    // Coffee: significant win, Beef: significant loss, Wine: short row, Adiac: identical
    assert_eq!(count_significant(&first, &second, &problems, 3).unwrap(), (1, 1));
}

#[test]
fn test_count_significant_uses_first_folds_only() {
    let first = fold_table(vec![("Beef", vec![0.9, 0.92, 0.91, 0.0])]);
    let second = fold_table(vec![("Beef", vec![0.5, 0.51, 0.5, 1.0])]);
    let problems = names(&["Beef"]);
    assert_eq!(count_significant(&first, &second, &problems, 3).unwrap(), (1, 0));
}

#[test]
fn test_count_significant_skips_fold_without_value() {
    let first = fold_table(vec![
        ("Coffee", vec![0.9, f64::NAN, 0.92]),
        ("Beef", vec![0.9, 0.92, 0.91]),
    ]);
    let second = fold_table(vec![
        ("Coffee", vec![0.8, 0.79, 0.81]),
        ("Beef", vec![0.5, 0.51, 0.5]),
    ]);
    let problems = names(&["Beef", "Coffee"]);
    assert_eq!(count_significant(&first, &second, &problems, 3).unwrap(), (1, 0));
}

#[test]
fn test_sign_rank_block_marks_differences() {
    let mut rows = Vec::new();
    for i in 0..10 {
        let a = 0.5 + 0.04 * i as f64;
        let offset = 0.01 * (i + 1) as f64;
        let b = if i % 2 == 0 { a + offset } else { a - offset };
        let c = a - 0.1 - 0.001 * i as f64;
        rows.push((format!("P{}", i), vec![Some(a), Some(b), Some(c)]));
    }
    let m = ComparisonMatrix::new(names(&["A", "B", "C"]), rows);
    let block = sign_rank_block(&m).unwrap().unwrap();

    assert_eq!(block.problems, 10);
    assert!((block.alpha - 0.025).abs() < 1e-12);
    assert!(block.no_difference[0][1]);
    assert!(block.no_difference[1][0]);
    assert!(!block.no_difference[0][2]);
    assert!(!block.no_difference[2][0]);
    assert!(block.sign_rank[0][2].unwrap() < 0.025);
    assert_eq!(block.sign_rank[2][0], None);
}

#[test]
fn test_sign_rank_block_needs_complete_rows() {
    let m = matrix(
        &["A", "B"],
        vec![("Beef", vec![Some(0.8), Some(0.7)]), ("Coffee", vec![None, Some(0.7)])],
    );
    assert!(sign_rank_block(&m).unwrap().is_none());
}

#[test]
fn test_report_text_layout() {
    let m = matrix(
        &["A", "B"],
        vec![("Beef", vec![Some(0.8), Some(0.7)]), ("Coffee", vec![Some(0.6), Some(0.8)])],
    );
    let mut pair = compare_means(&m, 0, 1);
    pair.sig_wins = 1;
    let report = ComparisonReport {
        classifiers: names(&["A", "B"]),
        statistics: vec![StatisticComparison {
            statistic: Metric::TestAcc,
            pairs: vec![pair],
            sign_rank: sign_rank_block(&m).unwrap(),
        }],
    };
    let text = report.to_text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "AB");
    assert_eq!(lines[1], "**************TestAcc********************");
    assert_eq!(lines[2], "TestAcc,A,B,WIN/DRAW/LOSE,1,0,1, p =,0.25");
    assert_eq!(lines[3], "TestAcc,A,B,SIGWIN/SIGLOSS,1,0");
    assert_eq!(lines[4], "TestAcc,A,B,COUNT,2,MeanDiff,-0.05,StDevDiff,0.15");
    assert_eq!(lines[5], "SIGN RANK TEST ");
    assert_eq!(lines[6], " ,A,B");
    assert!(lines[7].starts_with("A,,"));

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["statistics"][0]["statistic"], "TestAcc");
    assert_eq!(json["statistics"][0]["pairs"][0]["wins"], 1);
}

#[test]
fn test_basic_summary_comparisons_end_to_end() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("AB")).unwrap();
    for metric in Metric::COMPARED {
        std::fs::write(
            root.join("AB").join(format!("Mean{}AB.csv", metric)),
            ",A,B\nBeef,0.81,0.843333\nCoffee,0.91,0.8\nWine,-1,0.5\n",
        )
        .unwrap();
    }
    for (cls, body) in [
        ("A", "Beef,0.8,0.82,0.81\nCoffee,0.9,0.91,0.92\nWine\n"),
        ("B", "Beef,0.75,0.9,0.88\nCoffee,0.8,0.79,0.81\nWine,0.5,0.5,0.5\n"),
    ] {
        let summary = root.join(cls).join("SummaryStats");
        std::fs::create_dir_all(&summary).unwrap();
        std::fs::write(summary.join(format!("{}TestAcc.csv", cls)), body).unwrap();
    }

    let mut ctx = CollationContext::new(
        root,
        names(&["Beef", "Coffee", "Wine"]),
        3,
        vec![ClassifierSpec::new("A", 0), ClassifierSpec::new("B", 0)],
    );
    ctx.write_json = true;

    let report = basic_summary_comparisons(&ctx).unwrap().unwrap();
    let acc = &report.statistic(Metric::TestAcc).unwrap().pairs[0];
    assert_eq!((acc.wins, acc.draws, acc.losses), (1, 0, 1));
    assert_eq!((acc.sig_wins, acc.sig_losses), (1, 0));

    // no per-fold tables for the other statistics
    let nll = &report.statistic(Metric::TestNLL).unwrap().pairs[0];
    assert_eq!((nll.sig_wins, nll.sig_losses), (0, 0));

    let text = std::fs::read_to_string(root.join("summaryTestsAB.csv")).unwrap();
    assert!(text.contains("TestAcc,A,B,WIN/DRAW/LOSE,1,0,1, p =,0.25"));
    assert!(text.contains("TestAUROC,A,B,SIGWIN/SIGLOSS,0,0"));
    assert!(root.join("summaryTestsAB.json").exists());
}

#[test]
fn test_single_classifier_has_no_comparisons() {
    let dir = TempDir::new().unwrap();
    let ctx = CollationContext::new(
        dir.path(),
        names(&["Beef"]),
        3,
        vec![ClassifierSpec::new("A", 0)],
    );
    assert!(basic_summary_comparisons(&ctx).unwrap().is_none());
}
