//! Property-based tests for the table, comparison and statistics layers
//!
//! Core properties tested:
//! 1. AggregateTable CSV round-trip
//! 2. Win/draw/loss totals and swap symmetry
//! 3. Sign test invariance under swapping wins and losses
//! 4. Mean and standard deviation against direct computation
//! 5. Average ranks and decimal formatting

use foldstat::comparison::win_draw_loss;
use foldstat::config::ClassifierSpec;
use foldstat::stats::{average_ranks, sign_test_p, summarise};
use foldstat::table::{format_decimal, AggregateTable};
use proptest::prelude::*;
use std::collections::BTreeMap;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_aggregate_table_round_trip(
        rows in prop::collection::btree_map(
            "[A-Z][a-zA-Z0-9]{0,12}",
            prop::collection::vec(-1.0e6f64..1.0e6, 0..8),
            0..10,
        ),
    ) {
        let problems: Vec<&String> = rows.keys().collect();
        let mut table = AggregateTable::with_problems(&problems);
        for (problem, values) in &rows {
            for v in values {
                table.push(problem, *v);
            }
        }

        let parsed = AggregateTable::<f64>::from_csv(&table.to_csv()).unwrap();
        prop_assert_eq!(parsed, table);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_win_draw_loss_totals_and_swap(
        pairs in prop::collection::vec((0u8..5, 0u8..5), 0..50),
    ) {
        let pairs: Vec<(f64, f64)> = pairs
            .into_iter()
            .map(|(x, y)| (f64::from(x) / 4.0, f64::from(y) / 4.0))
            .collect();
        let (w, d, l) = win_draw_loss(&pairs);
        prop_assert_eq!(w + d + l, pairs.len());

        let swapped: Vec<(f64, f64)> = pairs.iter().map(|&(x, y)| (y, x)).collect();
        prop_assert_eq!(win_draw_loss(&swapped), (l, d, w));
    }

    #[test]
    fn prop_sign_test_symmetric_and_bounded(wins in 0usize..200, losses in 0usize..200) {
        let p = sign_test_p(wins, losses);
        prop_assert!((p - sign_test_p(losses, wins)).abs() < 1e-12);
        prop_assert!(p >= 0.0);
        prop_assert!(p <= 1.0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_summary_matches_direct_computation(
        values in prop::collection::vec(0.0f64..1.0, 1..40),
    ) {
        let summary = summarise(&values).unwrap();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        prop_assert_eq!(summary.count, values.len());
        prop_assert!((summary.mean - mean).abs() < 1e-9);
        prop_assert!((summary.std_dev - variance.sqrt()).abs() < 1e-6);
        prop_assert!(summary.std_dev >= 0.0);
    }

    #[test]
    fn prop_average_ranks_sum(values in prop::collection::vec(0u8..10, 1..30)) {
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();
        let ranks = average_ranks(&values);
        let n = values.len() as f64;
        prop_assert!((ranks.iter().sum::<f64>() - n * (n + 1.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn prop_format_decimal_within_rounding(value in -1.0e4f64..1.0e4) {
        let text = format_decimal(value);
        let parsed: f64 = text.parse().unwrap();
        prop_assert!((parsed - value).abs() <= 5.0e-7 + 1e-12);
        prop_assert!(!text.ends_with('.'));
    }

    #[test]
    fn prop_classifier_spec_round_trip(name in "[A-Za-z][A-Za-z0-9_-]{0,15}", params in 0usize..8) {
        let spec = ClassifierSpec::new(name, params);
        let parsed: ClassifierSpec = spec.to_string().parse().unwrap();
        prop_assert_eq!(parsed, spec);
    }
}

#[test]
fn test_empty_rows_survive_round_trip() {
    let mut rows = BTreeMap::new();
    rows.insert("Beef", vec![0.5, 0.25]);
    let mut table = AggregateTable::with_problems(&["Adiac", "Beef"]);
    for (problem, values) in &rows {
        for v in values {
            table.push(problem, *v);
        }
    }
    let text = table.to_csv();
    assert_eq!(text, "Adiac\nBeef,0.5,0.25\n");
    assert_eq!(AggregateTable::<f64>::from_csv(&text).unwrap(), table);
}
