use super::{n, t, table};
use crate::engine::aggregate::*;
use crate::engine::MetricError;
use crate::table::Cell;
use chrono::NaiveDate;

#[test]
fn test_sum_skips_uncoercible_values() {
    let sales = table(&["total"], vec![vec![n(10.0)], vec![t("x")], vec![n(5.0)]]);
    assert_eq!(sum_column(&sales, "total").unwrap(), 15.0);
}

#[test]
fn test_sum_of_empty_or_all_missing_is_zero() {
    let empty = table(&["total"], vec![]);
    assert_eq!(sum_column(&empty, "total").unwrap(), 0.0);
    let missing = table(&["total"], vec![vec![Cell::Missing], vec![t("n/a")]]);
    assert_eq!(sum_column(&missing, "total").unwrap(), 0.0);
}

#[test]
fn test_missing_column_is_unavailable() {
    let sales = table(&["amount"], vec![vec![n(1.0)]]);
    match sum_column(&sales, "total") {
        Err(MetricError::Unavailable(reason)) => assert!(reason.contains("total")),
        other => panic!("expected Unavailable, got {:?}", other),
    }
}

#[test]
fn test_count_equal_matches_trimmed_text() {
    let alerts = table(&["state"], vec![vec![t("Active")], vec![t("Closed")], vec![t(" Active ")], vec![Cell::Missing]]);
    assert_eq!(count_equal(&alerts, "state", "Active").unwrap(), 2);
    assert_eq!(count_equal(&alerts, "state", "Pending").unwrap(), 0);
}

#[test]
fn test_threshold_excludes_missing_comparands() {
    let inv = table(
        &["qty", "min"],
        vec![vec![n(2.0), n(5.0)], vec![n(10.0), n(5.0)], vec![t("n/a"), n(5.0)]],
    );
    let low = rows_at_or_below(&inv, "qty", "min").unwrap();
    assert_eq!(low.height(), 1);
    assert_eq!(low.get(0, "qty"), Some(&n(2.0)));
}

#[test]
fn test_threshold_includes_equality() {
    let inv = table(&["qty", "min"], vec![vec![n(5.0), n(5.0)], vec![n(6.0), t("5")]]);
    assert_eq!(rows_at_or_below(&inv, "qty", "min").unwrap().height(), 1);
}

#[test]
fn test_top_n_ties_keep_input_order() {
    let rows = table(
        &["k", "v"],
        vec![vec![t("A"), n(4.0)], vec![t("B"), n(10.0)], vec![t("C"), n(5.0)], vec![t("A"), n(6.0)]],
    );
    for _ in 0..5 {
        let top = top_n(&rows, &["k"], "v", 2).unwrap();
        let keys: Vec<&str> = top.column_cells("k").unwrap().filter_map(|c| c.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(top.get(0, "v"), Some(&n(10.0)));
    }
}

#[test]
fn test_top_n_with_composite_key() {
    let rows = table(
        &["first", "last", "v"],
        vec![
            vec![t("Ana"), t("Diaz"), n(3.0)],
            vec![t("Ana"), t("Lopez"), n(2.0)],
            vec![t("Ana"), t("Diaz"), n(1.0)],
        ],
    );
    let top = top_n(&rows, &["first", "last"], "v", 5).unwrap();
    assert_eq!(top.height(), 2);
    assert_eq!(top.columns(), &["first", "last", "v"]);
    assert_eq!(top.get(0, "last"), Some(&t("Diaz")));
    assert_eq!(top.get(0, "v"), Some(&n(4.0)));
}

#[test]
fn test_sum_by_skips_missing_keys_and_keeps_first_seen_order() {
    let sales = table(
        &["method", "total"],
        vec![
            vec![t("Card"), n(5.0)],
            vec![t("Cash"), n(7.0)],
            vec![Cell::Missing, n(100.0)],
            vec![t("Card"), t("bad")],
            vec![t("Card"), n(1.0)],
        ],
    );
    let by = sum_by(&sales, &["method"], "total").unwrap();
    assert_eq!(by.height(), 2);
    assert_eq!(by.row(0).unwrap(), &[t("Card"), n(6.0)]);
    assert_eq!(by.row(1).unwrap(), &[t("Cash"), n(7.0)]);
}

#[test]
fn test_count_by_orders_by_frequency() {
    let qc = table(&["result"], vec![vec![t("Pass")], vec![t("Fail")], vec![t("Fail")], vec![t("Pass")], vec![t("Fail")]]);
    let counts = count_by(&qc, "result").unwrap();
    assert_eq!(counts.columns(), &["result", "count"]);
    assert_eq!(counts.row(0).unwrap(), &[t("Fail"), n(3.0)]);
    assert_eq!(counts.row(1).unwrap(), &[t("Pass"), n(2.0)]);
}

#[test]
fn test_daily_totals_are_ordered_by_date() {
    let d = |y, m, day, h| Cell::DateTime(NaiveDate::from_ymd_opt(y, m, day).unwrap().and_hms_opt(h, 0, 0).unwrap());
    let sales = table(
        &["sale_date", "total"],
        vec![
            vec![d(2024, 3, 2, 9), n(5.0)],
            vec![t("2024-03-01 18:30:00"), n(2.0)],
            vec![d(2024, 3, 2, 17), n(1.5)],
            vec![Cell::Missing, n(50.0)],
            vec![d(2024, 3, 1, 8), t("oops")],
        ],
    );
    let days = daily_totals(&sales, "sale_date", "total").unwrap();
    assert_eq!(
        days,
        vec![
            DailyTotal { date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), total: 2.0 },
            DailyTotal { date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(), total: 6.5 },
        ]
    );
    let on = count_on_day(&sales, "sale_date", NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()).unwrap();
    assert_eq!(on, 2);
    let before = count_on_day(&sales, "sale_date", NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()).unwrap();
    assert_eq!(before, 0);
}

#[test]
fn test_filter_equal_keeps_row_order() {
    let alerts = table(&["id", "state"], vec![vec![n(1.0), t("Active")], vec![n(2.0), t("Closed")], vec![n(3.0), t("Active")]]);
    let active = filter_equal(&alerts, "state", "Active").unwrap();
    let ids: Vec<f64> = active.column_cells("id").unwrap().filter_map(|c| c.as_f64()).collect();
    assert_eq!(ids, vec![1.0, 3.0]);
}
