use super::*;
use chrono::NaiveDate;
use polars::prelude::DataType;

fn sample() -> Table {
    Table::from_rows(
        ["id", "name", "qty"],
        vec![
            vec![Cell::from(1), Cell::from("Aurora"), Cell::from(2.5)],
            vec![Cell::from(2), Cell::from("Boreal")],
        ],
    )
}

#[test]
fn test_rows_are_padded_to_header_width() {
    let t = sample();
    assert_eq!(t.width(), 3);
    assert_eq!(t.height(), 2);
    assert_eq!(t.get(1, "qty"), Some(&Cell::Missing));
    assert_eq!(t.get(0, "nope"), None);
}

#[test]
fn test_select_and_missing_columns() {
    let t = sample();
    let p = t.select(&["name", "id"]).unwrap();
    assert_eq!(p.columns(), &["name".to_string(), "id".to_string()]);
    assert_eq!(p.get(0, "name"), Some(&Cell::from("Aurora")));
    assert!(t.select(&["name", "price"]).is_none());
    assert_eq!(t.missing_columns(&["id", "price", "stock"]), vec!["price", "stock"]);
}

#[test]
fn test_push_column_rejects_duplicates() {
    let mut t = sample();
    assert!(t.push_column("flag", Cell::Boolean(false)));
    assert!(!t.push_column("flag", Cell::Boolean(true)));
    assert_eq!(t.get(1, "flag"), Some(&Cell::Boolean(false)));
}

#[test]
fn test_render_drops_integral_fraction() {
    assert_eq!(Cell::Number(3.0).render().as_deref(), Some("3"));
    assert_eq!(Cell::Number(3.25).render().as_deref(), Some("3.25"));
    assert_eq!(Cell::Missing.render(), None);
    assert!(Cell::number(f64::NAN).is_missing());
}

#[test]
fn test_cells_serialize_untagged() {
    let dt = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(10, 30, 0).unwrap();
    let row = vec![Cell::Missing, Cell::Boolean(true), Cell::Number(4.0), Cell::text("x"), Cell::DateTime(dt)];
    let json = serde_json::to_value(&row).unwrap();
    assert_eq!(json, serde_json::json!([null, true, 4.0, "x", {"datetime": "2024-03-01T10:30:00"}]));
    let back: Vec<Cell> = serde_json::from_value(json).unwrap();
    assert_eq!(back, row);
}

#[test]
fn test_frame_roundtrip_keeps_types() {
    let dt = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(8, 0, 0).unwrap();
    let t = Table::from_rows(
        ["n", "label", "when", "ok", "mixed"],
        vec![
            vec![Cell::from(1.5), Cell::from("a"), Cell::DateTime(dt), Cell::Boolean(true), Cell::from(7)],
            vec![Cell::Missing, Cell::Missing, Cell::Missing, Cell::Missing, Cell::from("seven")],
        ],
    );
    let df = t.to_frame().unwrap();
    assert_eq!(df.column("n").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("label").unwrap().dtype(), &DataType::String);
    assert_eq!(df.column("ok").unwrap().dtype(), &DataType::Boolean);
    assert_eq!(df.column("mixed").unwrap().dtype(), &DataType::String);

    let back = Table::from_frame(&df).unwrap();
    assert_eq!(back.get(0, "n"), Some(&Cell::Number(1.5)));
    assert_eq!(back.get(0, "when"), Some(&Cell::DateTime(dt)));
    assert_eq!(back.get(1, "label"), Some(&Cell::Missing));
    // mixed columns widen to text
    assert_eq!(back.get(0, "mixed"), Some(&Cell::from("7")));
}

#[test]
fn test_deserialized_rows_are_normalised_to_header_width() {
    let t: Table = serde_json::from_str(r#"{"columns":["a","b"],"rows":[[1],[2,"x","extra"]]}"#).unwrap();
    assert_eq!(t.row(0).unwrap(), &[Cell::Number(1.0), Cell::Missing]);
    assert_eq!(t.row(1).unwrap(), &[Cell::Number(2.0), Cell::text("x")]);
    let coerced = crate::normalize::coerce_numeric(t, "b");
    assert_eq!(coerced.get(0, "b"), Some(&Cell::Missing));
    let bare: Table = serde_json::from_str(r#"{"columns":["id"]}"#).unwrap();
    assert_eq!(bare, Table::new(["id"]));
}
