use canopy::config::DashboardConfig;
use canopy::edit::{add_column, export_table, ColumnKind, EditController, EditSource};
use canopy::registry::UploadedSource;
use canopy::session::DashboardSession;
use canopy::storage::{TableStore, Workbook, WorkbookFile};
use canopy::table::{Cell, Table};
use chrono::NaiveDate;

fn table_a() -> Table {
    Table::from_rows(["id", "v"], vec![vec![Cell::from(1), Cell::from("a")]])
}

fn table_b() -> Table {
    Table::from_rows(
        ["id", "when", "ok"],
        vec![
            vec![Cell::from(1), Cell::DateTime(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap()), Cell::from(true)],
            vec![Cell::from(2.5), Cell::Missing, Cell::from(false)],
        ],
    )
}

fn sheet_json(path: &std::path::Path, name: &str) -> serde_json::Value {
    let v: serde_json::Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
    v["sheets"].as_array().unwrap().iter().find(|s| s["name"] == name).cloned().unwrap()
}

#[test]
fn test_replacing_one_table_leaves_sibling_unchanged() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("db.json");
    let store = WorkbookFile::new(&path);
    store.replace_table("A", &table_a()).unwrap();
    store.replace_table("B", &table_b()).unwrap();
    let before = sheet_json(&path, "B");

    let new_rows = Table::from_rows(["x"], vec![vec![Cell::from(42)], vec![Cell::from("y")]]);
    store.replace_table("A", &new_rows).unwrap();

    assert_eq!(sheet_json(&path, "B"), before);
    assert_eq!(store.read_table("B").unwrap(), table_b());
    assert_eq!(store.read_table("A").unwrap(), new_rows);
    assert_eq!(store.list_tables().unwrap(), vec!["A", "B"]);
}

#[test]
fn test_edited_upload_lands_in_default_store() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("data").join("db.json");
    let upload_bytes = Workbook::single("Sales", &table_a()).to_bytes().unwrap();
    let uploads = vec![UploadedSource::new("upload1.json", upload_bytes.clone())];

    let store = WorkbookFile::new(&path);
    let ctl = EditController::new(&store, &uploads);
    let mut copy = ctl.open(&EditSource::Upload("upload1.json".into()), "Sales").unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    copy.table = add_column(&copy.table, "qty", ColumnKind::Number, now).unwrap();
    ctl.save(&copy).unwrap();

    assert!(path.exists());
    assert_eq!(uploads[0].bytes, upload_bytes);
    let config = DashboardConfig { default_store: path.clone(), ..DashboardConfig::default() };
    let session = DashboardSession::load(config, uploads);
    // the saved copy now wins over the upload it came from
    let hit = session.registry().resolve_entry("Sales").unwrap();
    assert_eq!(hit.qualified, "default_Sales");
    assert!(hit.table.has_column("qty"));

    let dl = export_table(&copy.sheet, &copy.table).unwrap();
    assert_eq!(dl.file_name, "Sales_edited.json");
}
