use canopy::config::DashboardConfig;
use canopy::engine::MetricOutcome;
use canopy::registry::UploadedSource;
use canopy::session::DashboardSession;
use canopy::storage::{TableStore, Workbook, WorkbookFile};
use canopy::table::{Cell, Table};
use chrono::NaiveDate;

fn n(v: f64) -> Cell { Cell::Number(v) }
fn t(s: &str) -> Cell { Cell::text(s) }

fn seed_store(path: &std::path::Path) {
    let store = WorkbookFile::new(path);
    store.replace_table("Dispensaries", &Table::from_rows(["id", "name"], vec![
        vec![n(1.0), t("North")],
        vec![n(2.0), t("South")],
    ])).unwrap();
    store.replace_table("Products", &Table::from_rows(["id", "name"], vec![
        vec![n(100.0), t("Gummies")],
        vec![n(200.0), t("Oil")],
        vec![n(300.0), t("Balm")],
    ])).unwrap();
    store.replace_table("Customers", &Table::from_rows(["id", "first_name", "last_name"], vec![
        vec![n(1.0), t("Ana"), t("Diaz")],
        vec![n(2.0), t("Bo"), t("Li")],
    ])).unwrap();
    store.replace_table("Sales", &Table::from_rows(
        ["id", "dispensary_id", "customer_id", "sale_date", "total", "payment_method"],
        vec![
            vec![n(1.0), n(1.0), n(1.0), t("2024-06-01 09:00:00"), n(40.0), t("Cash")],
            vec![n(2.0), n(2.0), n(2.0), t("2024-06-02 11:00:00"), n(25.0), t("Card")],
            vec![n(3.0), n(1.0), n(2.0), t("2024-06-02 16:00:00"), t("n/a"), t("Card")],
            vec![n(4.0), n(2.0), n(1.0), t("2024-06-03 12:00:00"), n(10.0), t("Cash")],
        ],
    )).unwrap();
    store.replace_table("SaleLineItems", &Table::from_rows(["sale_id", "product_id", "quantity"], vec![
        vec![n(1.0), n(100.0), n(3.0)],
        vec![n(2.0), n(200.0), n(3.0)],
        vec![n(4.0), n(300.0), n(1.0)],
    ])).unwrap();
    store.replace_table("LocationInventory", &Table::from_rows(["product_id", "dispensary_id", "quantity", "min_stock"], vec![
        vec![n(100.0), n(1.0), n(2.0), n(5.0)],
        vec![n(200.0), n(2.0), n(10.0), n(5.0)],
        vec![n(300.0), n(2.0), t("n/a"), n(5.0)],
    ])).unwrap();
    store.replace_table("WarehouseInventory", &Table::from_rows(["product_id", "quantity", "max_stock"], vec![
        vec![n(100.0), n(50.0), n(200.0)],
    ])).unwrap();
    store.replace_table("Alerts", &Table::from_rows(
        ["id", "state", "priority", "type", "message", "product_id", "creation_date"],
        vec![
            vec![n(1.0), t("Active"), t("High"), t("Stock"), t("Low gummies"), n(100.0), t("2024-06-01")],
            vec![n(2.0), t("Resolved"), t("Low"), t("QC"), t("Retest done"), n(200.0), t("2024-05-20")],
            vec![n(3.0), t("Active"), t("Low"), t("QC"), t("Label check"), n(999.0), t("2024-06-02")],
        ],
    )).unwrap();
    store.replace_table("QualityControl", &Table::from_rows(["id", "result"], vec![
        vec![n(1.0), t("Pass")],
        vec![n(2.0), t("Fail")],
        vec![n(3.0), t("Pass")],
    ])).unwrap();
}

fn config(path: &std::path::Path) -> DashboardConfig {
    DashboardConfig { default_store: path.to_path_buf(), top_n: 2, ..DashboardConfig::default() }
}

#[test]
fn test_full_report_over_default_store() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("db.json");
    seed_store(&path);
    let session = DashboardSession::load(config(&path), vec![])
        .with_today(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    let report = session.report(Some("South"));

    assert!(report.load_errors.is_empty());
    assert!(report.missing_tables.is_empty());
    assert_eq!(report.total_sales, MetricOutcome::Available(75.0));
    // one of today's two sales has an unreadable total; it still counts
    assert_eq!(report.sales_today, MetricOutcome::Available(2));
    assert_eq!(report.active_alerts, MetricOutcome::Available(2));
    assert_eq!(report.low_stock, MetricOutcome::Available(1));
    assert_eq!(report.daily_sales.available().unwrap().len(), 3);
    assert_eq!(
        report.dispensary_options,
        MetricOutcome::Available(vec!["All".to_string(), "North".to_string(), "South".to_string()])
    );

    let top = report.top_products.available().unwrap();
    assert_eq!(top.height(), 2);
    assert_eq!(top.get(0, "name"), Some(&t("Gummies")));
    assert_eq!(top.get(1, "name"), Some(&t("Oil")));

    let customers = report.top_customers.available().unwrap();
    assert_eq!(customers.get(0, "full_name"), Some(&t("Ana Diaz")));
    assert_eq!(customers.get(0, "total"), Some(&n(50.0)));

    let location = report.location_stock.available().unwrap();
    assert_eq!(location.height(), 2);

    let critical = report.critical_stock.available().unwrap();
    assert_eq!(critical.row(0).unwrap(), &[t("North"), t("Gummies"), n(2.0), n(5.0)]);

    let details = report.active_alert_details.available().unwrap();
    assert_eq!(details.columns(), &["type", "message", "priority", "name", "creation_date"]);
    assert_eq!(details.height(), 2);
    assert_eq!(details.get(1, "name"), Some(&Cell::Missing));

    let warehouse = report.warehouse_stock.available().unwrap();
    assert_eq!(warehouse.get(0, "stock_level"), Some(&n(25.0)));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["total_sales"]["status"], "available");
    assert_eq!(json["total_sales"]["value"], 75.0);
}

#[test]
fn test_broken_upload_does_not_block_other_sources() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("db.json");
    seed_store(&path);
    let extra = Table::from_rows(["id", "result"], vec![vec![n(9.0), t("Fail")]]);
    let uploads = vec![
        UploadedSource::new("broken.json", b"not a workbook".to_vec()),
        UploadedSource::new("lab.json", Workbook::single("LabResults", &extra).to_bytes().unwrap()),
    ];
    let session = DashboardSession::load(config(&path), uploads);
    assert_eq!(session.load_errors().len(), 1);
    assert_eq!(session.load_errors()[0].code_str(), "source_load_failed");
    assert!(session.registry().get("lab_LabResults").is_some());
    assert!(session.report(None).total_sales.is_available());
}

#[test]
fn test_missing_default_store_reports_every_table_unavailable() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("absent").join("db.json");
    let session = DashboardSession::load(config(&path), vec![]);
    let report = session.report(None);
    assert!(report.load_errors.is_empty());
    assert_eq!(report.missing_tables.len(), 9);
    assert!(matches!(report.total_sales, MetricOutcome::Unavailable(_)));
    assert!(matches!(report.critical_stock, MetricOutcome::Unavailable(_)));
    assert!(!WorkbookFile::new(&path).exists());
}
