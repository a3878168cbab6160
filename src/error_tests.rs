use super::*;

#[test]
fn test_store_error_mapping() {
    let e: AppError = StoreError::NotFound { table: "Sales".into() }.into();
    assert!(matches!(e, AppError::TableNotFound { .. }));
    assert_eq!(e.code_str(), "table_not_found");
    assert!(e.message().contains("Sales"));

    let e: AppError = StoreError::AlreadyExists { table: "Sales".into() }.into();
    assert_eq!(e.code_str(), "table_exists");

    let e: AppError = StoreError::Format { path: PathBuf::from("x.json"), message: "bad".into() }.into();
    assert!(matches!(e, AppError::SourceLoad { .. }));
}

#[test]
fn test_save_failures_are_persistence_errors() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let e = AppError::from_save(StoreError::Io(io));
    assert!(matches!(e, AppError::Persistence { .. }));
    assert!(e.message().contains("read-only"));
}

#[test]
fn test_serializes_with_type_tag() {
    let e = AppError::computation("computation_error", "boom");
    let v = serde_json::to_value(&e).unwrap();
    assert_eq!(v["type"], "computation");
    assert_eq!(v["code"], "computation_error");
    assert_eq!(e.to_string(), "computation_error: boom");
}
