use std::path::{Path, PathBuf};

/// File extension of workbook containers and downloads.
pub const WORKBOOK_EXT: &str = "json";

/// Source identifier for an uploaded file: its file name without the extension.
/// `reports/upload1.json` -> `upload1`; a name without extension is used as-is.
pub fn source_id_from_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => base.to_string(),
    }
}

/// Download name for an edited sheet: `<sheet>_edited.<ext>`.
pub fn export_file_name(sheet: &str) -> String {
    format!("{}_edited.{}", sheet, WORKBOOK_EXT)
}

pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
