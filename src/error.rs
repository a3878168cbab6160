//! Unified application error model.
//! `StoreError` covers the table-store adapter; `AppError` is the serializable
//! error surfaced to callers (source loads, missing tables, metric failures, saves),
//! each variant carrying a stable `code` and a human readable `message`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Failures raised by a `TableStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("table '{table}' not found")]
    NotFound { table: String },
    #[error("table '{table}' already exists")]
    AlreadyExists { table: String },
    #[error("invalid workbook '{}': {message}", path.display())]
    Format { path: PathBuf, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// One uploaded or default source failed to parse; other sources are unaffected.
    SourceLoad { code: String, message: String },
    TableNotFound { code: String, message: String },
    /// Unexpected failure inside one metric.
    Computation { code: String, message: String },
    /// Save failed; the caller's working copy is untouched.
    Persistence { code: String, message: String },
    UserInput { code: String, message: String },
    Conflict { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::SourceLoad { code, .. }
            | AppError::TableNotFound { code, .. }
            | AppError::Computation { code, .. }
            | AppError::Persistence { code, .. }
            | AppError::UserInput { code, .. }
            | AppError::Conflict { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::SourceLoad { message, .. }
            | AppError::TableNotFound { message, .. }
            | AppError::Computation { message, .. }
            | AppError::Persistence { message, .. }
            | AppError::UserInput { message, .. }
            | AppError::Conflict { message, .. } => message.as_str(),
        }
    }

    pub fn source_load<S: Into<String>>(code: S, msg: S) -> Self { AppError::SourceLoad { code: code.into(), message: msg.into() } }
    pub fn table_not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::TableNotFound { code: code.into(), message: msg.into() } }
    pub fn computation<S: Into<String>>(code: S, msg: S) -> Self { AppError::Computation { code: code.into(), message: msg.into() } }
    pub fn persistence<S: Into<String>>(code: S, msg: S) -> Self { AppError::Persistence { code: code.into(), message: msg.into() } }
    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }

    /// Map a store failure that happened while saving.
    pub fn from_save(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists { table } => AppError::conflict("table_exists".to_string(), format!("table '{}' already exists", table)),
            other => AppError::persistence("save_failed".to_string(), other.to_string()),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { table } => AppError::TableNotFound { code: "table_not_found".into(), message: format!("table '{}' not found", table) },
            StoreError::AlreadyExists { table } => AppError::Conflict { code: "table_exists".into(), message: format!("table '{}' already exists", table) },
            StoreError::Format { .. } | StoreError::Json(_) => AppError::SourceLoad { code: "invalid_workbook".into(), message: err.to_string() },
            StoreError::Io(e) => AppError::Persistence { code: "io_error".into(), message: e.to_string() },
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as a computation failure unless mapped elsewhere
        AppError::Computation { code: "computation_error".into(), message: format!("{:#}", err) }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
