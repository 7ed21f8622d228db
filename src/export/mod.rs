use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::report::DashboardReport;

pub mod csv;
pub mod json;
pub mod text;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Text,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self, ExportError> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| Self::from_str(ext).ok())
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] ::csv::Error),
    #[error("Formatting error")]
    FormatError(#[from] std::fmt::Error),
}

/// Write the dashboard report to `output_path` in the given format
pub fn export_report<P: AsRef<Path>>(
    report: &DashboardReport,
    format: ExportFormat,
    output_path: P,
) -> Result<(), ExportError> {
    let path = output_path.as_ref();
    match format {
        ExportFormat::Json => json::export_json(report, path)?,
        ExportFormat::Csv => csv::export_series(report, path)?,
        ExportFormat::Text => text::export_report(report, path)?,
    }
    info!(file = %path.display(), format = ?format, "Report exported");
    Ok(())
}
