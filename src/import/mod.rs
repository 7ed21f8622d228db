use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ImportError, Result};
use crate::models::ActivitySet;

pub mod csv;
pub mod discipline;
pub mod json;
pub mod literal;

/// Trait for loading activities from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Load the complete activity set from the file
    fn import_file(&self, file_path: &Path) -> Result<ActivitySet>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Picks the importer for an activity file
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(csv::CsvImporter::new()),
            Box::new(json::JsonImporter::new()),
        ];

        Self { importers }
    }

    /// Load a file, auto-detecting the format from its extension
    pub fn load(&self, file_path: &Path) -> Result<ActivitySet> {
        for importer in &self.importers {
            if importer.can_import(file_path) {
                info!(
                    file = %file_path.display(),
                    format = importer.get_format_name(),
                    "Importing activities"
                );
                return importer.import_file(file_path);
            }
        }

        Err(ImportError::UnsupportedFormat {
            path: file_path.to_path_buf(),
        }
        .into())
    }

    /// Check if this manager can import a given file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers.iter().any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Row counters collected during one import
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub rows: usize,
    pub skipped: usize,
    pub unknown_type: usize,
}

impl ImportStats {
    fn report(&self, format: &str) {
        if self.skipped > 0 {
            warn!(format, skipped = self.skipped, "Dropped rows without a valid start time");
        }
        info!(
            format,
            rows = self.rows,
            skipped = self.skipped,
            unknown_type = self.unknown_type,
            "Import finished"
        );
    }
}

/// Parse a local start timestamp as written by the exporter
pub fn parse_start_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    for format in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a non-negative numeric cell; blanks, NaN and negatives are absent
pub fn parse_measure(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_parse_start_time_formats() {
        assert!(parse_start_time("2024-05-01 07:12:33").is_some());
        assert!(parse_start_time("2024-05-01T07:12:33").is_some());
        assert!(parse_start_time("2024-05-01 07:12:33.5").is_some());
        assert_eq!(
            parse_start_time("2024-05-01").map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert!(parse_start_time("01.05.2024").is_none());
        assert!(parse_start_time("").is_none());
    }

    #[test]
    fn test_parse_measure() {
        assert_eq!(parse_measure(" 1500.5 "), Some(1500.5));
        assert_eq!(parse_measure(""), None);
        assert_eq!(parse_measure("NaN"), None);
        assert_eq!(parse_measure("-3"), None);
    }

    #[test]
    fn test_manager_picks_importer_by_extension() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "startTimeLocal,activityType,distance,duration").unwrap();
        writeln!(file, "2024-05-01 07:00:00,running,5000,1500").unwrap();

        let manager = ImportManager::new();
        assert!(manager.can_import_file(file.path()));
        let set = manager.load(file.path()).unwrap();
        assert_eq!(set.len(), 1);

        assert!(!manager.can_import_file(Path::new("activities.fit")));
        assert!(manager.load(Path::new("activities.fit")).is_err());
    }
}
