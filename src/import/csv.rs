use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use super::discipline::DisciplineColumns;
use super::{parse_measure, parse_start_time, ImportFormat, ImportStats};
use crate::error::{DashError, ImportError, Result};
use crate::models::{Activity, ActivitySet, TypeKey};

/// Reader for the flat activity cache written by the fetch step
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Exporter column names and common snake_case variants
        Self::add_mapping(
            &mut column_mapping,
            "start_time",
            &["startTimeLocal", "start_time_local", "start_time", "date"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "distance",
            &["distance", "distance_m", "dist"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "duration",
            &["duration", "duration_s", "elapsed_time"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "heart_rate",
            &["averageHR", "average_hr", "avg_hr", "heart_rate"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "speed",
            &["averageSpeed", "average_speed", "avg_speed"],
        );
        Self::add_mapping(&mut column_mapping, "calories", &["calories", "kcal"]);

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> Option<&str> {
        self.column_mapping
            .get(&name.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Import activities from any reader producing CSV text
    pub fn import_reader<R: Read>(&self, reader: R) -> Result<ActivitySet> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers().map_err(ImportError::from)?.clone();
        let discipline_columns = DisciplineColumns::locate(&headers)?;
        let columns = ColumnIndex::build(&headers, |h| self.normalize_column_name(h));

        let start_idx = columns.get("start_time").ok_or_else(|| ImportError::MissingColumn {
            column: "startTimeLocal".to_string(),
        })?;

        let mut stats = ImportStats::default();
        let mut activities = Vec::new();

        for (line, result) in reader.records().enumerate() {
            let record = result.map_err(ImportError::from)?;
            stats.rows += 1;

            let raw_time = record.get(start_idx).unwrap_or("");
            let Some(start_time) = parse_start_time(raw_time) else {
                debug!(line = line + 2, value = raw_time, "Skipping row with invalid start time");
                stats.skipped += 1;
                continue;
            };

            let type_key = discipline_columns.resolve(&record);
            if type_key == TypeKey::Unknown {
                stats.unknown_type += 1;
            }

            activities.push(Activity {
                start_time,
                type_key,
                distance_m: columns.measure(&record, "distance"),
                duration_s: columns.measure(&record, "duration"),
                avg_heart_rate: columns.measure(&record, "heart_rate"),
                avg_speed_ms: columns.measure(&record, "speed"),
                calories: columns.measure(&record, "calories"),
            });
        }

        stats.report("CSV");
        Ok(ActivitySet::new(activities))
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Header position lookup by standard column name
struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn build<'h, F>(headers: &'h StringRecord, normalize: F) -> Self
    where
        F: Fn(&'h str) -> Option<&'h str>,
    {
        let mut positions = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(standard) = normalize(header) {
                // First matching column wins
                positions.entry(standard.to_string()).or_insert(i);
            }
        }
        ColumnIndex { positions }
    }

    fn get(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    fn measure(&self, record: &StringRecord, name: &str) -> Option<f64> {
        self.get(name)
            .and_then(|idx| record.get(idx))
            .and_then(parse_measure)
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<ActivitySet> {
        if !file_path.exists() {
            return Err(DashError::Import(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            }));
        }

        let file = std::fs::File::open(file_path)?;
        let set = self.import_reader(file)?;
        if set.is_empty() {
            warn!(file = %file_path.display(), "Activity file contains no usable rows");
        }
        info!(file = %file_path.display(), activities = set.len(), "Loaded activity cache");
        Ok(set)
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}
