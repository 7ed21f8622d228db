use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

use super::discipline::{RawTypeField, FLATTENED_COLUMN, NESTED_COLUMN};
use super::{parse_measure, parse_start_time, ImportFormat, ImportStats};
use crate::error::{ImportError, Result};
use crate::models::{Activity, ActivitySet, TypeKey};

/// Reader for the raw activity list as returned by the fitness service
/// (a JSON array of activity objects with the same field names as the CSV
/// cache).
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        JsonImporter
    }

    /// Import activities from JSON text
    pub fn import_str(&self, text: &str) -> Result<ActivitySet> {
        let value: Value = serde_json::from_str(text).map_err(|e| ImportError::ParseError {
            format: "JSON".to_string(),
            reason: e.to_string(),
        })?;

        let rows = match value {
            Value::Array(rows) => rows,
            _ => {
                return Err(ImportError::ParseError {
                    format: "JSON".to_string(),
                    reason: "expected an array of activities".to_string(),
                }
                .into())
            }
        };

        let objects: Vec<&Map<String, Value>> = rows.iter().filter_map(Value::as_object).collect();

        let has_type_field = objects
            .iter()
            .any(|o| o.contains_key(FLATTENED_COLUMN) || o.contains_key(NESTED_COLUMN));
        if !objects.is_empty() && !has_type_field {
            return Err(ImportError::MissingDisciplineColumn {
                expected: format!("{}, {}", FLATTENED_COLUMN, NESTED_COLUMN),
            }
            .into());
        }

        let mut stats = ImportStats::default();
        let mut activities = Vec::new();

        for (idx, object) in objects.into_iter().enumerate() {
            stats.rows += 1;

            let raw_time = object
                .get("startTimeLocal")
                .and_then(Value::as_str)
                .unwrap_or("");
            let Some(start_time) = parse_start_time(raw_time) else {
                debug!(index = idx, value = raw_time, "Skipping activity with invalid start time");
                stats.skipped += 1;
                continue;
            };

            let type_key = Self::classify(object).resolve();
            if type_key == TypeKey::Unknown {
                stats.unknown_type += 1;
            }

            activities.push(Activity {
                start_time,
                type_key,
                distance_m: Self::measure(object, "distance"),
                duration_s: Self::measure(object, "duration"),
                avg_heart_rate: Self::measure(object, "averageHR"),
                avg_speed_ms: Self::measure(object, "averageSpeed"),
                calories: Self::measure(object, "calories"),
            });
        }

        stats.report("JSON");
        Ok(ActivitySet::new(activities))
    }

    fn classify(object: &Map<String, Value>) -> RawTypeField<'_> {
        let flattened = object
            .get(FLATTENED_COLUMN)
            .and_then(Value::as_str)
            .map(RawTypeField::flattened)
            .unwrap_or(RawTypeField::Absent);

        match flattened {
            RawTypeField::Absent => object
                .get(NESTED_COLUMN)
                .map(RawTypeField::from_json)
                .unwrap_or(RawTypeField::Absent),
            field => field,
        }
    }

    fn measure(object: &Map<String, Value>, key: &str) -> Option<f64> {
        match object.get(key)? {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite() && *v >= 0.0),
            Value::String(s) => parse_measure(s),
            _ => None,
        }
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<ActivitySet> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let text = std::fs::read_to_string(file_path)?;
        let set = self.import_str(&text)?;
        info!(file = %file_path.display(), activities = set.len(), "Loaded activity list");
        Ok(set)
    }

    fn get_format_name(&self) -> &'static str {
        "JSON"
    }
}
