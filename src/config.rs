use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::forecast::DEFAULT_FORECAST_PERIODS;
use crate::logging::LogConfig;
use crate::zones::ZoneTable;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Input files
    pub data: DataSettings,

    /// Trend and window settings
    pub analysis: AnalysisSettings,

    /// Heart-rate zone table
    pub zones: ZoneTable,

    pub logging: LogConfig,
}

/// Input file locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Activity cache written by the fetch step
    pub activities_file: PathBuf,

    /// Race book; the built-in book is used when unset
    pub races_file: Option<PathBuf>,
}

/// Analysis tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Weeks extrapolated by the volume forecast
    pub forecast_weeks: u32,

    /// Days extrapolated past the last efficiency observation
    pub efficiency_horizon_days: u32,

    /// Length of the trailing monthly volume window
    pub trailing_months: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataSettings::default(),
            analysis: AnalysisSettings::default(),
            zones: ZoneTable::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            activities_file: PathBuf::from("garmin_activities.csv"),
            races_file: None,
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            forecast_weeks: DEFAULT_FORECAST_PERIODS,
            efficiency_horizon_days: 0,
            trailing_months: 12,
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = self.to_toml()?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tridash")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "Ignoring unreadable config file");
                Self::default()
            }
        }
    }

    /// Reject settings no report can be built from
    pub fn validate(&self) -> Result<()> {
        if self.analysis.trailing_months == 0 {
            return Err(anyhow!("analysis.trailing_months must be at least 1"));
        }
        self.zones
            .validate()
            .map_err(|e| anyhow!("Invalid zone table: {}", e))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).with_context(|| "Failed to serialize configuration to TOML")
    }

    /// Look up a dotted key such as `data.activities_file`
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = toml::Value::try_from(self)
            .with_context(|| "Failed to serialize configuration")?;

        let mut current = &value;
        for part in key.split('.') {
            match current.get(part) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }

        let text = match current {
            toml::Value::String(s) => s.clone(),
            toml::Value::Table(_) | toml::Value::Array(_) => {
                toml::to_string_pretty(current).with_context(|| format!("Failed to render {}", key))?
            }
            other => other.to_string(),
        };
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            "[analysis]\nforecast_weeks = 8\n\n[data]\nactivities_file = \"runs.csv\"\n",
        )
        .unwrap();
        assert_eq!(config.analysis.forecast_weeks, 8);
        assert_eq!(config.analysis.trailing_months, 12);
        assert_eq!(config.data.activities_file, PathBuf::from("runs.csv"));
        assert_eq!(config.zones.zones.len(), 5);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.data.races_file = Some(PathBuf::from("races.toml"));
        config.save_to_file(&config_path).unwrap();

        let loaded = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.data.races_file, Some(PathBuf::from("races.toml")));
    }

    #[test]
    fn test_get_dotted_key() {
        let config = AppConfig::default();
        assert_eq!(
            config.get("data.activities_file").unwrap(),
            Some("garmin_activities.csv".to_string())
        );
        assert_eq!(config.get("analysis.forecast_weeks").unwrap(), Some("4".to_string()));
        assert_eq!(config.get("analysis.missing").unwrap(), None);
        assert!(config.get("logging").unwrap().unwrap().contains("level"));
    }

    #[test]
    fn test_invalid_zone_table_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.zones.zones[1].max_bpm = Some(100);
        config.save_to_file(&path).unwrap();

        assert!(AppConfig::load_from_file(&path).is_err());
    }
}
