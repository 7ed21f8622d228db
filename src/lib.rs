// Library interface for tridash modules
// The binary and the integration tests both build on these

pub mod aggregation;
pub mod analysis;
pub mod calendar;
pub mod config;
pub mod error;
pub mod export;
pub mod forecast;
pub mod import;
pub mod logging;
pub mod models;
pub mod races;
pub mod report;
pub mod stats;
pub mod units;
pub mod zones;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use error::{CalculationError, DashError, ImportError, Result};
pub use import::ImportManager;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use races::RaceBook;
pub use report::{DashboardReport, ReportOptions, Section};
pub use zones::ZoneTable;
