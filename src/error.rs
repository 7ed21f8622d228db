//! Unified error hierarchy for tridash
//!
//! Only configuration problems are fatal. Everything else a report section
//! can hit (missing fields, empty ranges, too few samples) is turned into an
//! informational state by the caller, so these types mostly travel as values.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all tridash operations
#[derive(Debug, Error)]
pub enum DashError {
    /// The input schema or configuration cannot be used at all
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Activity file import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] crate::export::ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading the activity cache
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// None of the discipline-carrying columns exist
    #[error("No activity type column found (expected one of: {expected})")]
    MissingDisciplineColumn { expected: String },

    /// No importer handles this file type
    #[error("Unsupported activity file: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// A mandatory column is absent
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    /// Activity file content could not be parsed
    #[error("Parse error in {format} activity file: {reason}")]
    ParseError { format: String, reason: String },

    /// Underlying CSV reader failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Race book could not be parsed
    #[error("Invalid race book {path}: {reason}")]
    RaceBook { path: PathBuf, reason: String },
}

/// Calculation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalculationError {
    /// Not enough samples to attempt the calculation
    #[error("Insufficient data for {calculation}: need {required}, got {actual}")]
    InsufficientData {
        calculation: String,
        required: usize,
        actual: usize,
    },

    /// The filtered input contains nothing to work on
    #[error("No data for {calculation}")]
    NoData { calculation: String },

    /// Zero variance or zero denominator
    #[error("Degenerate input for {calculation}: {reason}")]
    Degenerate { calculation: String, reason: String },
}

impl CalculationError {
    pub fn insufficient(calculation: &str, required: usize, actual: usize) -> Self {
        CalculationError::InsufficientData {
            calculation: calculation.to_string(),
            required,
            actual,
        }
    }

    pub fn no_data(calculation: &str) -> Self {
        CalculationError::NoData {
            calculation: calculation.to_string(),
        }
    }
}

/// Result type alias for tridash operations
pub type Result<T> = std::result::Result<T, DashError>;

impl DashError {
    /// Whether the whole render must stop
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DashError::Configuration(_)
                | DashError::Import(ImportError::MissingDisciplineColumn { .. })
                | DashError::Import(ImportError::FileNotFound { .. })
        )
    }

    /// Process exit status: 2 for fatal setup errors, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            2
        } else {
            1
        }
    }

    /// Emit the error through tracing at its severity level
    pub fn log(&self, context: &str) {
        let level = self.severity().to_tracing_level();
        if level == tracing::Level::ERROR {
            tracing::error!(
                context,
                error = %self,
                fatal = self.is_fatal(),
                "{}",
                self.user_message()
            );
        } else if level == tracing::Level::WARN {
            tracing::warn!(context, error = %self, "{}", self.user_message());
        } else {
            tracing::info!(context, error = %self, "{}", self.user_message());
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DashError::Calculation(_) => ErrorSeverity::Info,
            DashError::Import(ImportError::RaceBook { .. }) => ErrorSeverity::Warning,
            DashError::Configuration(_) => ErrorSeverity::Critical,
            DashError::Import(ImportError::MissingDisciplineColumn { .. }) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            DashError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find activity file: {}", path.display())
            }
            DashError::Import(ImportError::MissingDisciplineColumn { .. }) => {
                "No suitable activity type column found in the activity file.".to_string()
            }
            DashError::Calculation(CalculationError::InsufficientData { calculation, .. }) => {
                format!("Not enough data to calculate {}.", calculation)
            }
            DashError::Calculation(CalculationError::NoData { calculation }) => {
                format!("No data available for {}.", calculation)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The render cannot continue
    Critical,
    /// Error that prevents an operation but the program can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message shown inline in a report section
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
