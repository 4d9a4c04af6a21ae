//! Unified error hierarchy for vo2trend
//!
//! Input errors are raised at the boundary where user-supplied strings and
//! numbers become typed requests. The projection engine itself cannot fail.

use thiserror::Error;

/// Top-level error type for all vo2trend operations
#[derive(Debug, Error)]
pub enum Vo2TrendError {
    /// Rejected user input
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON/CSV/TOML serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Chart rendering errors
    #[error("Chart error: {0}")]
    Chart(String),
}

/// Errors raised while parsing a projection request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Gender is neither male nor female
    #[error("Invalid gender '{value}': expected one of m, male, f, female")]
    InvalidGender { value: String },

    /// Gender was not supplied and no default is configured
    #[error("Gender is required")]
    MissingGender,

    /// Unknown activity flag
    #[error("Invalid activity '{value}': expected one of run, hike, walk")]
    InvalidActivity { value: String },

    /// Numeric field that does not parse
    #[error("Invalid {field} '{value}': expected a number")]
    InvalidNumber { field: String, value: String },

    /// Unknown output format
    #[error("Unsupported format: {value}")]
    InvalidFormat { value: String },

    /// Starting age below the accepted floor
    #[error("Age {value} is out of range: must be at least {min}")]
    AgeOutOfRange { value: i32, min: i32 },

    /// NaN or infinite numeric input
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: String, value: f64 },
}

/// Result type alias for vo2trend operations
pub type Result<T> = std::result::Result<T, Vo2TrendError>;

impl From<serde_json::Error> for Vo2TrendError {
    fn from(err: serde_json::Error) -> Self {
        Vo2TrendError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for Vo2TrendError {
    fn from(err: csv::Error) -> Self {
        Vo2TrendError::Serialization(err.to_string())
    }
}

impl Vo2TrendError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Vo2TrendError::InvalidInput(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// HTTP status code used when the error crosses the server boundary
    pub fn status_code(&self) -> u16 {
        match self {
            Vo2TrendError::InvalidInput(_) => 400,
            _ => 500,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Vo2TrendError::InvalidInput(InputError::MissingGender) => {
                "Please select a gender (male or female) to compute percentiles.".to_string()
            }
            Vo2TrendError::InvalidInput(err) => err.to_string(),
            Vo2TrendError::Chart(reason) => format!("Could not draw the chart: {}", reason),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = Vo2TrendError::InvalidInput(InputError::InvalidGender {
            value: "x".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = Vo2TrendError::Configuration("bad port".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_status_codes() {
        let err: Vo2TrendError = InputError::MissingGender.into();
        assert_eq!(err.status_code(), 400);

        let err = Vo2TrendError::Chart("backend".to_string());
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_user_messages() {
        let err: Vo2TrendError = InputError::MissingGender.into();
        assert!(err.user_message().contains("select a gender"));

        let err: Vo2TrendError = InputError::InvalidActivity {
            value: "swim".to_string(),
        }
        .into();
        assert!(err.user_message().contains("swim"));
    }
}
