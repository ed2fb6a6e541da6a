/// Error types for the core time-series library.
use thiserror::Error;

/// Main error type for core time-series operations.
#[derive(Error, Debug)]
pub enum HtsError {
    /// A calendar field is out of range (strict mode)
    #[error("Invalid {field} value {value} for {context}")]
    InvalidCalendarField {
        field: &'static str,
        value: i64,
        context: String,
    },

    /// A date/time string could not be parsed
    #[error("Failed to parse date/time: {0}")]
    DateParse(String),

    /// An interval string could not be parsed
    #[error("Failed to parse interval: {0}")]
    IntervalParse(String),

    /// A series identifier string could not be parsed
    #[error("Failed to parse series identifier: {0}")]
    IdentParse(String),

    /// Time series period is not set or is inverted
    #[error("Invalid period for allocation: {0}")]
    InvalidPeriod(String),

    /// Data space cannot be allocated for this interval
    #[error("Unsupported interval for data allocation: {0}")]
    UnsupportedInterval(String),

    /// Invalid data format encountered while decoding a file
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Requested series not found in the input
    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    /// Failed to parse CSV-delimited content
    #[error("Failed to parse delimited content: {0}")]
    CsvParse(String),
}

/// Type alias for Results using HtsError
pub type Result<T> = std::result::Result<T, HtsError>;
