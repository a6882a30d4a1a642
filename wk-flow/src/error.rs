/// Error types for flow target construction and evaluation
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for flow target operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// Day-of-year bounds outside 1..=366
    #[error("Malformed interval ({start}, {end}): days must lie in 1..=366")]
    MalformedInterval { start: u32, end: u32 },

    /// A "MM-DD" string that is not a calendar day
    #[error("Invalid month-day: {0:?} (expected MM-DD)")]
    InvalidMonthDay(String),

    /// Materialization bounds that cannot produce a sensible series
    #[error("Invalid date range: begin {begin}, end {end}, effective date {effective:?}")]
    InvalidDateRange {
        begin: NaiveDate,
        end: NaiveDate,
        effective: Option<NaiveDate>,
    },

    /// Column-backed target referencing a column the table lacks
    #[error("Missing column: {0}")]
    MissingColumn(String),
}

/// Type alias for Results using FlowError
pub type Result<T> = std::result::Result<T, FlowError>;
