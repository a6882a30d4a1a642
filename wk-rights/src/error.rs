/// Error types for demand estimation
use thiserror::Error;

/// Main error type for water right demand operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RightsError {
    /// Seasonal use profile that is not a set of monthly fractions
    #[error("Invalid use profile {name}: {reason}")]
    InvalidProfile { name: String, reason: String },

    /// Two demand records for the same application id
    #[error("Duplicate application id: {0}")]
    DuplicateKey(String),
}

/// Type alias for Results using RightsError
pub type Result<T> = std::result::Result<T, RightsError>;
