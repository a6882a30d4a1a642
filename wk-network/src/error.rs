/// Error types for network construction and drainage area lookups
use thiserror::Error;

/// Main error type for stream network operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Catchment id absent from the closure matrix
    #[error("Unknown catchment identifier: {0}")]
    UnknownIdentifier(String),

    /// Area table and closure matrix share no catchment ids
    #[error("Area table ({areas} catchments) shares no ids with the closure matrix ({nodes} nodes)")]
    DimensionMismatch { nodes: usize, areas: usize },

    /// Catchment without an area, raised only under the strict policy
    #[error("No area recorded for catchment {0}")]
    MissingArea(String),
}

/// Type alias for Results using NetworkError
pub type Result<T> = std::result::Result<T, NetworkError>;
