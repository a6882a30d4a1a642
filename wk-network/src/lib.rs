//! Stream network connectivity and drainage area.
//!
//! Builds the local connectivity matrix of a flow network from its edge
//! list, closes it transitively to get global connectivity, and sums
//! catchment areas over each catchment's upstream set.
//!
//! # Usage
//!
//! ```rust
//! use wk_network::closure::{ClosureStrategy, TransitiveClosure};
//! use wk_network::connectivity::ConnectivityMatrix;
//! use wk_network::drainage::{Catchment, DrainageAreaAggregator, MissingAreaPolicy};
//!
//! let local = ConnectivityMatrix::from_edges(vec![("A", "B"), ("B", "C"), ("A", "C")]);
//! let global = TransitiveClosure::compute(&local, ClosureStrategy::Auto);
//! let areas = vec![
//!     Catchment::new("A", 1.0),
//!     Catchment::new("B", 2.0),
//!     Catchment::new("C", 3.0),
//! ];
//! let aggregator = DrainageAreaAggregator::new(&global, areas, MissingAreaPolicy::Lenient).unwrap();
//! assert_eq!(aggregator.drainage_area(&"C").unwrap(), 6.0);
//! ```

pub mod closure;
pub mod connectivity;
pub mod drainage;
pub mod error;
pub mod matrix;

pub use error::{NetworkError, Result};
