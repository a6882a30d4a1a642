//! Water right demand estimates.
//!
//! Joins agricultural use, structure use and right records into one demand
//! table keyed by application id, then spreads each annual estimate over
//! the calendar months with seasonal use profiles.
//!
//! # Usage
//!
//! ```rust
//! use wk_rights::demand::{DemandRecord, DemandTable};
//! use wk_rights::profile::UseProfiles;
//!
//! let table = DemandTable::new(vec![DemandRecord {
//!     vineyard_water: Some(120.0),
//!     ..DemandRecord::new("S012345")
//! }])
//! .unwrap();
//! let monthly = table.disaggregate_monthly(&UseProfiles::default());
//! let july = monthly.records()[0].monthly.unwrap()[6];
//! assert!((july - 20.0).abs() < 1e-9);
//! ```

pub mod demand;
pub mod error;
pub mod merge;
pub mod owner;
pub mod profile;

pub use error::{Result, RightsError};
