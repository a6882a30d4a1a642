//! Instream flow targets and flow deficit analysis.
//!
//! A flow target describes the minimum flow a stream should carry on each
//! day of the year. This crate looks targets up by day of year, expands
//! them into daily series over arbitrary date ranges, compares them with
//! observed flow, and summarizes the resulting deficits.
//!
//! # Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use wk_flow::target::{FlowTarget, GradedFlowTarget};
//!
//! let target = GradedFlowTarget::from_month_days(vec![
//!     (("05-15", "07-14"), 800.0),
//!     (("07-15", "05-14"), 400.0),
//! ])
//! .unwrap();
//! assert_eq!(target.target_flow(136, f64::NAN), 800.0);
//!
//! let target = FlowTarget::Graded(target);
//! let begin = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2016, 12, 31).unwrap();
//! let daily = target.as_daily_timeseries(begin, end, None, None).unwrap();
//! assert_eq!(daily.len(), 366);
//! ```

pub mod analysis;
pub mod error;
pub mod gap;
pub mod interval;
pub mod materialize;
pub mod series;
pub mod stats;
pub mod target;

pub use error::{FlowError, Result};
