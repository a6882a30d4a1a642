//! Flow targets: the minimum (instream) flow that should be present in a
//! stream on a given day of the year.
//!
//! Three kinds of target share one lookup contract:
//! - [`GradedFlowTarget`]: values over day-of-year intervals, e.g. 800 cfs
//!   from May 15 through July 14 and 400 cfs the rest of the year.
//! - [`FlatFlowTarget`]: one value all year.
//! - [`SeriesFlowTarget`]: a recorded or simulated daily series. Looking it
//!   up by day of year yields the mean over all recorded years, while
//!   materializing it over a date range yields the actual per-date values.

use crate::error::Result;
use crate::interval::DayInterval;
use crate::materialize::Materialization;
use crate::series::DailySeries;
use chrono::NaiveDate;
use log::warn;
use serde::Serialize;
use std::fmt;

/// Interval-graded target. Intervals are kept sorted by start day; lookup
/// returns the value of the first interval containing the day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradedFlowTarget {
    targets: Vec<(DayInterval, f64)>,
}

impl GradedFlowTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a target from `(("MM-DD", "MM-DD"), value)` pairs.
    pub fn from_month_days<'a, I>(targets: I) -> Result<Self>
    where
        I: IntoIterator<Item = ((&'a str, &'a str), f64)>,
    {
        let mut graded = GradedFlowTarget::new();
        for (interval, value) in targets {
            graded.add(interval, value)?;
        }
        Ok(graded)
    }

    /// Add a target rate by month-day, e.g. `("07-15", "05-14")`.
    pub fn add(&mut self, interval: (&str, &str), value: f64) -> Result<()> {
        let intervals = DayInterval::from_month_day(interval.0, interval.1)?;
        self.push_all(intervals, value);
        Ok(())
    }

    /// Add a target rate by day of year. Wrapping pairs are split.
    pub fn add_by_day_of_year(&mut self, interval: (u32, u32), value: f64) -> Result<()> {
        let intervals = DayInterval::from_days(interval.0, interval.1)?;
        self.push_all(intervals, value);
        Ok(())
    }

    fn push_all(&mut self, intervals: Vec<DayInterval>, value: f64) {
        for interval in intervals {
            if let Some((existing, existing_value)) = self
                .targets
                .iter()
                .find(|(existing, _)| existing.overlaps(&interval))
            {
                warn!(
                    "Flow target interval {} ({}) overlaps {} ({}); the earlier-starting interval wins",
                    interval, value, existing, existing_value
                );
            }
            self.targets.push((interval, value));
        }
        // stable: equal starts keep insertion order
        self.targets.sort_by_key(|(interval, _)| interval.start());
    }

    /// Return the target flow on a given day of the year, or `default` when
    /// no interval covers it.
    pub fn target_flow(&self, day: u32, default: f64) -> f64 {
        self.targets
            .iter()
            .find(|(interval, _)| interval.contains(day))
            .map(|(_, value)| *value)
            .unwrap_or(default)
    }

    pub fn intervals(&self) -> &[(DayInterval, f64)] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Pairs of intervals that share at least one day.
    pub fn overlapping_intervals(&self) -> Vec<(DayInterval, DayInterval)> {
        let mut overlaps = Vec::new();
        for (i, (a, _)) in self.targets.iter().enumerate() {
            for (b, _) in &self.targets[i + 1..] {
                if a.overlaps(b) {
                    overlaps.push((*a, *b));
                }
            }
        }
        overlaps
    }
}

impl fmt::Display for GradedFlowTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .targets
            .iter()
            .map(|(interval, value)| format!("({}, {})", interval, value))
            .collect();
        write!(f, "GradedFlowTarget([{}])", parts.join(", "))
    }
}

/// Single value flow target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlatFlowTarget {
    pub value: f64,
}

impl FlatFlowTarget {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

/// Flow target given by a daily series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesFlowTarget {
    pub series: DailySeries,
}

impl SeriesFlowTarget {
    pub fn new(series: DailySeries) -> Self {
        Self { series }
    }
}

/// Any flow target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FlowTarget {
    Graded(GradedFlowTarget),
    Flat(FlatFlowTarget),
    Series(SeriesFlowTarget),
}

impl FlowTarget {
    /// Target flow on a day of year.
    ///
    /// For a series target this is the mean over every recorded year, not
    /// the value of any single year; `default` is returned when the series
    /// has no observation on that day.
    pub fn target_flow(&self, day: u32, default: f64) -> f64 {
        match self {
            FlowTarget::Graded(graded) => graded.target_flow(day, default),
            FlowTarget::Flat(flat) => flat.value,
            FlowTarget::Series(series) => series
                .series
                .mean_for_day_of_year(day)
                .unwrap_or(default),
        }
    }

    /// Daily series of this target over `[begin, end]`.
    ///
    /// Days before `effective_date` are zero. With a `term` (years), days
    /// after `effective_date` (or `begin`) plus `term * 365` days are zero.
    pub fn as_daily_timeseries(
        &self,
        begin: NaiveDate,
        end: NaiveDate,
        effective_date: Option<NaiveDate>,
        term: Option<u32>,
    ) -> Result<DailySeries> {
        Materialization::new(begin, end)
            .effective_date(effective_date)
            .term(term)
            .materialize(self)
    }

    /// Daily series spanning the earliest through the latest of `dates`.
    /// An empty index yields an empty series.
    pub fn as_daily_timeseries_aligned<I>(
        &self,
        dates: I,
        effective_date: Option<NaiveDate>,
    ) -> Result<DailySeries>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let (min, max) = dates.into_iter().fold((None, None), |(min, max), date| {
            (
                Some(min.map_or(date, |m: NaiveDate| m.min(date))),
                Some(max.map_or(date, |m: NaiveDate| m.max(date))),
            )
        });
        match (min, max) {
            (Some(begin), Some(end)) => self.as_daily_timeseries(begin, end, effective_date, None),
            _ => Ok(DailySeries::new()),
        }
    }
}

impl From<GradedFlowTarget> for FlowTarget {
    fn from(value: GradedFlowTarget) -> Self {
        FlowTarget::Graded(value)
    }
}

impl From<FlatFlowTarget> for FlowTarget {
    fn from(value: FlatFlowTarget) -> Self {
        FlowTarget::Flat(value)
    }
}

impl From<SeriesFlowTarget> for FlowTarget {
    fn from(value: SeriesFlowTarget) -> Self {
        FlowTarget::Series(value)
    }
}
