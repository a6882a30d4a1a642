//! Flow gap attributes: the difference between observed flow and a target.

use crate::error::{FlowError, Result};
use crate::series::DailySeries;
use crate::target::FlowTarget;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use wk_utils::dates::day_of_year_from_month_day;

/// Acre-feet delivered by one cubic foot per second over one day.
pub const CFS_DAY_TO_AF: f64 = 1.9835;

/// Name of the deficit marker column.
pub const DEFICIT_COLUMN: &str = "deficit";

/// Where a row's target value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSource {
    /// Looked up by the row's day of year.
    ByDay(FlowTarget),
    /// Read from another column of the same row.
    Column(String),
    Constant(f64),
}

impl TargetSource {
    /// Target value for a single row. Day-based lookups that match no
    /// interval yield `NaN`.
    pub fn resolve(&self, row: &FlowRow<'_>) -> Result<f64> {
        match self {
            TargetSource::ByDay(target) => Ok(target.target_flow(row.date().ordinal(), f64::NAN)),
            TargetSource::Column(name) => row
                .get(name)
                .ok_or_else(|| FlowError::MissingColumn(name.clone())),
            TargetSource::Constant(value) => Ok(*value),
        }
    }
}

/// A date-indexed table of daily values with named columns.
///
/// Transformations return a new table; the receiver is never modified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowTable {
    index: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<f64>>,
}

/// Borrowed view of one row of a [`FlowTable`].
#[derive(Debug, Clone, Copy)]
pub struct FlowRow<'a> {
    table: &'a FlowTable,
    position: usize,
}

impl<'a> FlowRow<'a> {
    pub fn date(&self) -> NaiveDate {
        self.table.index[self.position]
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.table
            .columns
            .get(column)
            .map(|values| values[self.position])
    }
}

impl FlowTable {
    /// Build a single-column table from a series.
    pub fn from_series(column: &str, series: &DailySeries) -> FlowTable {
        let index: Vec<NaiveDate> = series.dates().collect();
        let mut columns = BTreeMap::new();
        columns.insert(column.to_string(), series.values().collect());
        FlowTable { index, columns }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// A column as a date-indexed series.
    pub fn series(&self, name: &str) -> Option<DailySeries> {
        let values = self.columns.get(name)?;
        Some(self.index.iter().copied().zip(values.iter().copied()).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = FlowRow<'_>> {
        (0..self.index.len()).map(move |position| FlowRow {
            table: self,
            position,
        })
    }

    /// Copy of this table with a column added or replaced. Values are
    /// aligned by date; dates absent from `series` become `NaN`.
    pub fn with_column(&self, name: &str, series: &DailySeries) -> FlowTable {
        let mut result = self.clone();
        let values = self
            .index
            .iter()
            .map(|date| series.get(date).unwrap_or(f64::NAN))
            .collect();
        result.columns.insert(name.to_string(), values);
        result
    }

    /// Add target and gap attributes for `parameter`.
    ///
    /// The parameter column is first scaled by `multiplier`, then:
    /// - `<parameter>-target`: target scaled by `multiplier`
    /// - `<parameter>-gap`: parameter minus target
    /// - `<parameter>-gap-af`: gap converted from cfs-days to acre-feet
    /// - `deficit`: 1.0 on days the gap is negative, else 0.0
    ///
    /// Day-based targets are materialized over the table's date span, so
    /// a series target contributes its actual per-date values.
    pub fn with_gap_attributes(
        &self,
        parameter: &str,
        source: &TargetSource,
        multiplier: f64,
    ) -> Result<FlowTable> {
        let observed: Vec<f64> = self
            .column(parameter)
            .ok_or_else(|| FlowError::MissingColumn(parameter.to_string()))?
            .iter()
            .map(|v| v * multiplier)
            .collect();

        let raw_target: Vec<f64> = match source {
            TargetSource::ByDay(target) => {
                let series = target.as_daily_timeseries_aligned(self.index.iter().copied(), None)?;
                self.index
                    .iter()
                    .map(|date| series.get(date).unwrap_or(f64::NAN))
                    .collect()
            }
            other => self
                .rows()
                .map(|row| other.resolve(&row))
                .collect::<Result<Vec<f64>>>()?,
        };

        let target: Vec<f64> = raw_target.iter().map(|t| t * multiplier).collect();
        let gap: Vec<f64> = observed.iter().zip(&target).map(|(o, t)| o - t).collect();
        let gap_af: Vec<f64> = gap.iter().map(|g| g * CFS_DAY_TO_AF).collect();
        let deficit: Vec<f64> = gap.iter().map(|g| if *g < 0.0 { 1.0 } else { 0.0 }).collect();

        let mut result = self.clone();
        result.columns.insert(parameter.to_string(), observed);
        result.columns.insert(format!("{parameter}-target"), target);
        result.columns.insert(format!("{parameter}-gap"), gap);
        result.columns.insert(format!("{parameter}-gap-af"), gap_af);
        result.columns.insert(DEFICIT_COLUMN.to_string(), deficit);
        Ok(result)
    }

    /// Rows whose day of year lies strictly inside a `("MM-DD", "MM-DD")`
    /// season. A season whose end comes before its start runs across the
    /// new year, e.g. `("10-01", "05-15")`.
    pub fn filter_season(&self, season: (&str, &str)) -> Result<FlowTable> {
        let begin = day_of_year_from_month_day(season.0)
            .ok_or_else(|| FlowError::InvalidMonthDay(season.0.to_string()))?;
        let end = day_of_year_from_month_day(season.1)
            .ok_or_else(|| FlowError::InvalidMonthDay(season.1.to_string()))?;
        let in_season = |day: u32| {
            if begin <= end {
                begin < day && day < end
            } else {
                begin < day || day < end
            }
        };
        let keep: Vec<usize> = self
            .index
            .iter()
            .enumerate()
            .filter(|(_, date)| in_season(date.ordinal()))
            .map(|(i, _)| i)
            .collect();
        let index = keep.iter().map(|&i| self.index[i]).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), keep.iter().map(|&i| values[i]).collect()))
            .collect();
        Ok(FlowTable { index, columns })
    }
}
