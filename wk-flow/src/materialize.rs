use crate::error::{FlowError, Result};
use crate::series::DailySeries;
use crate::target::FlowTarget;
use chrono::{Datelike, Days, NaiveDate};
use wk_utils::date_range::DateRange;

/// Days per year of term, matching how permit terms are counted.
pub const DAYS_PER_TERM_YEAR: u64 = 365;

/// Settings for expanding a [`FlowTarget`] into a gap-free daily series.
///
/// Each day is computed independently:
/// - before `effective_date` the value is zero;
/// - after the term cutoff (`effective_date` or `begin`, plus
///   `term * 365` days) the value is zero;
/// - otherwise the target's value for that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Materialization {
    begin: NaiveDate,
    end: NaiveDate,
    effective_date: Option<NaiveDate>,
    term: Option<u32>,
}

impl Materialization {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Self {
        Self {
            begin,
            end,
            effective_date: None,
            term: None,
        }
    }

    pub fn effective_date(mut self, effective_date: Option<NaiveDate>) -> Self {
        self.effective_date = effective_date;
        self
    }

    /// Term in years.
    pub fn term(mut self, term: Option<u32>) -> Self {
        self.term = term;
        self
    }

    /// Last day on which the target still applies, if a term is set.
    pub fn cutoff(&self) -> Option<NaiveDate> {
        let term = self.term?;
        let anchor = self.effective_date.unwrap_or(self.begin);
        anchor.checked_add_days(Days::new(u64::from(term) * DAYS_PER_TERM_YEAR))
    }

    fn validate(&self) -> Result<()> {
        let out_of_range = match (self.effective_date, self.term) {
            (Some(effective), None) => effective < self.begin || effective > self.end,
            _ => false,
        };
        if self.end < self.begin || out_of_range {
            return Err(FlowError::InvalidDateRange {
                begin: self.begin,
                end: self.end,
                effective: self.effective_date,
            });
        }
        Ok(())
    }

    /// Expand the target over `[begin, end]`, one value per day.
    ///
    /// Series targets contribute their recorded value for each date (`NaN`
    /// where the series has no observation); graded targets fall back to
    /// zero on days no interval covers.
    pub fn materialize(&self, target: &FlowTarget) -> Result<DailySeries> {
        self.validate()?;
        let cutoff = self.cutoff();
        let series = DateRange(self.begin, self.end)
            .map(|date| {
                let before_effective = self.effective_date.is_some_and(|e| date < e);
                let after_cutoff = cutoff.is_some_and(|c| date > c);
                let value = if before_effective || after_cutoff {
                    0.0
                } else {
                    match target {
                        FlowTarget::Series(series) => series.series.get(&date).unwrap_or(f64::NAN),
                        other => other.target_flow(date.ordinal(), 0.0),
                    }
                };
                (date, value)
            })
            .collect();
        Ok(series)
    }
}
