use chrono::{Days, NaiveDate};
use std::mem::replace;

/// A date range iterator that yields each date from the start date
/// through the end date (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    /// Number of days the range will yield.
    pub fn len_days(&self) -> usize {
        let days = (self.1 - self.0).num_days();
        if days < 0 {
            0
        } else {
            days as usize + 1
        }
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            // NaiveDate::MAX has no successor; park past the end instead.
            let next = match self.0.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => {
                    let current = self.0;
                    self.1 = NaiveDate::MIN;
                    return Some(current);
                }
            };
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len_days();
        (remaining, Some(remaining))
    }
}
