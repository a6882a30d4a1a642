use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Date-indexed daily values, always held in chronological order.
///
/// Missing observations are represented by absent dates; materialized
/// targets use `NaN` where a backing series had no observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailySeries(BTreeMap<NaiveDate, f64>);

impl DailySeries {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert or replace the value for a date.
    pub fn insert(&mut self, date: NaiveDate, value: f64) -> Option<f64> {
        self.0.insert(date, value)
    }

    pub fn get(&self, date: &NaiveDate) -> Option<f64> {
        self.0.get(date).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.0.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.0.keys().next_back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.0.iter().map(|(date, value)| (*date, *value))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.values().copied()
    }

    /// Observations in `[begin, end]`.
    pub fn slice(&self, begin: NaiveDate, end: NaiveDate) -> DailySeries {
        if end < begin {
            return DailySeries::new();
        }
        self.0
            .range(begin..=end)
            .map(|(date, value)| (*date, *value))
            .collect()
    }

    /// Mean of the non-NaN observations falling on a day of year.
    pub fn mean_for_day_of_year(&self, day: u32) -> Option<f64> {
        let (sum, count) = self
            .iter()
            .filter(|(date, value)| date.ordinal() == day && !value.is_nan())
            .fold((0.0, 0usize), |(sum, count), (_, value)| (sum + value, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Apply a function to every value, keeping the dates.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> DailySeries {
        self.iter().map(|(date, value)| (date, f(value))).collect()
    }

    /// Keep only the observations matching a predicate.
    pub fn filter<F: Fn(NaiveDate, f64) -> bool>(&self, f: F) -> DailySeries {
        self.iter().filter(|(date, value)| f(*date, *value)).collect()
    }
}

impl FromIterator<(NaiveDate, f64)> for DailySeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        DailySeries(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::DailySeries;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_series_is_ordered_regardless_of_insertion() {
        let mut series = DailySeries::new();
        series.insert(ymd(2015, 1, 3), 3.0);
        series.insert(ymd(2015, 1, 1), 1.0);
        series.insert(ymd(2015, 1, 2), 2.0);
        let values: Vec<f64> = series.values().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(series.first_date(), Some(ymd(2015, 1, 1)));
        assert_eq!(series.last_date(), Some(ymd(2015, 1, 3)));
    }

    #[test]
    fn test_slice_is_inclusive() {
        let series: DailySeries = (1..=5).map(|d| (ymd(2015, 1, d), d as f64)).collect();
        let slice = series.slice(ymd(2015, 1, 2), ymd(2015, 1, 4));
        assert_eq!(slice.values().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert!(series.slice(ymd(2015, 1, 4), ymd(2015, 1, 2)).is_empty());
    }

    #[test]
    fn test_mean_for_day_of_year_spans_years() {
        let series: DailySeries = vec![
            (ymd(2014, 1, 2), 10.0),
            (ymd(2015, 1, 2), 20.0),
            (ymd(2016, 1, 2), f64::NAN),
            (ymd(2016, 1, 3), 99.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(series.mean_for_day_of_year(2), Some(15.0));
        assert_eq!(series.mean_for_day_of_year(100), None);
    }
}
