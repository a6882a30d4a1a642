//! Deficit and volume statistics over daily gap series.
//!
//! A gap series holds flow minus target per day; negative values are
//! deficit days. Volumes are sums of daily values times a unit multiplier
//! (e.g. [`crate::gap::CFS_DAY_TO_AF`] to get acre-feet from cfs).
//! Annual figures are grouped by water year (Oct 1 - Sep 30, named for the
//! ending year); monthly figures by calendar year and month.

use crate::series::DailySeries;
use crate::stats::OlsRegression;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use wk_utils::dates::water_year_for_date;

/// Values keyed by year, then calendar month (1-12).
pub type YearMonthTable = BTreeMap<i32, BTreeMap<u32, f64>>;

/// Values keyed by year.
pub type YearTable = BTreeMap<i32, f64>;

/// Sum daily values by calendar year and month, times `dt`.
pub fn integrate_monthly(series: &DailySeries, dt: f64) -> YearMonthTable {
    let mut table = YearMonthTable::new();
    for (date, value) in series.iter().filter(|(_, v)| !v.is_nan()) {
        *table
            .entry(date.year())
            .or_default()
            .entry(date.month())
            .or_insert(0.0) += value;
    }
    for months in table.values_mut() {
        for total in months.values_mut() {
            *total *= dt;
        }
    }
    table
}

/// Sum daily values by water year, times `dt`.
pub fn integrate_annually(series: &DailySeries, dt: f64) -> YearTable {
    let mut table = YearTable::new();
    for (date, value) in series.iter().filter(|(_, v)| !v.is_nan()) {
        *table.entry(water_year_for_date(&date)).or_insert(0.0) += value;
    }
    for total in table.values_mut() {
        *total *= dt;
    }
    table
}

fn deficit_days(gap: &DailySeries) -> DailySeries {
    gap.filter(|_, value| value < 0.0)
}

fn target_on_deficit_days(gap: &DailySeries, target: &DailySeries) -> DailySeries {
    gap.iter()
        .filter(|(_, value)| *value < 0.0)
        .filter_map(|(date, _)| target.get(&date).map(|t| (date, t)))
        .collect()
}

/// Volume deficit by year and month, over deficit days only.
pub fn monthly_volume_deficit(gap: &DailySeries, unit_multiplier: f64) -> YearMonthTable {
    integrate_monthly(&deficit_days(gap).map(|v| v * unit_multiplier), 1.0)
}

/// Target volume by year and month, over deficit days only.
pub fn monthly_volume_target(
    gap: &DailySeries,
    target: &DailySeries,
    unit_multiplier: f64,
) -> YearMonthTable {
    integrate_monthly(
        &target_on_deficit_days(gap, target).map(|v| v * unit_multiplier),
        1.0,
    )
}

/// Volume deficit by water year, over deficit days only.
pub fn annual_volume_deficit(gap: &DailySeries, unit_multiplier: f64) -> YearTable {
    integrate_annually(&deficit_days(gap).map(|v| v * unit_multiplier), 1.0)
}

/// Target volume by water year, over deficit days only.
pub fn annual_volume_target(
    gap: &DailySeries,
    target: &DailySeries,
    unit_multiplier: f64,
) -> YearTable {
    integrate_annually(
        &target_on_deficit_days(gap, target).map(|v| v * unit_multiplier),
        1.0,
    )
}

/// Monthly volume deficit as a fraction of the target volume on the same
/// deficit days. Months with a zero target volume are omitted.
pub fn monthly_volume_deficit_pct(
    gap: &DailySeries,
    target: &DailySeries,
    unit_multiplier: f64,
) -> YearMonthTable {
    let deficit = monthly_volume_deficit(gap, unit_multiplier);
    let volume = monthly_volume_target(gap, target, unit_multiplier);
    let mut result = YearMonthTable::new();
    for (year, months) in &deficit {
        for (month, value) in months {
            let target_volume = volume.get(year).and_then(|m| m.get(month)).copied();
            if let Some(t) = target_volume.filter(|t| *t != 0.0) {
                result.entry(*year).or_default().insert(*month, value.abs() / t);
            }
        }
    }
    result
}

/// Annual volume deficit as a fraction of the target volume on the same
/// deficit days. Years with a zero target volume are omitted.
pub fn annual_volume_deficit_pct(
    gap: &DailySeries,
    target: &DailySeries,
    unit_multiplier: f64,
) -> YearTable {
    let volume = annual_volume_target(gap, target, unit_multiplier);
    annual_volume_deficit(gap, unit_multiplier)
        .into_iter()
        .filter_map(|(year, value)| {
            volume
                .get(&year)
                .filter(|t| **t != 0.0)
                .map(|t| (year, value.abs() / t))
        })
        .collect()
}

fn deficit_fraction<K: Ord + Copy, F: Fn(&NaiveDate) -> K>(
    series: &DailySeries,
    key: F,
) -> BTreeMap<K, f64> {
    let mut counts: BTreeMap<K, (usize, usize)> = BTreeMap::new();
    for (date, value) in series.iter().filter(|(_, v)| !v.is_nan()) {
        let entry = counts.entry(key(&date)).or_insert((0, 0));
        if value < 0.0 {
            entry.0 += 1;
        }
        entry.1 += 1;
    }
    counts
        .into_iter()
        .map(|(k, (deficit, total))| (k, deficit as f64 / total as f64))
        .collect()
}

/// Fraction of days in deficit per calendar month (1-12), pooled over all
/// years.
pub fn monthly_deficit_pct(gap: &DailySeries) -> BTreeMap<u32, f64> {
    deficit_fraction(gap, |date| date.month())
}

/// Fraction of days in deficit per water year.
pub fn annual_deficit_pct(gap: &DailySeries) -> YearTable {
    deficit_fraction(gap, water_year_for_date)
}

/// Annual minimum of the trailing `period`-day rolling mean.
///
/// Windows are positional over the observations of each year, so a year
/// with fewer than `period` observations has no entry.
pub fn annual_minimum(series: &DailySeries, period: usize, by_water_year: bool) -> YearTable {
    if period == 0 {
        return YearTable::new();
    }
    let mut groups: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for (date, value) in series.iter() {
        let year = if by_water_year {
            water_year_for_date(&date)
        } else {
            date.year()
        };
        groups.entry(year).or_default().push(value);
    }
    groups
        .into_iter()
        .filter_map(|(year, values)| {
            values
                .windows(period)
                .map(|w| w.iter().sum::<f64>() / period as f64)
                .filter(|mean| !mean.is_nan())
                .min_by(|a, b| a.total_cmp(b))
                .map(|min| (year, min))
        })
        .collect()
}

/// Trend of the annual low flow as a fraction of its average: the OLS
/// slope of [`annual_minimum`] against year, divided by the mean annual
/// minimum. `None` with fewer than two years of data.
pub fn low_flow_trend_pct(series: &DailySeries, period: usize, by_water_year: bool) -> Option<f64> {
    let lowflow = annual_minimum(series, period, by_water_year);
    let points: Vec<(f64, f64)> = lowflow
        .iter()
        .map(|(year, value)| (f64::from(*year), *value))
        .collect();
    let model = OlsRegression::fit(&points)?;
    let mean = points.iter().map(|(_, y)| y).sum::<f64>() / points.len() as f64;
    Some(model.slope / mean)
}

/// Regression line through [`annual_minimum`], evaluated at each year that
/// has a minimum. Empty with fewer than two years of data.
pub fn annual_minimum_trend(series: &DailySeries, period: usize, by_water_year: bool) -> YearTable {
    let lowflow = annual_minimum(series, period, by_water_year);
    let points: Vec<(f64, f64)> = lowflow
        .iter()
        .map(|(year, value)| (f64::from(*year), *value))
        .collect();
    match OlsRegression::fit(&points) {
        Some(model) => lowflow
            .keys()
            .map(|year| (*year, model.predict(f64::from(*year))))
            .collect(),
        None => YearTable::new(),
    }
}
