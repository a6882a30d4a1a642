//! Shared date utility functions for the waterkit crates.

pub mod date_range;

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate};

    /// Leap year used to turn a month-day pair into a day of year, so that
    /// every calendar day (including Feb 29) has a slot in 1..=366.
    pub const LEAP_REFERENCE_YEAR: i32 = 2000;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Parse a date in either "YYYY-MM-DD" or "MM/DD/YYYY" form, the two
    /// layouts that show up in exported water right spreadsheets.
    pub fn parse_date_lenient(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
            .ok()
    }

    /// Day of year (1..=366) for a date.
    pub fn day_of_year(date: &NaiveDate) -> u32 {
        date.ordinal()
    }

    /// Day of year for a "MM-DD" string, evaluated in a leap year.
    ///
    /// "05-15" -> 136, "07-15" -> 197, "12-31" -> 366.
    pub fn day_of_year_from_month_day(month_day: &str) -> Option<u32> {
        let (month, day) = month_day.trim().split_once('-')?;
        let month = month.parse::<u32>().ok()?;
        let day = day.parse::<u32>().ok()?;
        NaiveDate::from_ymd_opt(LEAP_REFERENCE_YEAR, month, day).map(|d| d.ordinal())
    }

    /// Get the water year for a given date.
    ///
    /// A water year runs Oct 1 to Sep 30 and is named for the calendar
    /// year in which it ends: Oct 1 2015 -> 2016, Sep 30 2016 -> 2016.
    pub fn water_year_for_date(date: &NaiveDate) -> i32 {
        if date.month() >= 10 {
            date.year() + 1
        } else {
            date.year()
        }
    }

}
