use crate::error::{FlowError, Result};
use serde::Serialize;
use std::fmt;
use wk_utils::dates::day_of_year_from_month_day;

/// Last day of year in a leap year.
pub const MAX_DAY_OF_YEAR: u32 = 366;

/// An inclusive, non-wrapping day-of-year range within 1..=366.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DayInterval {
    start: u32,
    end: u32,
}

impl DayInterval {
    /// Build a single non-wrapping interval. Both bounds must be in
    /// 1..=366 and `start <= end`.
    pub fn new(start: u32, end: u32) -> Result<DayInterval> {
        if !(1..=MAX_DAY_OF_YEAR).contains(&start)
            || !(1..=MAX_DAY_OF_YEAR).contains(&end)
            || end < start
        {
            return Err(FlowError::MalformedInterval { start, end });
        }
        Ok(DayInterval { start, end })
    }

    /// Normalize a possibly wrapping day-of-year pair.
    ///
    /// When `end < start` the range crosses the new year and is split into
    /// `(1, end)` and `(start, 366)`.
    pub fn from_days(start: u32, end: u32) -> Result<Vec<DayInterval>> {
        if !(1..=MAX_DAY_OF_YEAR).contains(&start) || !(1..=MAX_DAY_OF_YEAR).contains(&end) {
            return Err(FlowError::MalformedInterval { start, end });
        }
        if end < start {
            Ok(vec![
                DayInterval { start: 1, end },
                DayInterval {
                    start,
                    end: MAX_DAY_OF_YEAR,
                },
            ])
        } else {
            Ok(vec![DayInterval { start, end }])
        }
    }

    /// Normalize a "MM-DD" pair, e.g. `("07-15", "05-14")`.
    pub fn from_month_day(start: &str, end: &str) -> Result<Vec<DayInterval>> {
        let start_day = day_of_year_from_month_day(start)
            .ok_or_else(|| FlowError::InvalidMonthDay(start.to_string()))?;
        let end_day = day_of_year_from_month_day(end)
            .ok_or_else(|| FlowError::InvalidMonthDay(end.to_string()))?;
        DayInterval::from_days(start_day, end_day)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Inclusive on both ends.
    pub fn contains(&self, day: u32) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn overlaps(&self, other: &DayInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for DayInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::DayInterval;
    use crate::error::FlowError;

    #[test]
    fn test_non_wrapping_month_day() {
        let intervals = DayInterval::from_month_day("05-15", "07-14").unwrap();
        assert_eq!(intervals, vec![DayInterval::new(136, 196).unwrap()]);
    }

    #[test]
    fn test_wrapping_month_day_is_split() {
        let intervals = DayInterval::from_month_day("07-15", "05-14").unwrap();
        assert_eq!(
            intervals,
            vec![
                DayInterval::new(1, 135).unwrap(),
                DayInterval::new(197, 366).unwrap()
            ]
        );
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let interval = DayInterval::new(10, 20).unwrap();
        assert!(interval.contains(10));
        assert!(interval.contains(20));
        assert!(!interval.contains(9));
        assert!(!interval.contains(21));
    }

    #[test]
    fn test_malformed_days_rejected() {
        assert_eq!(
            DayInterval::from_days(1, 367),
            Err(FlowError::MalformedInterval { start: 1, end: 367 })
        );
        assert_eq!(
            DayInterval::from_days(400, 10),
            Err(FlowError::MalformedInterval { start: 400, end: 10 })
        );
        assert!(DayInterval::from_days(5, 0).is_err());
        assert!(DayInterval::new(20, 10).is_err());
    }

    #[test]
    fn test_invalid_month_day_rejected() {
        assert_eq!(
            DayInterval::from_month_day("02-30", "03-01"),
            Err(FlowError::InvalidMonthDay("02-30".to_string()))
        );
    }

    #[test]
    fn test_overlaps() {
        let a = DayInterval::new(1, 135).unwrap();
        let b = DayInterval::new(135, 200).unwrap();
        let c = DayInterval::new(136, 200).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
