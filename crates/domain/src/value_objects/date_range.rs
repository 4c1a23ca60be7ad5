//! DateRange - inclusive calendar window used by reports and event queries

use crate::errors::{DomainError, DomainResult};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if end < start {
            return Err(DomainError::InvalidDateRange(format!(
                "{} is after {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// The `days` days ending on `today`, inclusive.
    pub fn last_days(days: u32, today: NaiveDate) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: today - Duration::days(span),
            end: today,
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Number of (partial) weeks covered, at least one.
    pub fn weeks(&self) -> u32 {
        let days = self.days().max(1) as u32;
        days.div_ceil(7)
    }
}

pub fn parse_date(raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| DomainError::InvalidDate(raw.trim().to_string()))
}

impl FromStr for DateRange {
    type Err = DomainError;

    /// Accepts `YYYY-MM-DD..YYYY-MM-DD`, `YYYY-MM-DD to YYYY-MM-DD`, or a single day.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parts: Option<(&str, &str)> = s
            .split_once("..")
            .or_else(|| s.split_once(" to "));

        match parts {
            Some((start, end)) => DateRange::new(parse_date(start)?, parse_date(end)?),
            None => Ok(DateRange::single(parse_date(s)?)),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_parse_formats() {
        let a: DateRange = "2024-10-01..2024-10-07".parse().unwrap();
        let b: DateRange = "2024-10-01 to 2024-10-07".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.days(), 7);
        assert_eq!(a.weeks(), 1);

        let single: DateRange = "2024-10-05".parse().unwrap();
        assert_eq!(single.start, single.end);
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert!(matches!(
            "2024-10-07..2024-10-01".parse::<DateRange>(),
            Err(DomainError::InvalidDateRange(_))
        ));
        assert!(matches!(
            "last week".parse::<DateRange>(),
            Err(DomainError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_last_days_and_contains() {
        let range = DateRange::last_days(30, d("2024-10-31"));
        assert_eq!(range.start, d("2024-10-02"));
        assert!(range.contains(d("2024-10-02")));
        assert!(range.contains(d("2024-10-31")));
        assert!(!range.contains(d("2024-10-01")));
        assert_eq!(range.weeks(), 5);
    }

    #[test]
    fn test_display() {
        let range: DateRange = "2024-10-01..2024-10-07".parse().unwrap();
        assert_eq!(range.to_string(), "2024-10-01 to 2024-10-07");
    }
}
