use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month, the unit that attendance pivots, salary calculations
/// and payouts are keyed on. Serialized as "YYYY-MM".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Month is validated at construction, so the first day always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap()
    }

    pub fn last_day(&self) -> NaiveDate {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .unwrap()
            .pred_opt()
            .unwrap()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year_str, month_str) = s.trim().split_once('-').ok_or(ParseMonthError::InvalidFormat)?;
        if year_str.len() != 4 || month_str.len() != 2 {
            return Err(ParseMonthError::InvalidFormat);
        }
        let year: i32 = year_str.parse().map_err(|_| ParseMonthError::InvalidFormat)?;
        let month: u32 = month_str.parse().map_err(|_| ParseMonthError::InvalidFormat)?;
        Month::new(year, month).ok_or(ParseMonthError::OutOfRange)
    }
}

impl TryFrom<String> for Month {
    type Error = ParseMonthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseMonthError {
    InvalidFormat,
    OutOfRange,
}

impl fmt::Display for ParseMonthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMonthError::InvalidFormat => write!(f, "month must be in YYYY-MM format"),
            ParseMonthError::OutOfRange => write!(f, "month must be between 01 and 12"),
        }
    }
}

impl std::error::Error for ParseMonthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let month: Month = "2026-02".parse().unwrap();
        assert_eq!(month.year(), 2026);
        assert_eq!(month.month(), 2);
        assert_eq!(month.to_string(), "2026-02");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("2026".parse::<Month>(), Err(ParseMonthError::InvalidFormat));
        assert_eq!("2026-2".parse::<Month>(), Err(ParseMonthError::InvalidFormat));
        assert_eq!("26-02".parse::<Month>(), Err(ParseMonthError::InvalidFormat));
        assert_eq!("2026-13".parse::<Month>(), Err(ParseMonthError::OutOfRange));
        assert_eq!("2026-00".parse::<Month>(), Err(ParseMonthError::OutOfRange));
    }

    #[test]
    fn test_day_bounds() {
        let feb = Month::new(2026, 2).unwrap();
        assert_eq!(feb.first_day(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());

        let leap_feb = Month::new(2028, 2).unwrap();
        assert_eq!(leap_feb.last_day(), NaiveDate::from_ymd_opt(2028, 2, 29).unwrap());

        let december = Month::new(2026, 12).unwrap();
        assert_eq!(december.last_day(), NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn test_from_date() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        assert_eq!(Month::from_date(date), Month::new(2026, 2).unwrap());
    }

    #[test]
    fn test_ordering() {
        let jan: Month = "2026-01".parse().unwrap();
        let feb: Month = "2026-02".parse().unwrap();
        let prev_dec: Month = "2025-12".parse().unwrap();
        assert!(jan < feb);
        assert!(prev_dec < jan);
    }
}
