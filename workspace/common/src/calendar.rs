//! Calendar month lookup codes.
//!
//! The persisted schema references months by a stable small-integer code
//! (1..=12, never reused). This enum is the closed in-process form of that
//! lookup table.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One of the twelve calendar months, persisted as its 1-based code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Month {
    January = 1,
    February = 2,
    March = 3,
    April = 4,
    May = 5,
    June = 6,
    July = 7,
    August = 8,
    September = 9,
    October = 10,
    November = 11,
    December = 12,
}

impl Month {
    /// The persisted integer code.
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        // month() is always 1..=12, so the conversion cannot fail
        Month::try_from(date.month() as i32).unwrap()
    }
}

impl TryFrom<i32> for Month {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Month::January),
            2 => Ok(Month::February),
            3 => Ok(Month::March),
            4 => Ok(Month::April),
            5 => Ok(Month::May),
            6 => Ok(Month::June),
            7 => Ok(Month::July),
            8 => Ok(Month::August),
            9 => Ok(Month::September),
            10 => Ok(Month::October),
            11 => Ok(Month::November),
            12 => Ok(Month::December),
            other => Err(format!("month code out of range 1-12: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in 1..=12 {
            let month = Month::try_from(code).unwrap();
            assert_eq!(month.code(), code);
        }
        assert!(Month::try_from(0).is_err());
        assert!(Month::try_from(13).is_err());
    }

    #[test]
    fn test_from_date() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        assert_eq!(Month::from_date(date), Month::February);
        assert_eq!(Month::from_date(date).name(), "February");
    }
}
