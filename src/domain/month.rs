//! Calendar-month key (`YYYY-MM`) used to scope categories, expenses and reports.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{Result, TrackingError};

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// A year and month with no day, time, or timezone component.
///
/// Ordering is chronological and agrees with the lexicographic order of the
/// zero-padded `YYYY-MM` rendering. `previous`/`next` saturate at `0001-01`
/// and `9999-12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) || !(1..=12).contains(&month) {
            return Err(TrackingError::InvalidMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// Parses the strict `YYYY-MM` form: four-digit year, dash, two-digit month.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || TrackingError::InvalidMonth(value.to_string());
        let bytes = value.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        let (year, month) = (&value[..4], &value[5..]);
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }

    /// The month a calendar date falls in; dates outside years 1..=9999 are rejected.
    pub fn from_date(date: NaiveDate) -> Result<Self> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn value(&self) -> String {
        self.to_string()
    }

    pub fn before(&self, other: &Month) -> bool {
        self < other
    }

    pub fn after(&self, other: &Month) -> bool {
        self > other
    }

    pub fn previous(&self) -> Month {
        match (self.year, self.month) {
            (MIN_YEAR, 1) => *self,
            (year, 1) => Month {
                year: year - 1,
                month: 12,
            },
            (year, month) => Month {
                year,
                month: month - 1,
            },
        }
    }

    pub fn next(&self) -> Month {
        match (self.year, self.month) {
            (MAX_YEAR, 12) => *self,
            (year, 12) => Month {
                year: year + 1,
                month: 1,
            },
            (year, month) => Month {
                year,
                month: month + 1,
            },
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = TrackingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Month {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Month::parse(&raw).map_err(de::Error::custom)
    }
}
