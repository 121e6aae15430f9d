//! Calendar month used as the accounting period.

use core::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use taxibe_core::{DomainError, DomainResult};

/// A (year, month) pair. Orders chronologically; displays as `YYYY-MM`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Periode {
    year: i32,
    month: u32,
}

impl Periode {
    pub fn new(year: i32, month: u32) -> DomainResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(DomainError::field("month", "must be between 1 and 12"));
        }
        if !(2000..=2100).contains(&year) {
            return Err(DomainError::field("year", "must be between 2000 and 2100"));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
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

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }
}

impl core::fmt::Display for Periode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Periode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s
            .split_once('-')
            .ok_or_else(|| DomainError::invalid_id(format!("Periode: expected YYYY-MM, got {s}")))?;
        let year = y
            .parse()
            .map_err(|_| DomainError::invalid_id(format!("Periode: bad year in {s}")))?;
        let month = m
            .parse()
            .map_err(|_| DomainError::invalid_id(format!("Periode: bad month in {s}")))?;
        Self::new(year, month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_chronologically_across_years() {
        let dec = Periode::new(2023, 12).unwrap();
        let jan = Periode::new(2024, 1).unwrap();
        assert!(dec < jan);
        assert_eq!(jan.to_string(), "2024-01");
        assert_eq!("2023-12".parse::<Periode>().unwrap(), dec);
    }

    #[test]
    fn rejects_month_thirteen() {
        assert!(matches!(Periode::new(2024, 13), Err(DomainError::InvalidField { .. })));
        assert!("2024-00".parse::<Periode>().is_err());
    }
}
