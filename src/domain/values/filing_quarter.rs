use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar quarter a filing reports on, rendered as `2024Q3`.
///
/// Ordering is chronological, so the latest quarter is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FilingQuarter {
    pub year: i32,
    pub quarter: u8,
}

impl FilingQuarter {
    pub fn new(year: i32, quarter: u8) -> Result<Self, String> {
        if !(1..=4).contains(&quarter) {
            return Err(format!("Quarter must be 1-4, got {quarter}"));
        }
        Ok(Self { year, quarter })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: ((date.month() - 1) / 3 + 1) as u8,
        }
    }

    /// Quarter containing today's UTC date.
    pub fn current() -> Self {
        Self::from_date(chrono::Utc::now().date_naive())
    }
}

impl fmt::Display for FilingQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for FilingQuarter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let (year, quarter) = upper
            .split_once('Q')
            .ok_or_else(|| format!("Invalid filing quarter: {s}"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid filing quarter year: {s}"))?;
        let quarter: u8 = quarter
            .parse()
            .map_err(|_| format!("Invalid filing quarter number: {s}"))?;
        FilingQuarter::new(year, quarter)
    }
}
