//! Year-week period labels (`YYYY-WW`) and their pure derivations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{DashboardError, DashboardResult};

/// Integer form of a period (`YYYYWW`), used as the API query key.
pub type PeriodCode = u32;

/// Highest week number modeled. Week 53 is rejected.
pub const MAX_WEEK: u8 = 52;

/// Lowest year accepted, so that every period's prior is itself a
/// four-digit period.
pub const MIN_YEAR: u16 = 1001;

/// A year + week identifier selecting one comparison snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: u16,
    week: u8,
}

impl Period {
    /// Build a period, validating `week ∈ [1, 52]` and `year ∈ [1001, 9999]`.
    pub fn new(year: u16, week: u8) -> DashboardResult<Self> {
        if !(MIN_YEAR..=9999).contains(&year) {
            return Err(DashboardError::Validation(format!(
                "year {year} is outside {MIN_YEAR}..=9999"
            )));
        }
        if week == 0 || week > MAX_WEEK {
            return Err(DashboardError::Validation(format!(
                "week {week} is outside 1..={MAX_WEEK}"
            )));
        }
        Ok(Self { year, week })
    }

    /// Parse a `YYYY-WW` label.
    pub fn parse(label: &str) -> DashboardResult<Self> {
        let invalid = || DashboardError::Validation(format!("'{label}' is not a YYYY-WW label"));

        let (year, week) = label.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || week.len() != 2 {
            return Err(invalid());
        }
        if !year.bytes().chain(week.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: u16 = year.parse().map_err(|_| invalid())?;
        let week: u8 = week.parse().map_err(|_| invalid())?;
        Self::new(year, week)
    }

    /// Inverse of [`Period::code`].
    pub fn from_code(code: PeriodCode) -> DashboardResult<Self> {
        let year = u16::try_from(code / 100).map_err(|_| {
            DashboardError::Validation(format!("code {code} has no four-digit year"))
        })?;
        // code % 100 < 100, always fits
        Self::new(year, (code % 100) as u8)
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn week(&self) -> u8 {
        self.week
    }

    /// `YYYYWW` as an integer.
    pub fn code(&self) -> PeriodCode {
        u32::from(self.year) * 100 + u32::from(self.week)
    }

    /// The comparison period: previous week, or week 52 of the previous year.
    pub fn prior(&self) -> Period {
        if self.week == 1 {
            Period {
                year: self.year - 1,
                week: MAX_WEEK,
            }
        } else {
            Period {
                year: self.year,
                week: self.week - 1,
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.week)
    }
}

impl FromStr for Period {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::parse(s)
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Period::parse(&label).map_err(serde::de::Error::custom)
    }
}

/// Prior-period label for a well-formed label.
pub fn derive_prior(period: &Period) -> String {
    period.prior().to_string()
}

/// Numeric code for a label. Empty or malformed input is an encoding error,
/// which callers read as "no period selected yet".
pub fn derive_numeric_code(label: &str) -> DashboardResult<PeriodCode> {
    if label.is_empty() {
        return Err(DashboardError::Encoding("no period selected".to_string()));
    }
    Period::parse(label)
        .map(|p| p.code())
        .map_err(|e| DashboardError::Encoding(e.to_string()))
}
