use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::ParsePeriodError;

/// Months on which a release season starts (winter, spring, summer, autumn)
pub const SEASON_MONTHS: [u32; 4] = [1, 4, 7, 10];

/// Year used when the configuration does not name a start year
pub const DEFAULT_START_YEAR: i32 = 2019;

/// One quarter-year release window, keyed as `"{year}-{month}"`
///
/// Ordering is chronological: by year, then by season month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleasePeriod {
    pub year: i32,
    pub month: u32,
}

impl ReleasePeriod {
    /// Create a period, normalizing a month outside [`SEASON_MONTHS`] to 1
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month: normalize_season_month(month),
        }
    }
}

impl fmt::Display for ReleasePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

impl FromStr for ReleasePeriod {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParsePeriodError(s.to_string());

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        if !SEASON_MONTHS.contains(&month) {
            return Err(invalid());
        }

        Ok(Self { year, month })
    }
}

fn normalize_season_month(month: u32) -> u32 {
    if SEASON_MONTHS.contains(&month) {
        month
    } else {
        1
    }
}

/// The period containing `today`: the latest season month not after the current month
pub fn current_period(today: NaiveDate) -> ReleasePeriod {
    let month = (1..=today.month())
        .rev()
        .find(|m| SEASON_MONTHS.contains(m))
        .unwrap_or(1);

    ReleasePeriod {
        year: today.year(),
        month,
    }
}

/// All periods from the configured start up to and including the one containing `today`
///
/// Periods of the start year before `start_month` are skipped, as are periods of the
/// current year that have not begun yet. An invalid `start_month` counts as 1.
pub fn enumerate_periods(start_year: i32, start_month: u32, today: NaiveDate) -> Vec<ReleasePeriod> {
    let start_month = normalize_season_month(start_month);
    let current_year = today.year();
    let current_month = today.month();

    let mut periods = Vec::new();

    for year in start_year..=current_year {
        for month in SEASON_MONTHS {
            if year == start_year && month < start_month {
                continue;
            }
            if year == current_year && month > current_month {
                continue;
            }
            periods.push(ReleasePeriod { year, month });
        }
    }

    periods
}
