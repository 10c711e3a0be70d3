//! Calendar handling for monthly and annual emission series.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FireError, FireResult};

/// Inclusive calendar-year range.
///
/// Construction enforces `start <= end`; the range is never reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(i32, i32)", into = "(i32, i32)")]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> FireResult<Self> {
        if start > end {
            return Err(FireError::invalid_range(
                start,
                end,
                "start year is after end year",
            ));
        }
        Ok(Self { start, end })
    }

    /// Range covering one year.
    pub fn single(year: i32) -> Self {
        Self {
            start: year,
            end: year,
        }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of years in the range.
    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    /// A valid range always holds at least one year.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// Years in ascending order.
    pub fn years(&self) -> impl Iterator<Item = i32> + Clone {
        self.start..=self.end
    }

    /// Every (year, month) pair in ascending order.
    pub fn months(&self) -> impl Iterator<Item = (i32, u32)> + Clone {
        self.years().flat_map(|y| (1..=12u32).map(move |m| (y, m)))
    }

    /// Overlap with another range, if any.
    pub fn intersect(&self, other: &YearRange) -> Option<YearRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(YearRange { start, end })
    }
}

impl TryFrom<(i32, i32)> for YearRange {
    type Error = FireError;

    fn try_from((start, end): (i32, i32)) -> Result<Self, Self::Error> {
        YearRange::new(start, end)
    }
}

impl From<YearRange> for (i32, i32) {
    fn from(range: YearRange) -> Self {
        (range.start, range.end)
    }
}

impl FromStr for YearRange {
    type Err = FireError;

    /// Parse "2010-2012" or a single year "2015".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_year = |part: &str| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| FireError::InvalidParameter {
                    param: "years".to_string(),
                    message: format!("'{}' is not a year", part),
                })
        };
        match s.split_once('-') {
            Some((a, b)) => YearRange::new(parse_year(a)?, parse_year(b)?),
            None => Ok(YearRange::single(parse_year(s)?)),
        }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Time step of a series or output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeResolution {
    Annual,
    Monthly,
    Daily,
}

impl TimeResolution {
    /// Format a timestamp as `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    pub fn format(&self, time: &DateTime<Utc>) -> String {
        match self {
            TimeResolution::Annual => time.format("%Y").to_string(),
            TimeResolution::Monthly => time.format("%Y-%m").to_string(),
            TimeResolution::Daily => time.format("%Y-%m-%d").to_string(),
        }
    }

    /// Word used in export file names.
    pub fn label(&self) -> &'static str {
        match self {
            TimeResolution::Annual => "Annual",
            TimeResolution::Monthly => "Monthly",
            TimeResolution::Daily => "Daily",
        }
    }
}

impl fmt::Display for TimeResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Midnight UTC on the given calendar date.
pub fn date_start(year: i32, month: u32, day: u32) -> FireResult<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .ok_or_else(|| FireError::InvalidParameter {
            param: "date".to_string(),
            message: format!("{:04}-{:02}-{:02} is not a calendar date", year, month, day),
        })
}

/// First instant of a calendar month.
pub fn month_start(year: i32, month: u32) -> FireResult<DateTime<Utc>> {
    date_start(year, month, 1)
}

/// First instant of a calendar year.
pub fn year_start(year: i32) -> FireResult<DateTime<Utc>> {
    date_start(year, 1, 1)
}

/// Number of days in a calendar month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

/// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS` or a bare date.
pub fn parse_timestamp(s: &str) -> FireResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date_start(date.year(), date.month(), date.day());
    }

    Err(FireError::InvalidParameter {
        param: "time".to_string(),
        message: format!("unrecognised timestamp '{}'", s),
    })
}

/// Representative land-cover year for a range: the rounded midpoint,
/// clamped to the last year the land-cover product covers.
pub fn representative_map_year(range: &YearRange, last_available: i32) -> i32 {
    let midpoint = (range.start() as f64 + range.end() as f64) / 2.0;
    (midpoint.round() as i32).min(last_available)
}
