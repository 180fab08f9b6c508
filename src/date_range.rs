//! Resolution of a period selector into a concrete half-open date interval

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MergerError, Result};

/// Fixed pattern for custom period bounds (and for Gmail query bounds)
pub const DATE_PATTERN: &str = "%Y/%m/%d";

/// Which slice of the mailbox a run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// The full calendar month preceding the current one
    LastMonth,
    /// From the first of the current month up to now
    CurrentMonth,
    /// From January 1 of the current year up to now
    Year,
    /// Explicit from/to bounds in YYYY/MM/DD form
    Custom,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Period::LastMonth => "last month",
            Period::CurrentMonth => "current month",
            Period::Year => "year to date",
            Period::Custom => "custom range",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for Period {
    type Err = MergerError;

    fn from_str(s: &str) -> Result<Self> {
        // Config files use snake_case, the CLI uses kebab-case; accept both.
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "last_month" => Ok(Period::LastMonth),
            "current_month" => Ok(Period::CurrentMonth),
            "year" => Ok(Period::Year),
            "custom" => Ok(Period::Custom),
            other => Err(MergerError::ConfigError(format!(
                "Unknown period '{}'. Must be last_month, current_month, year or custom",
                other
            ))),
        }
    }
}

/// Half-open date interval: messages dated in [start, end) are in scope.
///
/// Created once per run, immutable thereafter. Invariant: `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Resolve a period selector into a concrete interval.
///
/// For `Period::Custom` the explicit bounds win when both are present,
/// otherwise the configured defaults are used; either way both bounds must
/// parse under the fixed `YYYY/MM/DD` pattern and must be ordered. Parse or
/// ordering failure is fatal for the run. A selector that resolves to an
/// empty interval (a run at the exact first instant of the current month or
/// year) is rejected the same way: there is no day the query could match.
pub fn resolve(
    period: Period,
    explicit_from: Option<&str>,
    explicit_to: Option<&str>,
    config_from: &str,
    config_to: &str,
    now: DateTime<Utc>,
) -> Result<DateInterval> {
    let interval = match period {
        Period::LastMonth => {
            let this_month = first_of_month(now.date_naive().year(), now.date_naive().month());
            let (prev_year, prev_month) = match now.date_naive().month() {
                1 => (now.date_naive().year() - 1, 12),
                m => (now.date_naive().year(), m - 1),
            };
            DateInterval {
                start: first_of_month(prev_year, prev_month),
                end: this_month,
            }
        }
        Period::CurrentMonth => DateInterval {
            start: first_of_month(now.date_naive().year(), now.date_naive().month()),
            end: now,
        },
        Period::Year => DateInterval {
            start: first_of_month(now.date_naive().year(), 1),
            end: now,
        },
        Period::Custom => {
            let (from, to) = match (explicit_from, explicit_to) {
                (Some(from), Some(to)) => (from, to),
                _ => (config_from, config_to),
            };
            let start = parse_bound(from)?;
            let end = parse_bound(to)?;
            if start >= end {
                return Err(MergerError::InvalidDateFormat(format!(
                    "'{}' is not before '{}'",
                    from, to
                )));
            }
            DateInterval { start, end }
        }
    };

    if interval.start >= interval.end {
        return Err(MergerError::InvalidDateFormat(format!(
            "{} resolves to an empty range at {}",
            period,
            now.format("%Y/%m/%d %H:%M:%S")
        )));
    }
    Ok(interval)
}

fn first_of_month(year: i32, month: u32) -> DateTime<Utc> {
    // Day 1 of any year/month is always representable.
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn parse_bound(value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, DATE_PATTERN)
        .map_err(|_| MergerError::InvalidDateFormat(value.to_string()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| MergerError::InvalidDateFormat(value.to_string()))?;
    Ok(Utc.from_utc_datetime(&midnight))
}
