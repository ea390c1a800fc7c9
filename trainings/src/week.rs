//! ISO week identifiers (`YYYY-Www`)
//!
//! The chart shows one ISO week at a time. Weeks start on Monday and the
//! first week of a year is the one containing its first Thursday, so some
//! years have 53 weeks and some early-January dates belong to the previous
//! year's last week.

use chrono::{Datelike, Days, NaiveDate, TimeDelta, Weekday};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of days in a week
pub const DAYS_PER_WEEK: usize = 7;

/// Errors from parsing or building an [`IsoWeek`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekError {
    /// Input is not of the form `YYYY-Www`
    #[error("expected a week like 2021-W05, got {0:?}")]
    Malformed(String),

    /// The year has no such week
    #[error("{year} has no week {week}")]
    OutOfRange {
        /// Requested ISO year
        year: i32,
        /// Requested week number
        week: u32,
    },
}

/// One ISO 8601 week, identified by its Monday
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IsoWeek {
    monday: NaiveDate,
}

impl IsoWeek {
    /// Build a week from an ISO year and week number
    ///
    /// # Errors
    ///
    /// Returns [`WeekError::OutOfRange`] when `week` is 0, above 53, or 53 in
    /// a year with only 52 weeks.
    pub fn new(year: i32, week: u32) -> Result<Self, WeekError> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|monday| Self { monday })
            .ok_or(WeekError::OutOfRange { year, week })
    }

    /// The week a calendar date falls in
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        let offset = u64::from(date.weekday().num_days_from_monday());
        let monday = date.checked_sub_days(Days::new(offset)).unwrap_or(date);
        Self { monday }
    }

    /// ISO year, which differs from the calendar year around New Year
    #[must_use]
    pub fn year(self) -> i32 {
        self.monday.iso_week().year()
    }

    /// Week number within the ISO year, 1 to 53
    #[must_use]
    pub fn week(self) -> u32 {
        self.monday.iso_week().week()
    }

    /// Monday of the week
    #[must_use]
    pub const fn first_day(self) -> NaiveDate {
        self.monday
    }

    /// Sunday of the week
    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        self.days()[DAYS_PER_WEEK - 1]
    }

    /// The seven dates of the week, Monday first
    #[must_use]
    pub fn days(self) -> [NaiveDate; DAYS_PER_WEEK] {
        let mut days = [self.monday; DAYS_PER_WEEK];
        for (date, next) in days.iter_mut().zip(self.monday.iter_days()) {
            *date = next;
        }
        days
    }

    /// Whether `date` falls within this week
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        self.first_day() <= date && date <= self.last_day()
    }

    /// The week `weeks` weeks later (earlier when negative)
    ///
    /// Returns `None` past the range chrono can represent.
    #[must_use]
    pub fn shifted(self, weeks: i64) -> Option<Self> {
        let delta = TimeDelta::try_weeks(weeks)?;
        self.monday
            .checked_add_signed(delta)
            .map(|monday| Self { monday })
    }
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year(), self.week())
    }
}

impl FromStr for IsoWeek {
    type Err = WeekError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || WeekError::Malformed(s.to_string());

        let (year, week) = s.split_once("-W").ok_or_else(malformed)?;
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || week.len() != 2 || !all_digits(year) || !all_digits(week) {
            return Err(malformed());
        }

        let year = year.parse().map_err(|_| malformed())?;
        let week = week.parse().map_err(|_| malformed())?;
        Self::new(year, week)
    }
}
