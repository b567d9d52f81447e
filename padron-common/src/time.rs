//! Timestamp utilities and reporting windows
//!
//! All timestamps are local wall-clock time without offset, stored as
//! `YYYY-MM-DD HH:MM:SS` text so SQLite `DATE()`/`strftime()` and plain text
//! comparison both work on them.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use std::fmt;

/// Storage format for timestamps
pub const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time, truncated to whole seconds
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Format a timestamp for storage or for binding in comparisons
pub fn to_db(dt: NaiveDateTime) -> String {
    dt.format(DB_TIMESTAMP_FORMAT).to_string()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::seconds(86_399)
}

/// Monday 00:00 of the calendar week containing `now`
pub fn start_of_week(now: NaiveDateTime) -> NaiveDateTime {
    let date = now.date();
    let offset = i64::from(date.weekday().num_days_from_monday());
    start_of_day(date - Duration::days(offset))
}

/// Sunday 23:59:59 of the week starting at `week_start`
pub fn end_of_week(week_start: NaiveDateTime) -> NaiveDateTime {
    end_of_day(week_start.date() + Duration::days(6))
}

/// Start of the 30-day window: the 29 days before today plus today
pub fn last_30_days_start(now: NaiveDateTime) -> NaiveDateTime {
    start_of_day(now.date() - Duration::days(29))
}

/// Start of the capture-quota window.
///
/// The window opens at 00:01, not midnight. Before 00:01 the window still
/// belongs to the previous day and opens at yesterday 00:01.
pub fn quota_window_start(now: NaiveDateTime) -> NaiveDateTime {
    let today_start = start_of_day(now.date()) + Duration::minutes(1);
    if now < today_start {
        today_start - Duration::days(1)
    } else {
        today_start
    }
}

/// Whole years elapsed between `birth` and `today`, never negative
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i64 {
    let mut age = i64::from(today.year() - birth.year());
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age.max(0)
}

/// Calendar month, formatted as the `YYYY-MM` periodo token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse a `YYYY-MM` token; anything else yields `None`
    pub fn parse(value: &str) -> Option<Self> {
        let (year, month) = value.trim().split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// Shift by `n` months (negative moves backwards)
    pub fn add(self, n: i32) -> Self {
        let index = self.year * 12 + self.month as i32 - 1 + n;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
