//! Calendar month model.
//!
//! Monthly summaries are keyed by a [`YearMonth`]. It serialises as its
//! "YYYY-MM" label.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month, e.g. January 2024.
///
/// Internally this is the first day of the month, so every value is a
/// valid month.
///
/// # Example
///
/// ```
/// use attendance_engine::models::YearMonth;
/// use chrono::NaiveDate;
///
/// let month = YearMonth::new(2024, 2).unwrap();
/// assert_eq!(month.to_string(), "2024-02");
/// assert_eq!(month.display_name(), "February 2024");
/// assert_eq!(month.days_in_month(), 29);
/// assert!(month.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    /// Creates a month from a year and a 1-based month number.
    ///
    /// Returns `None` if the month number is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Returns the month containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// The 1-based month number.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The first day of the month.
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// The last day of the month.
    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .and_then(|next| next.first_day().pred_opt())
            .unwrap_or(self.0)
    }

    /// The following month, if representable.
    pub fn next(&self) -> Option<Self> {
        let (year, month) = if self.month() == 12 {
            (self.year() + 1, 1)
        } else {
            (self.year(), self.month() + 1)
        };
        Self::new(year, month)
    }

    /// Number of days in the month.
    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    /// Returns true if the date falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// Every date of the month in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.0.iter_days().take_while(move |d| *d <= last)
    }

    /// Human-readable name, e.g. "January 2024".
    pub fn display_name(&self) -> String {
        self.0.format("%B %Y").to_string()
    }

    /// Every month touched by the inclusive date range, oldest first.
    ///
    /// An inverted range yields no months.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::models::YearMonth;
    /// use chrono::NaiveDate;
    ///
    /// let months = YearMonth::months_touched(
    ///     NaiveDate::from_ymd_opt(2024, 1, 30).unwrap(),
    ///     NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
    /// );
    /// assert_eq!(months.len(), 2);
    /// ```
    pub fn months_touched(from: NaiveDate, to: NaiveDate) -> Vec<YearMonth> {
        let mut months = Vec::new();
        let mut current = Some(Self::from_date(from));
        while let Some(month) = current {
            if month.first_day() > to {
                break;
            }
            months.push(month);
            current = month.next();
        }
        months
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in '{}'", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in '{}'", s))?;
        Self::new(year, month).ok_or_else(|| format!("month out of range in '{}'", s))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}
