//! Time windows used by summaries and reports
//!
//! - `SummaryPeriod`: a named lookback (week/month/year) anchored to today
//! - `DateWindow`: a closed `[start, end]` date interval
//! - `Month`: a calendar month (e.g. "2025-04")
//! - `FlowRange`: the ranges offered by the monthly cash-flow view

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed date interval; both ends are included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window, swapping the ends if they are reversed
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Window of `days` days before `end`, through `end`
    pub fn lookback(end: NaiveDate, days: i64) -> Self {
        Self::new(end - Duration::days(days), end)
    }

    /// Check if a date falls within this window (inclusive on both ends)
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days between start and end (0 for a single-day window)
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Named lookback window for the financial summary
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    Week,
    #[default]
    Month,
    Year,
}

impl SummaryPeriod {
    /// Fixed lookback in days: 7 / 30 / 365
    pub fn lookback_days(&self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }

    /// The window `[today - lookback, today]`
    pub fn window_ending(&self, today: NaiveDate) -> DateWindow {
        DateWindow::lookback(today, self.lookback_days())
    }

    /// Parse `week`, `month` or `year`
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(format!("Unknown period '{}'. Use week, month or year", other)),
        }
    }
}

impl fmt::Display for SummaryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Year => write!(f, "year"),
        }
    }
}

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    /// Month containing the given date
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current month in local time
    pub fn current() -> Self {
        Self::containing(chrono::Local::now().date_naive())
    }

    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month (inclusive)
    pub fn end_date(&self) -> NaiveDate {
        self.next().start_date() - Duration::days(1)
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date(), self.end_date())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Parse "YYYY-MM"
    pub fn parse(s: &str) -> Result<Self, String> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Invalid month '{}'. Use YYYY-MM", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid year in '{}'", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month in '{}'", s))?;
        if !(1..=12).contains(&month) {
            return Err(format!("Month must be 1-12, got {}", month));
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Ranges for the monthly cash-flow view
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum FlowRange {
    #[default]
    Last3Months,
    Last6Months,
    Last12Months,
    CurrentYear,
}

impl FlowRange {
    /// The date window this range covers, ending today
    pub fn window_ending(&self, today: NaiveDate) -> DateWindow {
        let months_back = match self {
            Self::Last3Months => 3,
            Self::Last6Months => 6,
            Self::Last12Months => 12,
            Self::CurrentYear => {
                let jan_first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                return DateWindow::new(jan_first, today);
            }
        };
        let start = today
            .checked_sub_months(Months::new(months_back))
            .unwrap_or(today);
        DateWindow::new(start, today)
    }
}

impl fmt::Display for FlowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Last3Months => write!(f, "Last 3 Months"),
            Self::Last6Months => write!(f, "Last 6 Months"),
            Self::Last12Months => write!(f, "Last 12 Months"),
            Self::CurrentYear => write!(f, "Current Year"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_summary_period_windows() {
        let today = d(2025, 4, 30);
        assert_eq!(SummaryPeriod::Week.window_ending(today).start, d(2025, 4, 23));
        assert_eq!(SummaryPeriod::Month.window_ending(today).start, d(2025, 3, 31));
        assert_eq!(SummaryPeriod::Year.window_ending(today).start, d(2024, 4, 30));
        assert_eq!(SummaryPeriod::Year.window_ending(today).end, today);
    }

    #[test]
    fn test_window_is_closed_interval() {
        let window = DateWindow::new(d(2025, 4, 1), d(2025, 4, 30));
        assert!(window.contains(d(2025, 4, 1)));
        assert!(window.contains(d(2025, 4, 30)));
        assert!(!window.contains(d(2025, 3, 31)));
        assert!(!window.contains(d(2025, 5, 1)));
        assert_eq!(window.span_days(), 29);
    }

    #[test]
    fn test_window_swaps_reversed_ends() {
        let window = DateWindow::new(d(2025, 4, 30), d(2025, 4, 1));
        assert_eq!(window.start, d(2025, 4, 1));
    }

    #[test]
    fn test_period_parse() {
        assert_eq!(SummaryPeriod::parse("Week").unwrap(), SummaryPeriod::Week);
        assert!(SummaryPeriod::parse("decade").is_err());
    }

    #[test]
    fn test_month_navigation() {
        let jan = Month::parse("2025-01").unwrap();
        assert_eq!(jan.previous().to_string(), "2024-12");
        assert_eq!(Month::parse("2024-12").unwrap().next(), jan);
        assert_eq!(Month::parse("2024-02").unwrap().end_date(), d(2024, 2, 29));
        assert!(Month::parse("2025-13").is_err());
    }

    #[test]
    fn test_flow_range_windows() {
        let today = d(2025, 5, 31);
        assert_eq!(FlowRange::Last3Months.window_ending(today).start, d(2025, 2, 28));
        assert_eq!(FlowRange::CurrentYear.window_ending(today).start, d(2025, 1, 1));
    }
}
