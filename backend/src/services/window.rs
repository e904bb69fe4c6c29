//! Reporting periods for the utilization report.
//!
//! A period keyword is turned into a concrete inclusive date range relative
//! to an explicit reference date. Callers pass "today" in; nothing here reads
//! the clock.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportingPeriod {
    Today,
    CurrentWeek,
    CurrentMonth,
    LastMonth,
    /// Aug 1 - Dec 31 from August onwards, Jan 1 - Jul 31 before.
    CurrentSemester,
}

impl ReportingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportingPeriod::Today => "today",
            ReportingPeriod::CurrentWeek => "current-week",
            ReportingPeriod::CurrentMonth => "current-month",
            ReportingPeriod::LastMonth => "last-month",
            ReportingPeriod::CurrentSemester => "current-semester",
        }
    }

    /// Resolve the period against a reference date.
    pub fn window(&self, reference: NaiveDate) -> ReportingWindow {
        match self {
            ReportingPeriod::Today => ReportingWindow {
                start: reference,
                end: reference,
            },
            ReportingPeriod::CurrentWeek => {
                let monday =
                    reference - Days::new(u64::from(reference.weekday().num_days_from_monday()));
                ReportingWindow {
                    start: monday,
                    end: monday + Days::new(6),
                }
            }
            ReportingPeriod::CurrentMonth => {
                let first = first_of_month(reference);
                ReportingWindow {
                    start: first,
                    end: first + Months::new(1) - Days::new(1),
                }
            }
            ReportingPeriod::LastMonth => {
                let first = first_of_month(reference);
                ReportingWindow {
                    start: first - Months::new(1),
                    end: first - Days::new(1),
                }
            }
            ReportingPeriod::CurrentSemester => {
                let first = first_of_month(reference);
                let (months_back, length) = if reference.month() >= 8 {
                    (reference.month0() - 7, 5)
                } else {
                    (reference.month0(), 7)
                };
                let start = first - Months::new(months_back);
                ReportingWindow {
                    start,
                    end: start + Months::new(length) - Days::new(1),
                }
            }
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

impl FromStr for ReportingPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "today" => Ok(Self::Today),
            "current-week" | "week" => Ok(Self::CurrentWeek),
            "current-month" | "month" => Ok(Self::CurrentMonth),
            "last-month" => Ok(Self::LastMonth),
            "current-semester" | "semester" => Ok(Self::CurrentSemester),
            _ => Err(format!("Unknown reporting period: {}", s)),
        }
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive date range.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportingWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportingWindow {
    /// Returns `None` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_current_week_spans_monday_to_sunday() {
        // 2026-10-15 is a Thursday
        let w = ReportingPeriod::CurrentWeek.window(date(2026, 10, 15));
        assert_eq!(w.start, date(2026, 10, 12));
        assert_eq!(w.end, date(2026, 10, 18));
    }

    #[test]
    fn test_current_month_handles_short_months() {
        let w = ReportingPeriod::CurrentMonth.window(date(2028, 2, 17));
        assert_eq!(w.start, date(2028, 2, 1));
        assert_eq!(w.end, date(2028, 2, 29));
    }

    #[test]
    fn test_last_month_crosses_year_boundary() {
        let w = ReportingPeriod::LastMonth.window(date(2026, 1, 9));
        assert_eq!(w.start, date(2025, 12, 1));
        assert_eq!(w.end, date(2025, 12, 31));
    }

    #[test]
    fn test_current_semester_halves() {
        let autumn = ReportingPeriod::CurrentSemester.window(date(2026, 10, 18));
        assert_eq!(autumn.start, date(2026, 8, 1));
        assert_eq!(autumn.end, date(2026, 12, 31));

        let spring = ReportingPeriod::CurrentSemester.window(date(2026, 3, 2));
        assert_eq!(spring.start, date(2026, 1, 1));
        assert_eq!(spring.end, date(2026, 7, 31));
    }

    #[test]
    fn test_today_is_single_day() {
        let w = ReportingPeriod::Today.window(date(2026, 5, 5));
        assert!(w.contains(date(2026, 5, 5)));
        assert!(!w.contains(date(2026, 5, 6)));
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(
            "current_week".parse::<ReportingPeriod>().unwrap(),
            ReportingPeriod::CurrentWeek
        );
        assert_eq!(
            "Last-Month".parse::<ReportingPeriod>().unwrap(),
            ReportingPeriod::LastMonth
        );
        assert!("fortnight".parse::<ReportingPeriod>().is_err());
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        assert!(ReportingWindow::new(date(2026, 2, 1), date(2026, 1, 1)).is_none());
    }
}
