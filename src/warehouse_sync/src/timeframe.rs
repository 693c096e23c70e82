//! Date-range planning.
//!
//! [`plan_dates`] expands an inclusive `(start, end)` range into the discrete
//! calendar points a task iterates over:
//! - [`DateResolution::Day`]: every day;
//! - [`DateResolution::Week`]: Mondays, starting at `start` if it is a Monday
//!   and otherwise at the following Monday;
//! - [`DateResolution::Month`]: first days of months, starting at `start` if
//!   it is the 1st and otherwise at the 1st of the next month.
//!
//! ```
//! use chrono::NaiveDate;
//! use warehouse_sync::timeframe::{plan_dates, DateResolution};
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2023, m, day).unwrap();
//! let res: DateResolution = "M".parse().unwrap();
//! assert_eq!(plan_dates(d(1, 15), d(4, 1), res), vec![d(2, 1), d(3, 1), d(4, 1)]);
//! ```

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, NaiveDate};

use crate::error::EtlError;

/// Calendar step between planned dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateResolution {
    /// Every calendar day.
    Day,
    /// Monday-based weeks.
    Week,
    /// Calendar months, anchored on the 1st.
    Month,
}

impl DateResolution {
    /// Long name used in run logs.
    pub const fn describe(self) -> &'static str {
        match self {
            DateResolution::Day => "daily",
            DateResolution::Week => "weekly",
            DateResolution::Month => "monthly",
        }
    }
}

impl fmt::Display for DateResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            DateResolution::Day => "D",
            DateResolution::Week => "W",
            DateResolution::Month => "M",
        };
        f.write_str(code)
    }
}

impl FromStr for DateResolution {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "D" => Ok(DateResolution::Day),
            "W" => Ok(DateResolution::Week),
            "M" => Ok(DateResolution::Month),
            other => Err(EtlError::InvalidResolution(other.to_string())),
        }
    }
}

/// First planned date on or after `start`.
pub fn align_start(start: NaiveDate, resolution: DateResolution) -> Option<NaiveDate> {
    match resolution {
        DateResolution::Day => Some(start),
        DateResolution::Week => {
            let until_monday = (7 - start.weekday().num_days_from_monday()) % 7;
            start.checked_add_days(Days::new(u64::from(until_monday)))
        }
        DateResolution::Month if start.day() == 1 => Some(start),
        DateResolution::Month => first_of_next_month(start),
    }
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn step(date: NaiveDate, resolution: DateResolution) -> Option<NaiveDate> {
    match resolution {
        DateResolution::Day => date.succ_opt(),
        DateResolution::Week => date.checked_add_days(Days::new(7)),
        DateResolution::Month => first_of_next_month(date),
    }
}

/// Expands `[start, end]` into planned dates. Empty when the aligned start is
/// already past `end`.
pub fn plan_dates(start: NaiveDate, end: NaiveDate, resolution: DateResolution) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut next = align_start(start, resolution);
    while let Some(date) = next.filter(|d| *d <= end) {
        dates.push(date);
        next = step(date, resolution);
    }
    dates
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;
    use proptest::prelude::*;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_letter_codes() {
        assert_eq!("D".parse::<DateResolution>().unwrap(), DateResolution::Day);
        assert_eq!("W".parse::<DateResolution>().unwrap(), DateResolution::Week);
        assert_eq!("M".parse::<DateResolution>().unwrap(), DateResolution::Month);
        assert!(matches!(
            "Q".parse::<DateResolution>(),
            Err(EtlError::InvalidResolution(code)) if code == "Q"
        ));
    }

    #[test]
    fn daily_is_inclusive() {
        assert_eq!(
            plan_dates(d(2023, 1, 30), d(2023, 2, 2), DateResolution::Day),
            vec![d(2023, 1, 30), d(2023, 1, 31), d(2023, 2, 1), d(2023, 2, 2)]
        );
    }

    #[test]
    fn weekly_from_midweek_starts_next_monday() {
        let dates = plan_dates(d(2023, 1, 3), d(2023, 1, 20), DateResolution::Week);
        assert_eq!(dates, vec![d(2023, 1, 9), d(2023, 1, 16)]);
    }

    #[test]
    fn weekly_from_monday_keeps_start() {
        let dates = plan_dates(d(2023, 1, 2), d(2023, 1, 16), DateResolution::Week);
        assert_eq!(dates, vec![d(2023, 1, 2), d(2023, 1, 9), d(2023, 1, 16)]);
    }

    #[test]
    fn monthly_from_mid_month() {
        let dates = plan_dates(d(2023, 1, 15), d(2023, 4, 1), DateResolution::Month);
        assert_eq!(dates, vec![d(2023, 2, 1), d(2023, 3, 1), d(2023, 4, 1)]);
    }

    #[test]
    fn monthly_crosses_year_end() {
        let dates = plan_dates(d(2022, 12, 1), d(2023, 1, 31), DateResolution::Month);
        assert_eq!(dates, vec![d(2022, 12, 1), d(2023, 1, 1)]);
    }

    #[test]
    fn end_before_start_is_empty() {
        assert!(plan_dates(d(2023, 2, 1), d(2023, 1, 1), DateResolution::Day).is_empty());
        // aligned start overshoots end
        assert!(plan_dates(d(2023, 1, 3), d(2023, 1, 6), DateResolution::Week).is_empty());
    }

    proptest! {
        #[test]
        fn weekly_dates_are_mondays_seven_days_apart(
            offset in 0u64..3000,
            span in 0u64..400,
        ) {
            let start = d(2015, 1, 1) + Days::new(offset);
            let end = start + Days::new(span);
            let dates = plan_dates(start, end, DateResolution::Week);
            for w in dates.windows(2) {
                prop_assert_eq!((w[1] - w[0]).num_days(), 7);
            }
            for date in &dates {
                prop_assert_eq!(date.weekday(), Weekday::Mon);
                prop_assert!(*date >= start && *date <= end);
            }
            // nothing skipped at the front
            if let Some(first) = dates.first() {
                prop_assert!((*first - start).num_days() < 7);
            }
        }

        #[test]
        fn monthly_dates_are_firsts_in_range(offset in 0u64..3000, span in 0u64..800) {
            let start = d(2015, 1, 1) + Days::new(offset);
            let end = start + Days::new(span);
            let dates = plan_dates(start, end, DateResolution::Month);
            for date in &dates {
                prop_assert_eq!(date.day(), 1);
                prop_assert!(*date >= start && *date <= end);
            }
            for w in dates.windows(2) {
                prop_assert_eq!(first_of_next_month(w[0]), Some(w[1]));
            }
        }
    }
}
