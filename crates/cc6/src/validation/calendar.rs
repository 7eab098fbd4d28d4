//! Model calendars for CF time coordinates.
//!
//! Climate models run on idealized calendars (`noleap`, `360_day`) whose
//! dates chrono cannot represent, so dates are handled as day counts per
//! calendar. Only the Gregorian variant goes through chrono.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

const SECONDS_PER_DAY: i64 = 86_400;
const MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// A CF calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    /// `standard`, `gregorian` or `proleptic_gregorian`. Dates before the
    /// 1582 reform are treated as proleptic.
    Gregorian,
    /// `noleap` or `365_day`.
    NoLeap,
    /// `all_leap` or `366_day`.
    AllLeap,
    /// `360_day`: twelve months of 30 days.
    Day360,
}

/// A date and time of day on some [`Calendar`], at second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarDateTime {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl CalendarDateTime {
    /// Midnight of the given day.
    pub fn date(year: i64, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    /// The same wall-clock fields as a chrono timestamp.
    pub fn from_naive(dt: &NaiveDateTime) -> Self {
        Self {
            year: i64::from(dt.year()),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }

    fn seconds_of_day(&self) -> i64 {
        i64::from(self.hour) * 3600 + i64::from(self.minute) * 60 + i64::from(self.second)
    }
}

impl fmt::Display for CalendarDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Calendar {
    /// Parse a CF `calendar` attribute value. Case-insensitive.
    pub fn from_cf(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Some(Calendar::Gregorian),
            "noleap" | "365_day" => Some(Calendar::NoLeap),
            "all_leap" | "366_day" => Some(Calendar::AllLeap),
            "360_day" => Some(Calendar::Day360),
            _ => None,
        }
    }

    /// Number of days in `month` of `year`.
    pub fn days_in_month(self, year: i64, month: u32) -> u32 {
        let index = (month.clamp(1, 12) - 1) as usize;
        match self {
            Calendar::Day360 => 30,
            Calendar::NoLeap => MONTH_DAYS[index],
            Calendar::AllLeap if month == 2 => 29,
            Calendar::AllLeap => MONTH_DAYS[index],
            Calendar::Gregorian if month == 2 && is_leap_year(year) => 29,
            Calendar::Gregorian => MONTH_DAYS[index],
        }
    }

    /// Seconds since `0000-01-01 00:00:00` of this calendar.
    ///
    /// `None` for dates the calendar does not have, such as `02-30` outside
    /// `360_day` or `02-29` in `noleap`.
    pub fn seconds(self, dt: &CalendarDateTime) -> Option<i64> {
        if dt.hour > 23 || dt.minute > 59 || dt.second > 59 {
            return None;
        }
        let day = self.day_number(dt.year, dt.month, dt.day)?;
        Some(day * SECONDS_PER_DAY + dt.seconds_of_day())
    }

    /// The date and time `seconds` after `0000-01-01 00:00:00`.
    pub fn datetime(self, seconds: i64) -> Option<CalendarDateTime> {
        let day = seconds.div_euclid(SECONDS_PER_DAY);
        let rest = seconds.rem_euclid(SECONDS_PER_DAY) as u32;
        let (year, month, day) = self.date_of_day(day)?;
        Some(CalendarDateTime {
            year,
            month,
            day,
            hour: rest / 3600,
            minute: rest % 3600 / 60,
            second: rest % 60,
        })
    }

    fn year_length(self) -> Option<i64> {
        match self {
            Calendar::Day360 => Some(360),
            Calendar::NoLeap => Some(365),
            Calendar::AllLeap => Some(366),
            Calendar::Gregorian => None,
        }
    }

    fn day_number(self, year: i64, month: u32, day: u32) -> Option<i64> {
        if !(1..=12).contains(&month) || day < 1 || day > self.days_in_month(year, month) {
            return None;
        }
        match self.year_length() {
            Some(length) => {
                let before: i64 = (1..month)
                    .map(|m| i64::from(self.days_in_month(year, m)))
                    .sum();
                Some(year * length + before + i64::from(day) - 1)
            }
            None => {
                let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
                Some(i64::from(date.num_days_from_ce()))
            }
        }
    }

    fn date_of_day(self, number: i64) -> Option<(i64, u32, u32)> {
        match self.year_length() {
            Some(length) => {
                let year = number.div_euclid(length);
                let mut rest = number.rem_euclid(length);
                for month in 1..=12 {
                    let days = i64::from(self.days_in_month(year, month));
                    if rest < days {
                        return Some((year, month, rest as u32 + 1));
                    }
                    rest -= days;
                }
                None
            }
            None => {
                let date = NaiveDate::from_num_days_from_ce_opt(i32::try_from(number).ok()?)?;
                Some((i64::from(date.year()), date.month(), date.day()))
            }
        }
    }
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(calendar: Calendar, year: i64, month: u32, day: u32) -> i64 {
        calendar
            .seconds(&CalendarDateTime::date(year, month, day))
            .unwrap()
    }

    #[test]
    fn test_from_cf_names() {
        assert_eq!(Calendar::from_cf("proleptic_gregorian"), Some(Calendar::Gregorian));
        assert_eq!(Calendar::from_cf("Standard"), Some(Calendar::Gregorian));
        assert_eq!(Calendar::from_cf("365_day"), Some(Calendar::NoLeap));
        assert_eq!(Calendar::from_cf("366_day"), Some(Calendar::AllLeap));
        assert_eq!(Calendar::from_cf("360_day"), Some(Calendar::Day360));
        assert_eq!(Calendar::from_cf("julian"), None);
    }

    #[test]
    fn test_year_lengths() {
        let year = |c: Calendar, y: i64| seconds(c, y + 1, 1, 1) - seconds(c, y, 1, 1);
        assert_eq!(year(Calendar::Gregorian, 1952), 366 * SECONDS_PER_DAY);
        assert_eq!(year(Calendar::Gregorian, 1900), 365 * SECONDS_PER_DAY);
        assert_eq!(year(Calendar::NoLeap, 1952), 365 * SECONDS_PER_DAY);
        assert_eq!(year(Calendar::AllLeap, 1951), 366 * SECONDS_PER_DAY);
        assert_eq!(year(Calendar::Day360, 1952), 360 * SECONDS_PER_DAY);
    }

    #[test]
    fn test_invalid_dates() {
        let feb30 = CalendarDateTime::date(1951, 2, 30);
        assert!(Calendar::Day360.seconds(&feb30).is_some());
        assert!(Calendar::Gregorian.seconds(&feb30).is_none());
        let feb29 = CalendarDateTime::date(1952, 2, 29);
        assert!(Calendar::Gregorian.seconds(&feb29).is_some());
        assert!(Calendar::NoLeap.seconds(&feb29).is_none());
        assert!(Calendar::Day360.seconds(&CalendarDateTime::date(1951, 13, 1)).is_none());
    }

    #[test]
    fn test_datetime_inverts_seconds() {
        for calendar in [Calendar::Gregorian, Calendar::NoLeap, Calendar::AllLeap, Calendar::Day360] {
            let dt = CalendarDateTime {
                year: 1954,
                month: 12,
                day: 30,
                hour: 12,
                minute: 30,
                second: 5,
            };
            let back = calendar.datetime(calendar.seconds(&dt).unwrap()).unwrap();
            assert_eq!(back, dt, "{:?}", calendar);
        }
    }

    #[test]
    fn test_day_after_february() {
        let next = |c: Calendar| c.datetime(seconds(c, 1952, 2, 28) + SECONDS_PER_DAY).unwrap();
        assert_eq!(next(Calendar::Gregorian).to_string(), "1952-02-29 00:00:00");
        assert_eq!(next(Calendar::NoLeap).to_string(), "1952-03-01 00:00:00");
        assert_eq!(next(Calendar::Day360).to_string(), "1952-02-29 00:00:00");
    }
}
