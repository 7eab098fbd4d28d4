//! Time-axis helpers for frequency consistency and file chunking.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::calendar::{Calendar, CalendarDateTime};

static UNITS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z]+)\s+since\s+(.+?)\s*$").expect("valid time units regex")
});
static POINT_SAMPLING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"time: point").expect("valid cell_methods regex"));
static AGGREGATE_SAMPLING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"time: (maximum|minimum|mean|sum)").expect("valid cell_methods regex")
});

const HOUR: f64 = 3600.0;
const DAY: f64 = 86400.0;

/// Accepted time-step range for a frequency, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpacingTolerance {
    pub min_seconds: f64,
    pub max_seconds: f64,
}

impl SpacingTolerance {
    /// Whether a step length is inside the range.
    pub fn accepts(&self, seconds: f64) -> bool {
        seconds >= self.min_seconds && seconds <= self.max_seconds
    }
}

/// Tolerated time-step range for a CMOR frequency.
///
/// `None` for unknown frequencies and for `fx`, which has no time axis.
pub fn spacing_tolerance(frequency: &str) -> Option<SpacingTolerance> {
    let (min, max) = match frequency {
        "1hr" => (0.9 * HOUR, 1.1 * HOUR),
        "3hr" => (2.9 * HOUR, 3.1 * HOUR),
        "6hr" => (5.9 * HOUR, 6.1 * HOUR),
        "day" => (0.9 * DAY, 1.1 * DAY),
        "mon" => (27.5 * DAY, 31.5 * DAY),
        "yr" => (359.9 * DAY, 366.1 * DAY),
        _ => return None,
    };
    Some(SpacingTolerance {
        min_seconds: min,
        max_seconds: max,
    })
}

/// Parsed CF time units (`<unit> since <reference>`).
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnits {
    /// Seconds per unit step.
    pub seconds_per_unit: f64,
    /// Reference epoch.
    pub reference: NaiveDateTime,
}

/// Parse CF time units such as `days since 1949-12-01 00:00:00`.
pub fn parse_time_units(units: &str) -> Result<TimeUnits, String> {
    let captures = UNITS_PATTERN
        .captures(units)
        .ok_or_else(|| format!("time units '{}' are not of the form '<unit> since <date>'", units))?;

    let seconds_per_unit = match captures[1].to_lowercase().as_str() {
        "days" | "day" | "d" => DAY,
        "hours" | "hour" | "hr" | "h" => HOUR,
        "minutes" | "minute" | "min" => 60.0,
        "seconds" | "second" | "sec" | "s" => 1.0,
        other => return Err(format!("unsupported time unit '{}'", other)),
    };

    let reference = parse_reference(&captures[2])
        .ok_or_else(|| format!("cannot parse reference date '{}'", &captures[2]))?;

    Ok(TimeUnits {
        seconds_per_unit,
        reference,
    })
}

impl TimeUnits {
    /// The time stamp of a coordinate value on `calendar`, rounded to the
    /// second. `None` when the value is not finite or leaves the calendar.
    pub fn datetime(&self, calendar: Calendar, value: f64) -> Option<CalendarDateTime> {
        let offset = value * self.seconds_per_unit;
        if !offset.is_finite() {
            return None;
        }
        let reference = calendar.seconds(&CalendarDateTime::from_naive(&self.reference))?;
        calendar.datetime(reference.checked_add(offset.round() as i64)?)
    }
}

fn parse_reference(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim().trim_end_matches('Z').trim_end_matches(" UTC");
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// First step (index, seconds) outside the tolerance, if any.
pub fn first_irregular_step(
    values: &[f64],
    units: &TimeUnits,
    tolerance: &SpacingTolerance,
) -> Option<(usize, f64)> {
    values
        .windows(2)
        .enumerate()
        .map(|(i, w)| (i + 1, (w[1] - w[0]) * units.seconds_per_unit))
        .find(|(_, seconds)| !tolerance.accepts(*seconds))
}

/// How a variable samples time, read from its `cell_methods`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSampling {
    /// Instantaneous values (`time: point`).
    Point,
    /// Values aggregated over each step (`time: mean`, `maximum`, `minimum`
    /// or `sum`), stamped at the middle of the step.
    Aggregate,
}

impl TimeSampling {
    /// `None` when `cell_methods` names no time sampling.
    pub fn from_cell_methods(cell_methods: &str) -> Option<Self> {
        if POINT_SAMPLING.is_match(cell_methods) {
            Some(TimeSampling::Point)
        } else if AGGREGATE_SAMPLING.is_match(cell_methods) {
            Some(TimeSampling::Aggregate)
        } else {
            None
        }
    }
}

/// Full simulation years one file holds at a frequency.
///
/// `None` for frequencies without a chunking convention.
pub fn chunk_years(frequency: &str) -> Option<i64> {
    match frequency {
        "1hr" => Some(1),
        "day" => Some(5),
        "mon" => Some(10),
        _ => None,
    }
}

fn nominal_step_seconds(frequency: &str) -> Option<i64> {
    match frequency {
        "1hr" => Some(3600),
        "day" => Some(86_400),
        "mon" => Some(31 * 86_400),
        _ => None,
    }
}

/// First and last time stamps a complete file should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBounds {
    pub start: CalendarDateTime,
    pub end: CalendarDateTime,
}

/// Expected bounds of a file starting in `first_year`.
///
/// The file spans [`chunk_years`] whole years from January 1 of
/// `first_year`. Point samples run from the start of the first step to the
/// start of the last one; aggregates are stamped half a nominal step inside
/// both ends (half a day less for monthly data on a `360_day` calendar,
/// whose months are 30 days).
pub fn expected_chunk(
    calendar: Calendar,
    frequency: &str,
    sampling: TimeSampling,
    first_year: i64,
) -> Option<ChunkBounds> {
    let years = chunk_years(frequency)?;
    let step = nominal_step_seconds(frequency)?;
    let offset = if calendar == Calendar::Day360 && frequency == "mon" {
        12 * 3600
    } else {
        0
    };

    let mut start = calendar.seconds(&CalendarDateTime::date(first_year, 1, 1))?;
    let mut end = calendar.seconds(&CalendarDateTime::date(first_year + years, 1, 1))?;
    match sampling {
        TimeSampling::Point => end -= step - 2 * offset,
        TimeSampling::Aggregate => {
            start += step / 2 - offset;
            end -= step / 2 - offset;
        }
    }

    Some(ChunkBounds {
        start: calendar.datetime(start)?,
        end: calendar.datetime(end)?,
    })
}
