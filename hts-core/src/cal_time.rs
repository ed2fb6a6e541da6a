//! Calendar date/time values with selectable precision.
//!
//! A `CalTime` carries year through hundredth-second fields plus a
//! precision marker saying which of those fields are meaningful. Fields
//! finer than the precision are pinned to their minimum so that
//! comparison and formatting stay consistent. Parsing auto-detects the
//! text layout from string length and delimiter characters.

use crate::error::{HtsError, Result};
use crate::interval::IntervalBase;
use chrono::{Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Which fields of a `CalTime` are meaningful, coarsest to finest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Precision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    /// Hundredths of a second.
    HSecond,
}

/// Explicit text layouts accepted by [CalTime::parse_format] and produced
/// by [CalTime::to_string_format].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    /// `YYYY[-MM[-DD[THH[:mm[:ss[.hh]]]]]][Z|±HH:mm]`
    Iso8601,
    /// `YYYY-MM-DD HH:mm:ss.hh`, truncated to the value's precision.
    YearMonthDay,
    /// `MM/DD/YYYY HH:mm`, month and day variable width.
    MonthDayYear,
    /// `MM/YYYY`
    MonthYear,
    /// `MM/DD`
    MonthDay,
    /// `HH:mm`, time only.
    HourMinute,
}

/// Cumulative days in the year before each month (non-leap).
const DAYS_BEFORE_MONTH: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// True for Gregorian leap years.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in the given month, accounting for leap years.
pub fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// A calendar date/time with selectable precision and optional time zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalTime {
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    hsecond: u8,
    tz: String,
    precision: Precision,
    use_time_zone: bool,
    time_only: bool,
    /// Fast mode skips range validation and derived-field recomputation.
    fast: bool,
    // Derived fields, recomputed on mutation unless fast.
    abs_month: i64,
    leap: bool,
    year_day: u16,
}

impl Default for CalTime {
    fn default() -> Self {
        CalTime::zero()
    }
}

impl CalTime {
    /// A zeroed date: year 0, month 1, day 1, all time fields 0.
    pub fn zero() -> CalTime {
        let mut dt = CalTime {
            year: 0,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            hsecond: 0,
            tz: String::new(),
            precision: Precision::HSecond,
            use_time_zone: false,
            time_only: false,
            fast: false,
            abs_month: 0,
            leap: false,
            year_day: 0,
        };
        dt.recompute();
        dt
    }

    /// The current local date/time, to hundredth-second precision.
    pub fn now() -> CalTime {
        let local = Local::now().naive_local();
        let mut dt = CalTime::zero();
        dt.year = local.year();
        dt.month = local.month() as u8;
        dt.day = local.day() as u8;
        dt.hour = local.hour() as u8;
        dt.minute = local.minute() as u8;
        dt.second = local.second() as u8;
        dt.hsecond = (local.and_utc().timestamp_subsec_millis() / 10) as u8;
        dt.recompute();
        dt
    }

    /// Build from explicit fields at the given precision. Fields finer
    /// than the precision are pinned to their minimums. Validates ranges.
    #[allow(clippy::too_many_arguments)]
    pub fn from_fields(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        hsecond: u8,
        precision: Precision,
    ) -> Result<CalTime> {
        let mut dt = CalTime::zero();
        dt.year = year;
        dt.set_month(month)?;
        dt.set_day(day)?;
        dt.set_hour(hour)?;
        dt.set_minute(minute)?;
        dt.set_second(second)?;
        dt.set_hsecond(hsecond)?;
        dt.set_precision(precision);
        Ok(dt)
    }

    pub fn from_year(year: i32) -> CalTime {
        let mut dt = CalTime::zero();
        dt.year = year;
        dt.set_precision(Precision::Year);
        dt
    }

    pub fn from_ym(year: i32, month: u8) -> Result<CalTime> {
        CalTime::from_fields(year, month, 1, 0, 0, 0, 0, Precision::Month)
    }

    pub fn from_ymd(year: i32, month: u8, day: u8) -> Result<CalTime> {
        CalTime::from_fields(year, month, day, 0, 0, 0, 0, Precision::Day)
    }

    /// Consume and return with the given precision applied.
    pub fn with_precision(mut self, precision: Precision) -> CalTime {
        self.set_precision(precision);
        self
    }

    /// Consume and return in fast mode (no validation, no derived-field
    /// recomputation on mutators).
    pub fn with_fast(mut self, fast: bool) -> CalTime {
        self.fast = fast;
        self
    }

    // --- accessors ---

    pub fn year(&self) -> i32 {
        self.year
    }
    pub fn month(&self) -> u8 {
        self.month
    }
    pub fn day(&self) -> u8 {
        self.day
    }
    pub fn hour(&self) -> u8 {
        self.hour
    }
    pub fn minute(&self) -> u8 {
        self.minute
    }
    pub fn second(&self) -> u8 {
        self.second
    }
    pub fn hsecond(&self) -> u8 {
        self.hsecond
    }
    pub fn time_zone(&self) -> &str {
        &self.tz
    }
    pub fn precision(&self) -> Precision {
        self.precision
    }
    pub fn is_time_only(&self) -> bool {
        self.time_only
    }
    pub fn uses_time_zone(&self) -> bool {
        self.use_time_zone
    }

    /// year*12 + month, cached. Used for O(1) month-distance arithmetic.
    pub fn abs_month(&self) -> i64 {
        self.abs_month
    }

    /// Cached leap-year flag for the current year.
    pub fn is_leap(&self) -> bool {
        self.leap
    }

    /// Cached 1-based day of year.
    pub fn year_day(&self) -> u16 {
        self.year_day
    }

    // --- mutators ---

    /// Recompute the cached derived fields. Called by every mutator
    /// unless fast mode is set.
    fn recompute(&mut self) {
        if self.fast {
            return;
        }
        self.abs_month = self.year as i64 * 12 + self.month as i64;
        self.leap = is_leap_year(self.year);
        let mut yd = DAYS_BEFORE_MONTH[(self.month as usize).clamp(1, 12) - 1] + self.day as u16;
        if self.leap && self.month > 2 {
            yd += 1;
        }
        self.year_day = yd;
    }

    /// Set the precision, pinning fields finer than it to their minimums.
    pub fn set_precision(&mut self, precision: Precision) {
        self.precision = precision;
        if precision < Precision::Month {
            self.month = 1;
        }
        if precision < Precision::Day {
            self.day = 1;
        }
        if precision < Precision::Hour {
            self.hour = 0;
        }
        if precision < Precision::Minute {
            self.minute = 0;
        }
        if precision < Precision::Second {
            self.second = 0;
        }
        if precision < Precision::HSecond {
            self.hsecond = 0;
        }
        self.recompute();
    }

    /// Mark this value as a time-of-day with no date component.
    pub fn set_time_only(&mut self, time_only: bool) {
        self.time_only = time_only;
    }

    pub fn set_year(&mut self, year: i32) {
        self.year = year;
        self.recompute();
    }

    pub fn set_month(&mut self, month: u8) -> Result<()> {
        if !self.fast && !(1..=12).contains(&month) {
            return Err(HtsError::InvalidCalendarField {
                field: "month",
                value: month as i64,
                context: self.to_string(),
            });
        }
        self.month = month;
        self.recompute();
        Ok(())
    }

    pub fn set_day(&mut self, day: u8) -> Result<()> {
        if !self.fast {
            let dim = days_in_month(self.year, self.month);
            if day < 1 || day > dim {
                return Err(HtsError::InvalidCalendarField {
                    field: "day",
                    value: day as i64,
                    context: self.to_string(),
                });
            }
        }
        self.day = day;
        self.recompute();
        Ok(())
    }

    pub fn set_hour(&mut self, hour: u8) -> Result<()> {
        if !self.fast && hour > 23 {
            return Err(HtsError::InvalidCalendarField {
                field: "hour",
                value: hour as i64,
                context: self.to_string(),
            });
        }
        self.hour = hour;
        Ok(())
    }

    pub fn set_minute(&mut self, minute: u8) -> Result<()> {
        if !self.fast && minute > 59 {
            return Err(HtsError::InvalidCalendarField {
                field: "minute",
                value: minute as i64,
                context: self.to_string(),
            });
        }
        self.minute = minute;
        Ok(())
    }

    pub fn set_second(&mut self, second: u8) -> Result<()> {
        if !self.fast && second > 59 {
            return Err(HtsError::InvalidCalendarField {
                field: "second",
                value: second as i64,
                context: self.to_string(),
            });
        }
        self.second = second;
        Ok(())
    }

    /// Hundredth-second values >= 100 are truncated to their first two
    /// digits rather than rejected.
    pub fn set_hsecond(&mut self, hsecond: u8) -> Result<()> {
        self.hsecond = if hsecond >= 100 {
            (hsecond as u16 / 10) as u8
        } else {
            hsecond
        };
        Ok(())
    }

    pub fn set_time_zone(&mut self, tz: &str) {
        self.tz = tz.to_string();
        self.use_time_zone = !self.tz.is_empty();
    }

    // --- arithmetic ---

    /// Add (or subtract) whole years. A Feb 29 day is clamped to Feb 28
    /// when the target year is not a leap year.
    pub fn add_years(&mut self, n: i32) {
        self.year += n;
        let dim = days_in_month(self.year, self.month);
        if self.day > dim {
            self.day = dim;
        }
        self.recompute();
    }

    /// Add (or subtract) whole months, cascading into the year. The day
    /// is clamped to the target month's length.
    pub fn add_months(&mut self, n: i32) {
        if n == 0 {
            return;
        }
        let total = self.year as i64 * 12 + (self.month as i64 - 1) + n as i64;
        self.year = total.div_euclid(12) as i32;
        self.month = (total.rem_euclid(12) + 1) as u8;
        let dim = days_in_month(self.year, self.month);
        if self.day > dim {
            self.day = dim;
        }
        self.recompute();
    }

    /// Add (or subtract) whole days, cascading into months and years.
    pub fn add_days(&mut self, n: i32) {
        let mut remaining = n;
        while remaining > 0 {
            let dim = days_in_month(self.year, self.month);
            if self.day < dim {
                self.day += 1;
            } else {
                self.day = 1;
                self.step_month(1);
            }
            remaining -= 1;
        }
        while remaining < 0 {
            if self.day > 1 {
                self.day -= 1;
            } else {
                self.step_month(-1);
                self.day = days_in_month(self.year, self.month);
            }
            remaining += 1;
        }
        self.recompute();
    }

    /// Month step without day clamping, for use mid-cascade.
    fn step_month(&mut self, n: i32) {
        let total = self.year as i64 * 12 + (self.month as i64 - 1) + n as i64;
        self.year = total.div_euclid(12) as i32;
        self.month = (total.rem_euclid(12) + 1) as u8;
    }

    pub fn add_hours(&mut self, n: i32) {
        let total = self.hour as i64 + n as i64;
        self.hour = total.rem_euclid(24) as u8;
        let days = total.div_euclid(24);
        if days != 0 {
            self.add_days(days as i32);
        } else {
            self.recompute();
        }
    }

    pub fn add_minutes(&mut self, n: i32) {
        let total = self.minute as i64 + n as i64;
        self.minute = total.rem_euclid(60) as u8;
        let hours = total.div_euclid(60);
        if hours != 0 {
            self.add_hours(hours as i32);
        }
    }

    pub fn add_seconds(&mut self, n: i32) {
        let total = self.second as i64 + n as i64;
        self.second = total.rem_euclid(60) as u8;
        let minutes = total.div_euclid(60);
        if minutes != 0 {
            self.add_minutes(minutes as i32);
        }
    }

    /// Add N of the given interval base. Irregular is a no-op.
    pub fn add_interval(&mut self, base: IntervalBase, n: i32) {
        match base {
            IntervalBase::Year => self.add_years(n),
            IntervalBase::Month => self.add_months(n),
            IntervalBase::Day => self.add_days(n),
            IntervalBase::Hour => self.add_hours(n),
            IntervalBase::Minute => self.add_minutes(n),
            IntervalBase::Second => self.add_seconds(n),
            IntervalBase::Irregular => {}
        }
    }

    // --- comparison ---

    /// Compare using the coarser of the two values' precisions: only
    /// fields at or coarser than the shared precision participate.
    pub fn cmp_shared(&self, other: &CalTime) -> Ordering {
        let shared = self.precision.min(other.precision);
        let ord = self.year.cmp(&other.year);
        if ord != Ordering::Equal || shared < Precision::Month {
            return ord;
        }
        let ord = self.month.cmp(&other.month);
        if ord != Ordering::Equal || shared < Precision::Day {
            return ord;
        }
        let ord = self.day.cmp(&other.day);
        if ord != Ordering::Equal || shared < Precision::Hour {
            return ord;
        }
        let ord = self.hour.cmp(&other.hour);
        if ord != Ordering::Equal || shared < Precision::Minute {
            return ord;
        }
        let ord = self.minute.cmp(&other.minute);
        if ord != Ordering::Equal || shared < Precision::Second {
            return ord;
        }
        let ord = self.second.cmp(&other.second);
        if ord != Ordering::Equal || shared < Precision::HSecond {
            return ord;
        }
        self.hsecond.cmp(&other.hsecond)
    }

    pub fn less_than(&self, other: &CalTime) -> bool {
        self.cmp_shared(other) == Ordering::Less
    }

    pub fn greater_than(&self, other: &CalTime) -> bool {
        self.cmp_shared(other) == Ordering::Greater
    }

    pub fn less_or_equal(&self, other: &CalTime) -> bool {
        self.cmp_shared(other) != Ordering::Greater
    }

    // --- parsing ---

    /// Parse a date/time string, auto-detecting the layout from string
    /// length and delimiter characters. An optional trailing
    /// space-delimited alphabetic token is treated as a time zone and
    /// stripped before length-based dispatch.
    pub fn parse(text: &str) -> Result<CalTime> {
        let mut s = text.trim();
        if s.is_empty() {
            return Err(HtsError::DateParse("empty date/time string".to_string()));
        }
        let mut tz: Option<&str> = None;
        if let Some(idx) = s.rfind(' ') {
            let tail = &s[idx + 1..];
            if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_alphabetic()) {
                tz = Some(tail);
                s = s[..idx].trim_end();
            }
        }
        let mut dt = Self::parse_dispatch(s)?;
        if let Some(zone) = tz {
            dt.set_time_zone(zone);
        }
        Ok(dt)
    }

    /// Parse with an explicit layout. `month_first` disambiguates
    /// variable-width month/day fields in slash layouts ("1/2/1995" is
    /// Jan 2 when true, Feb 1 when false).
    pub fn parse_format(text: &str, format: TimeFormat, month_first: bool) -> Result<CalTime> {
        let s = text.trim();
        match format {
            TimeFormat::Iso8601 => Self::parse_iso8601(s),
            TimeFormat::YearMonthDay => Self::parse_dispatch(s),
            TimeFormat::MonthDayYear => {
                let (date_part, time_part) = match s.find(' ') {
                    Some(idx) => (&s[..idx], Some(s[idx + 1..].trim())),
                    None => (s, None),
                };
                let (first, second, year) = Self::split_slash_date(date_part)?;
                let (month, day) = if month_first {
                    (first, second)
                } else {
                    (second, first)
                };
                let mut dt =
                    CalTime::from_fields(year, month, day, 0, 0, 0, 0, Precision::Day)?;
                if let Some(time) = time_part {
                    let (hour, minute, bump) = Self::split_hour_minute(time)?;
                    dt.set_hour(hour)?;
                    dt.set_minute(minute)?;
                    dt.set_precision(Precision::Minute);
                    if bump {
                        dt.add_days(1);
                    }
                }
                Ok(dt)
            }
            TimeFormat::MonthYear => {
                let parts: Vec<&str> = s.split('/').collect();
                if parts.len() != 2 {
                    return Err(HtsError::DateParse(s.to_string()));
                }
                let month = Self::parse_num(parts[0], s)? as u8;
                let year = Self::parse_num(parts[1], s)? as i32;
                CalTime::from_ym(year, month)
            }
            TimeFormat::MonthDay => {
                let parts: Vec<&str> = s.split('/').collect();
                if parts.len() != 2 {
                    return Err(HtsError::DateParse(s.to_string()));
                }
                let mut dt = CalTime::zero();
                dt.set_month(Self::parse_num(parts[0], s)? as u8)?;
                dt.set_day(Self::parse_num(parts[1], s)? as u8)?;
                dt.set_precision(Precision::Day);
                Ok(dt)
            }
            TimeFormat::HourMinute => {
                let (hour, minute, bump) = Self::split_hour_minute(s)?;
                let mut dt = CalTime::zero();
                dt.set_hour(hour)?;
                dt.set_minute(minute)?;
                dt.set_time_only(true);
                dt.set_precision(Precision::Minute);
                if bump {
                    dt.add_days(1);
                }
                Ok(dt)
            }
        }
    }

    /// Ordered dispatch on (length, delimiters), after zone stripping.
    fn parse_dispatch(s: &str) -> Result<CalTime> {
        // layouts below slice by byte index; non-ASCII input can never
        // match one, so reject it before slicing
        if !s.is_ascii() {
            return Err(HtsError::DateParse(s.to_string()));
        }
        let b = s.as_bytes();
        match s.len() {
            // YYYY
            4 => {
                let year = Self::parse_num(s, s)? as i32;
                Ok(CalTime::from_year(year))
            }
            // HH:mm or MM/DD
            5 => {
                if b[2] == b':' {
                    Self::parse_format(s, TimeFormat::HourMinute, true)
                } else if b[2] == b'/' {
                    Self::parse_format(s, TimeFormat::MonthDay, true)
                } else {
                    Err(HtsError::DateParse(s.to_string()))
                }
            }
            // M/YYYY
            6 => {
                if b[1] == b'/' {
                    Self::parse_format(s, TimeFormat::MonthYear, true)
                } else {
                    Err(HtsError::DateParse(s.to_string()))
                }
            }
            // YYYY-MM or MM/YYYY
            7 => {
                if b[4] == b'-' {
                    let year = Self::parse_num(&s[0..4], s)? as i32;
                    let month = Self::parse_num(&s[5..7], s)? as u8;
                    CalTime::from_ym(year, month)
                } else if b[2] == b'/' {
                    Self::parse_format(s, TimeFormat::MonthYear, true)
                } else {
                    Err(HtsError::DateParse(s.to_string()))
                }
            }
            // HH:mm:ss, M/D/YYYY, or YYYYMMDD
            8 => {
                if b[2] == b':' {
                    let mut dt = Self::parse_format(&s[0..5], TimeFormat::HourMinute, true)?;
                    dt.set_second(Self::parse_num(&s[6..8], s)? as u8)?;
                    dt.set_precision(Precision::Second);
                    dt.set_time_only(true);
                    Ok(dt)
                } else if s.contains('/') {
                    Self::parse_format(s, TimeFormat::MonthDayYear, true)
                } else {
                    let year = Self::parse_num(&s[0..4], s)? as i32;
                    let month = Self::parse_num(&s[4..6], s)? as u8;
                    let day = Self::parse_num(&s[6..8], s)? as u8;
                    CalTime::from_ymd(year, month, day)
                }
            }
            // M/DD/YYYY or MM/D/YYYY
            9 => Self::parse_format(s, TimeFormat::MonthDayYear, true),
            // YYYY-MM-DD or MM/DD/YYYY
            10 => {
                if b[4] == b'-' {
                    let year = Self::parse_num(&s[0..4], s)? as i32;
                    let month = Self::parse_num(&s[5..7], s)? as u8;
                    let day = Self::parse_num(&s[8..10], s)? as u8;
                    CalTime::from_ymd(year, month, day)
                } else if s.contains('/') {
                    Self::parse_format(s, TimeFormat::MonthDayYear, true)
                } else {
                    Err(HtsError::DateParse(s.to_string()))
                }
            }
            // YYYY-MM-DD H and YYYY-MM-DD HH
            12 | 13 => {
                if b[10] != b' ' && b[10] != b'T' {
                    return Err(HtsError::DateParse(s.to_string()));
                }
                let mut dt = Self::parse_dispatch(&s[0..10])?;
                let hour_raw = Self::parse_num(&s[11..], s)?;
                dt.set_precision(Precision::Hour);
                Self::apply_hour(&mut dt, hour_raw)?;
                Ok(dt)
            }
            // M/DD/YYYY HH:mm and MM/D/YYYY HH:mm
            15 => Self::parse_format(s, TimeFormat::MonthDayYear, true),
            // YYYY-MM-DD HH:mm or MM/DD/YYYY HH:mm
            16 => {
                if b[4] == b'-' {
                    let mut dt = Self::parse_dispatch(&s[0..10])?;
                    if b[10] != b' ' && b[10] != b'T' {
                        return Err(HtsError::DateParse(s.to_string()));
                    }
                    let hour_raw = Self::parse_num(&s[11..13], s)?;
                    dt.set_minute(Self::parse_num(&s[14..16], s)? as u8)?;
                    dt.set_precision(Precision::Minute);
                    Self::apply_hour(&mut dt, hour_raw)?;
                    Ok(dt)
                } else {
                    Self::parse_format(s, TimeFormat::MonthDayYear, true)
                }
            }
            // YYYY-MM-DD HH:mm:ss
            19 => {
                let mut dt = Self::parse_dispatch(&s[0..16])?;
                dt.set_second(Self::parse_num(&s[17..19], s)? as u8)?;
                dt.set_precision(Precision::Second);
                Ok(dt)
            }
            // YYYY-MM-DD HH:mm:ss.hh
            22 => {
                let mut dt = Self::parse_dispatch(&s[0..19])?;
                dt.set_hsecond(Self::parse_fraction(&s[20..22], s)?)?;
                dt.set_precision(Precision::HSecond);
                Ok(dt)
            }
            n if n >= 23 => Self::parse_iso8601(s),
            _ => Err(HtsError::DateParse(s.to_string())),
        }
    }

    /// Parse `YYYY[-MM[-DD[THH[:mm[:ss[.hh]]]]]][Z|±HH:mm]`. A space is
    /// accepted in place of the `T`.
    pub fn parse_iso8601(s: &str) -> Result<CalTime> {
        let b = s.as_bytes();
        if b.len() < 4 || !s.is_ascii() {
            return Err(HtsError::DateParse(s.to_string()));
        }
        let mut dt = CalTime::zero();
        dt.year = Self::parse_num(&s[0..4], s)? as i32;
        let mut precision = Precision::Year;
        let mut i = 4;
        let two = |i: usize| -> Result<u8> {
            if i + 2 > s.len() {
                return Err(HtsError::DateParse(s.to_string()));
            }
            Ok(Self::parse_num(&s[i..i + 2], s)? as u8)
        };
        // date portion
        if i + 2 < s.len() && b[i] == b'-' && b[i + 1].is_ascii_digit() {
            dt.set_month(two(i + 1)?)?;
            precision = Precision::Month;
            i += 3;
            if i + 2 < s.len() && b[i] == b'-' && b[i + 1].is_ascii_digit() {
                dt.set_day(two(i + 1)?)?;
                precision = Precision::Day;
                i += 3;
            }
        }
        // time portion
        let mut bump_day = false;
        if i < s.len() && (b[i] == b'T' || b[i] == b' ') && precision == Precision::Day {
            let hour_raw = two(i + 1)? as i64;
            if hour_raw == 24 {
                bump_day = true;
                dt.set_hour(0)?;
            } else {
                dt.set_hour(hour_raw as u8)?;
            }
            precision = Precision::Hour;
            i += 3;
            if i < s.len() && b[i] == b':' {
                dt.set_minute(two(i + 1)?)?;
                precision = Precision::Minute;
                i += 3;
                if i < s.len() && b[i] == b':' {
                    dt.set_second(two(i + 1)?)?;
                    precision = Precision::Second;
                    i += 3;
                    if i < s.len() && b[i] == b'.' {
                        let start = i + 1;
                        let mut end = start;
                        while end < s.len() && b[end].is_ascii_digit() {
                            end += 1;
                        }
                        if end == start {
                            return Err(HtsError::DateParse(s.to_string()));
                        }
                        dt.set_hsecond(Self::parse_fraction(&s[start..end], s)?)?;
                        precision = Precision::HSecond;
                        i = end;
                    }
                }
            }
        }
        // zone designator
        if i < s.len() {
            let rest = &s[i..];
            let valid_offset = (rest.starts_with('+') || rest.starts_with('-'))
                && rest.len() == 6
                && rest.as_bytes()[3] == b':';
            if rest == "Z" || valid_offset {
                dt.set_time_zone(rest);
            } else {
                return Err(HtsError::DateParse(s.to_string()));
            }
        }
        dt.set_precision(precision);
        if bump_day {
            dt.add_days(1);
        }
        Ok(dt)
    }

    /// Hour 24 is normalized to hour 0 of the next day.
    fn apply_hour(dt: &mut CalTime, hour_raw: i64) -> Result<()> {
        if hour_raw == 24 {
            dt.set_hour(0)?;
            dt.add_days(1);
        } else {
            dt.set_hour(hour_raw as u8)?;
        }
        Ok(())
    }

    fn parse_num(digits: &str, whole: &str) -> Result<i64> {
        digits
            .trim()
            .parse::<i64>()
            .map_err(|_| HtsError::DateParse(whole.to_string()))
    }

    /// Fractional-second digits: the first two digits are kept as
    /// hundredths; a single digit is tenths.
    fn parse_fraction(digits: &str, whole: &str) -> Result<u8> {
        let kept = &digits[..digits.len().min(2)];
        let value = Self::parse_num(kept, whole)? as u8;
        Ok(if kept.len() == 1 { value * 10 } else { value })
    }

    fn split_slash_date(s: &str) -> Result<(u8, u8, i32)> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 3 || parts[2].len() != 4 {
            return Err(HtsError::DateParse(s.to_string()));
        }
        Ok((
            Self::parse_num(parts[0], s)? as u8,
            Self::parse_num(parts[1], s)? as u8,
            Self::parse_num(parts[2], s)? as i32,
        ))
    }

    /// Returns (hour, minute, day-bump) where day-bump reflects hour 24.
    fn split_hour_minute(s: &str) -> Result<(u8, u8, bool)> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 {
            return Err(HtsError::DateParse(s.to_string()));
        }
        let hour_raw = Self::parse_num(parts[0], s)?;
        let minute = Self::parse_num(parts[1], s)? as u8;
        if hour_raw == 24 {
            Ok((0, minute, true))
        } else {
            Ok((hour_raw as u8, minute, false))
        }
    }

    // --- formatting ---

    /// Render in the given explicit layout, truncated to this value's
    /// precision.
    pub fn to_string_format(&self, format: TimeFormat) -> String {
        match format {
            TimeFormat::Iso8601 => {
                let mut out = format!("{:04}", self.year);
                if self.precision >= Precision::Month {
                    out.push_str(&format!("-{:02}", self.month));
                }
                if self.precision >= Precision::Day {
                    out.push_str(&format!("-{:02}", self.day));
                }
                if self.precision >= Precision::Hour {
                    out.push_str(&format!("T{:02}", self.hour));
                }
                if self.precision >= Precision::Minute {
                    out.push_str(&format!(":{:02}", self.minute));
                }
                if self.precision >= Precision::Second {
                    out.push_str(&format!(":{:02}", self.second));
                }
                if self.precision >= Precision::HSecond {
                    out.push_str(&format!(".{:02}", self.hsecond));
                }
                if self.use_time_zone && !self.tz.is_empty() {
                    out.push_str(&self.tz);
                }
                out
            }
            TimeFormat::YearMonthDay => self.to_string(),
            TimeFormat::MonthDayYear => {
                let mut out = format!("{:02}/{:02}/{:04}", self.month, self.day, self.year);
                if self.precision >= Precision::Hour {
                    out.push_str(&format!(" {:02}:{:02}", self.hour, self.minute));
                }
                out
            }
            TimeFormat::MonthYear => format!("{:02}/{:04}", self.month, self.year),
            TimeFormat::MonthDay => format!("{:02}/{:02}", self.month, self.day),
            TimeFormat::HourMinute => format!("{:02}:{:02}", self.hour, self.minute),
        }
    }
}

impl fmt::Display for CalTime {
    /// Auto-selects suffix detail from the precision; appends the time
    /// zone when one is set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.time_only {
            match self.precision {
                Precision::Second => {
                    write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?
                }
                Precision::HSecond => write!(
                    f,
                    "{:02}:{:02}:{:02}.{:02}",
                    self.hour, self.minute, self.second, self.hsecond
                )?,
                _ => write!(f, "{:02}:{:02}", self.hour, self.minute)?,
            }
        } else {
            write!(f, "{:04}", self.year)?;
            if self.precision >= Precision::Month {
                write!(f, "-{:02}", self.month)?;
            }
            if self.precision >= Precision::Day {
                write!(f, "-{:02}", self.day)?;
            }
            if self.precision >= Precision::Hour {
                write!(f, " {:02}", self.hour)?;
            }
            if self.precision >= Precision::Minute {
                write!(f, ":{:02}", self.minute)?;
            }
            if self.precision >= Precision::Second {
                write!(f, ":{:02}", self.second)?;
            }
            if self.precision >= Precision::HSecond {
                write!(f, ".{:02}", self.hsecond)?;
            }
        }
        if self.use_time_zone && !self.tz.is_empty() {
            write!(f, " {}", self.tz)?;
        }
        Ok(())
    }
}

impl FromStr for CalTime {
    type Err = HtsError;

    fn from_str(s: &str) -> Result<Self> {
        CalTime::parse(s)
    }
}

impl PartialEq for CalTime {
    fn eq(&self, other: &Self) -> bool {
        self.year == other.year
            && self.month == other.month
            && self.day == other.day
            && self.hour == other.hour
            && self.minute == other.minute
            && self.second == other.second
            && self.hsecond == other.hsecond
            && self.time_only == other.time_only
    }
}

impl Eq for CalTime {}

impl PartialOrd for CalTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CalTime {
    /// Field-by-field ordering. Fields finer than the precision are
    /// pinned to their minimums, so this agrees with [CalTime::cmp_shared]
    /// for values of equal precision. `time_only` breaks the final tie
    /// so the ordering stays consistent with [PartialEq].
    fn cmp(&self, other: &Self) -> Ordering {
        (
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.hsecond,
            self.time_only,
        )
            .cmp(&(
                other.year,
                other.month,
                other.day,
                other.hour,
                other.minute,
                other.second,
                other.hsecond,
                other.time_only,
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::{days_in_month, is_leap_year, CalTime, Precision, TimeFormat};
    use crate::interval::IntervalBase;
    use std::cmp::Ordering;

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(1996));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(1995));
        assert_eq!(days_in_month(1996, 2), 29);
        assert_eq!(days_in_month(1995, 2), 28);
        assert_eq!(days_in_month(1995, 4), 30);
    }

    #[test]
    fn test_precision_pins_finer_fields() {
        let dt = CalTime::from_fields(1995, 6, 15, 12, 30, 45, 50, Precision::HSecond)
            .unwrap()
            .with_precision(Precision::Month);
        assert_eq!(dt.month(), 6);
        assert_eq!(dt.day(), 1);
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.minute(), 0);
    }

    #[test]
    fn test_strict_rejects_bad_fields() {
        assert!(CalTime::from_ymd(1995, 13, 1).is_err());
        assert!(CalTime::from_ymd(1995, 2, 29).is_err());
        assert!(CalTime::from_ymd(1996, 2, 29).is_ok());
        assert!(CalTime::from_fields(1995, 6, 15, 24, 0, 0, 0, Precision::Hour).is_err());
    }

    #[test]
    fn test_fast_skips_validation() {
        let mut dt = CalTime::zero().with_fast(true);
        assert!(dt.set_month(13).is_ok());
        assert_eq!(dt.month(), 13);
    }

    #[test]
    fn test_hsecond_truncation() {
        let mut dt = CalTime::zero();
        dt.set_hsecond(123).unwrap();
        assert_eq!(dt.hsecond(), 12);
    }

    #[test]
    fn test_derived_fields() {
        let dt = CalTime::from_ymd(1996, 3, 1).unwrap();
        assert!(dt.is_leap());
        assert_eq!(dt.year_day(), 61); // 31 + 29 + 1
        assert_eq!(dt.abs_month(), 1996 * 12 + 3);
    }

    #[test]
    fn test_add_months_cascades() {
        let mut dt = CalTime::from_ym(1995, 11).unwrap();
        dt.add_months(3);
        assert_eq!((dt.year(), dt.month()), (1996, 2));
        dt.add_months(-14);
        assert_eq!((dt.year(), dt.month()), (1994, 12));
    }

    #[test]
    fn test_add_days_cascades() {
        let mut dt = CalTime::from_ymd(1995, 12, 30).unwrap();
        dt.add_days(3);
        assert_eq!((dt.year(), dt.month(), dt.day()), (1996, 1, 2));
        dt.add_days(-3);
        assert_eq!((dt.year(), dt.month(), dt.day()), (1995, 12, 30));
    }

    #[test]
    fn test_add_days_across_leap_feb() {
        let mut dt = CalTime::from_ymd(1996, 2, 28).unwrap();
        dt.add_days(1);
        assert_eq!((dt.month(), dt.day()), (2, 29));
        dt.add_days(1);
        assert_eq!((dt.month(), dt.day()), (3, 1));
    }

    #[test]
    fn test_add_hours_cascades() {
        let mut dt =
            CalTime::from_fields(1995, 12, 31, 22, 0, 0, 0, Precision::Hour).unwrap();
        dt.add_hours(5);
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (1996, 1, 1, 3));
        dt.add_hours(-5);
        assert_eq!((dt.year(), dt.day(), dt.hour()), (1995, 31, 22));
    }

    #[test]
    fn test_add_seconds_cascades() {
        let mut dt =
            CalTime::from_fields(1995, 1, 1, 23, 59, 58, 0, Precision::Second).unwrap();
        dt.add_seconds(3);
        assert_eq!(
            (dt.day(), dt.hour(), dt.minute(), dt.second()),
            (2, 0, 0, 1)
        );
    }

    #[test]
    fn test_add_interval() {
        let mut dt = CalTime::from_ym(1995, 1).unwrap();
        dt.add_interval(IntervalBase::Month, 12);
        assert_eq!((dt.year(), dt.month()), (1996, 1));
        dt.add_interval(IntervalBase::Irregular, 5);
        assert_eq!((dt.year(), dt.month()), (1996, 1));
    }

    #[test]
    fn test_auto_parse_lengths() {
        let cases = [
            ("1995", "1995"),
            ("1995-06", "1995-06"),
            ("06/1995", "1995-06"),
            ("6/1995", "1995-06"),
            ("1995-06-15", "1995-06-15"),
            ("06/15/1995", "1995-06-15"),
            ("6/5/1995", "1995-06-05"),
            ("6/15/1995", "1995-06-15"),
            ("19950615", "1995-06-15"),
            ("1995-06-15 12", "1995-06-15 12"),
            ("1995-06-15 1", "1995-06-15 01"),
            ("1995-06-15 12:30", "1995-06-15 12:30"),
            ("06/15/1995 12:30", "1995-06-15 12:30"),
            ("6/15/1995 12:30", "1995-06-15 12:30"),
            ("1995-06-15 12:30:45", "1995-06-15 12:30:45"),
            ("1995-06-15 12:30:45.67", "1995-06-15 12:30:45.67"),
        ];
        for (input, expected) in cases {
            let dt = CalTime::parse(input).unwrap();
            assert_eq!(dt.to_string(), expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_auto_parse_time_only() {
        let dt = CalTime::parse("12:30").unwrap();
        assert!(dt.is_time_only());
        assert_eq!(dt.to_string(), "12:30");

        let dt = CalTime::parse("12:30:45").unwrap();
        assert_eq!(dt.to_string(), "12:30:45");
        assert_eq!(dt.precision(), Precision::Second);
    }

    #[test]
    fn test_parse_trailing_time_zone() {
        let dt = CalTime::parse("1995-06-15 12:30 MST").unwrap();
        assert_eq!(dt.time_zone(), "MST");
        assert!(dt.uses_time_zone());
        assert_eq!(dt.to_string(), "1995-06-15 12:30 MST");
    }

    #[test]
    fn test_parse_hour_24_normalizes() {
        let dt = CalTime::parse("1995-06-15 24:00").unwrap();
        assert_eq!((dt.day(), dt.hour()), (16, 0));

        let dt = CalTime::parse("1995-12-31 24").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (1996, 1, 1, 0));
    }

    #[test]
    fn test_parse_iso8601() {
        let dt = CalTime::parse_format("1995-06-15T12:30:45.67Z", TimeFormat::Iso8601, true)
            .unwrap();
        assert_eq!(dt.hsecond(), 67);
        assert_eq!(dt.time_zone(), "Z");
        assert_eq!(
            dt.to_string_format(TimeFormat::Iso8601),
            "1995-06-15T12:30:45.67Z"
        );

        let dt = CalTime::parse("1995-06-15T12:30:45.678+01:00").unwrap();
        assert_eq!(dt.hsecond(), 67); // extra digits truncated
        assert_eq!(dt.time_zone(), "+01:00");

        let dt = CalTime::parse_format("1995-06", TimeFormat::Iso8601, true).unwrap();
        assert_eq!(dt.precision(), Precision::Month);
    }

    #[test]
    fn test_parse_format_disambiguation() {
        let dt = CalTime::parse_format("1/2/1995", TimeFormat::MonthDayYear, true).unwrap();
        assert_eq!((dt.month(), dt.day()), (1, 2));
        let dt = CalTime::parse_format("1/2/1995", TimeFormat::MonthDayYear, false).unwrap();
        assert_eq!((dt.month(), dt.day()), (2, 1));
    }

    #[test]
    fn test_format_round_trip_each_precision() {
        let full = CalTime::from_fields(1995, 6, 15, 12, 30, 45, 67, Precision::HSecond).unwrap();
        for precision in [
            Precision::Year,
            Precision::Month,
            Precision::Day,
            Precision::Hour,
            Precision::Minute,
            Precision::Second,
            Precision::HSecond,
        ] {
            let dt = full.clone().with_precision(precision);
            let text = dt.to_string();
            let reparsed = CalTime::parse(&text).unwrap();
            assert_eq!(reparsed.to_string(), text, "precision {:?}", precision);
            assert_eq!(reparsed.precision(), precision);
        }
    }

    #[test]
    fn test_ordering_trichotomy() {
        let a = CalTime::from_ymd(1995, 6, 15).unwrap();
        let b = CalTime::from_ymd(1995, 6, 16).unwrap();
        assert!(a.less_than(&b));
        assert!(!a.greater_than(&b));
        assert!(a.less_or_equal(&b));
        assert_eq!(a.cmp_shared(&a), Ordering::Equal);
        assert_eq!(b.cmp_shared(&a), Ordering::Greater);
    }

    #[test]
    fn test_shared_precision_comparison() {
        // month-precision vs day-precision: only year+month participate
        let month = CalTime::from_ym(1995, 6).unwrap();
        let day = CalTime::from_ymd(1995, 6, 20).unwrap();
        assert_eq!(month.cmp_shared(&day), Ordering::Equal);
        let later = CalTime::from_ymd(1995, 7, 1).unwrap();
        assert!(month.less_than(&later));
    }

    #[test]
    fn test_parse_rejects_multibyte_input() {
        // byte 20 falls inside the two-byte character
        assert!(CalTime::parse("1995-06-15 12:30:45ä.").is_err());
        assert!(CalTime::parse("1995-06-1ä").is_err());
        assert!(CalTime::parse_iso8601("1995-06-15T12:30:45.5ä").is_err());
    }

    #[test]
    fn test_time_only_distinct_in_ordering() {
        let timed = CalTime::parse("12:30").unwrap();
        let mut dated = CalTime::zero();
        dated.set_hour(12).unwrap();
        dated.set_minute(30).unwrap();
        dated.set_precision(Precision::Minute);
        assert_ne!(timed, dated);
        assert_ne!(timed.cmp(&dated), Ordering::Equal);
        assert_eq!(timed.cmp(&timed.clone()), Ordering::Equal);
        assert_eq!(timed, timed.clone());
    }

    #[test]
    fn test_now_has_full_precision() {
        let dt = CalTime::now();
        assert_eq!(dt.precision(), Precision::HSecond);
        assert!(dt.year() >= 2024);
    }
}
