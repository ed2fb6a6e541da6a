use crate::error::{HtsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The base unit a time series is stored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalBase {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    /// Observations at arbitrary timestamps; has no multiplier semantics.
    Irregular,
}

impl IntervalBase {
    /// Canonical name used in identifiers and data files.
    pub fn name(&self) -> &'static str {
        match self {
            IntervalBase::Year => "Year",
            IntervalBase::Month => "Month",
            IntervalBase::Day => "Day",
            IntervalBase::Hour => "Hour",
            IntervalBase::Minute => "Minute",
            IntervalBase::Second => "Second",
            IntervalBase::Irregular => "Irregular",
        }
    }
}

/// A base interval plus a positive integer multiplier, e.g. "15Minute".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub base: IntervalBase,
    pub mult: u32,
}

impl Interval {
    pub fn new(base: IntervalBase, mult: u32) -> Self {
        Interval { base, mult }
    }

    /// Parse an interval string: optional leading digits (multiplier)
    /// followed by a case-insensitive base name, e.g. "Month", "15Minute",
    /// "Irreg". Irregular intervals take no multiplier.
    pub fn parse(text: &str) -> Result<Interval> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(HtsError::IntervalParse("empty interval string".to_string()));
        }
        let digit_end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, name) = trimmed.split_at(digit_end);
        let mult: u32 = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|_| HtsError::IntervalParse(trimmed.to_string()))?
        };
        if mult == 0 {
            return Err(HtsError::IntervalParse(format!(
                "zero multiplier in \"{}\"",
                trimmed
            )));
        }
        let lower = name.to_ascii_lowercase();
        let base = match lower.as_str() {
            "year" | "yr" => IntervalBase::Year,
            "month" | "mon" => IntervalBase::Month,
            "day" => IntervalBase::Day,
            "hour" | "hr" => IntervalBase::Hour,
            "minute" | "min" => IntervalBase::Minute,
            "second" | "sec" => IntervalBase::Second,
            "irregular" | "irreg" => {
                if !digits.is_empty() {
                    return Err(HtsError::IntervalParse(format!(
                        "irregular interval cannot have a multiplier: \"{}\"",
                        trimmed
                    )));
                }
                IntervalBase::Irregular
            }
            _ => return Err(HtsError::IntervalParse(trimmed.to_string())),
        };
        Ok(Interval { base, mult })
    }
}

impl FromStr for Interval {
    type Err = HtsError;

    fn from_str(s: &str) -> Result<Self> {
        Interval::parse(s)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mult == 1 || self.base == IntervalBase::Irregular {
            write!(f, "{}", self.base.name())
        } else {
            write!(f, "{}{}", self.mult, self.base.name())
        }
    }
}
