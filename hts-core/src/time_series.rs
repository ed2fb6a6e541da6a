//! Time-series containers with interval-specific dense storage.
//!
//! A `TimeSeries` holds identifier and period metadata plus an optional
//! data space. Storage is a tagged variant over layout: annual series
//! use a 1-D array indexed by `year - year_start`, monthly series a 2-D
//! array indexed by `[year - year_start][month - 1]`, and daily series
//! one row per month sized to that month's length. All layouts share
//! one get/set/allocate surface, and get and set use the same index
//! computation.

use crate::cal_time::{days_in_month, CalTime, Precision};
use crate::error::{HtsError, Result};
use crate::interval::{Interval, IntervalBase};
use crate::series_id::SeriesId;
use serde::{Deserialize, Serialize};

/// Default missing-value sentinel for newly constructed series.
pub const DEFAULT_MISSING: f64 = -999.0;

/// Tolerance band applied around the missing sentinel.
const MISSING_TOLERANCE: f64 = 0.001;

/// Dense data storage, one variant per supported base interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TsData {
    /// One value per year, indexed by `year - year_start`.
    Annual(Vec<f64>),
    /// One row of 12 values per year.
    Monthly(Vec<[f64; 12]>),
    /// One row per month in the period, sized to days-in-month.
    Daily(Vec<Vec<f64>>),
}

/// Per-cell data-flag storage, parallel to [TsData].
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TsFlags {
    Annual(Vec<String>),
    Monthly(Vec<Vec<String>>),
    Daily(Vec<Vec<String>>),
}

/// Description of one data-flag code used by a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagMeta {
    pub flag: String,
    pub description: String,
}

/// Resolved storage position for a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellIndex {
    Annual(usize),
    Monthly(usize, usize),
    Daily(usize, usize),
}

/// A time series: identifier, period, units, missing-value policy,
/// properties, and interval-specific data storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    id: SeriesId,
    alias: String,
    description: String,
    units: String,
    units_original: String,
    interval: Interval,
    interval_original: Interval,
    start: Option<CalTime>,
    end: Option<CalTime>,
    start_original: Option<CalTime>,
    end_original: Option<CalTime>,
    missing: f64,
    missing_low: f64,
    missing_high: f64,
    properties: Vec<(String, String)>,
    flag_meta: Vec<FlagMeta>,
    dirty: bool,
    data: Option<TsData>,
    flags: Option<TsFlags>,
    /// Set when lazy flag allocation failed; further flag writes are
    /// ignored rather than raised.
    flags_disabled: bool,
    // Allocation bounds for O(1) range checks.
    year_start: i32,
    abs_month_start: i64,
    abs_month_end: i64,
    cell_count: usize,
}

impl Default for TimeSeries {
    fn default() -> Self {
        TimeSeries::new()
    }
}

impl TimeSeries {
    pub fn new() -> TimeSeries {
        let mut ts = TimeSeries {
            id: SeriesId::new(),
            alias: String::new(),
            description: String::new(),
            units: String::new(),
            units_original: String::new(),
            interval: Interval::new(IntervalBase::Month, 1),
            interval_original: Interval::new(IntervalBase::Month, 1),
            start: None,
            end: None,
            start_original: None,
            end_original: None,
            missing: 0.0,
            missing_low: 0.0,
            missing_high: 0.0,
            properties: Vec::new(),
            flag_meta: Vec::new(),
            dirty: false,
            data: None,
            flags: None,
            flags_disabled: false,
            year_start: 0,
            abs_month_start: 0,
            abs_month_end: 0,
            cell_count: 0,
        };
        ts.set_missing(DEFAULT_MISSING);
        ts
    }

    // --- metadata ---

    pub fn id(&self) -> &SeriesId {
        &self.id
    }

    pub fn id_mut(&mut self) -> &mut SeriesId {
        &mut self.id
    }

    pub fn set_id(&mut self, id: SeriesId) {
        if let Some(interval) = id.interval() {
            self.interval = interval;
        }
        self.id = id;
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn set_alias(&mut self, alias: &str) {
        self.alias = alias.to_string();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn set_units(&mut self, units: &str) {
        self.units = units.to_string();
    }

    pub fn units_original(&self) -> &str {
        &self.units_original
    }

    pub fn set_units_original(&mut self, units: &str) {
        self.units_original = units.to_string();
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Interval) {
        self.interval = interval;
    }

    pub fn interval_original(&self) -> Interval {
        self.interval_original
    }

    pub fn set_interval_original(&mut self, interval: Interval) {
        self.interval_original = interval;
    }

    pub fn start(&self) -> Option<&CalTime> {
        self.start.as_ref()
    }

    pub fn end(&self) -> Option<&CalTime> {
        self.end.as_ref()
    }

    pub fn set_period(&mut self, start: CalTime, end: CalTime) {
        self.start = Some(start);
        self.end = Some(end);
    }

    pub fn start_original(&self) -> Option<&CalTime> {
        self.start_original.as_ref()
    }

    pub fn end_original(&self) -> Option<&CalTime> {
        self.end_original.as_ref()
    }

    pub fn set_period_original(&mut self, start: CalTime, end: CalTime) {
        self.start_original = Some(start);
        self.end_original = Some(end);
    }

    pub fn missing(&self) -> f64 {
        self.missing
    }

    /// Set the missing-value sentinel. A not-a-number sentinel switches
    /// to NaN semantics; otherwise a small tolerance band around the
    /// sentinel is recorded.
    pub fn set_missing(&mut self, missing: f64) {
        self.missing = missing;
        if missing.is_nan() {
            self.missing_low = f64::NAN;
            self.missing_high = f64::NAN;
        } else {
            self.missing_low = missing - MISSING_TOLERANCE;
            self.missing_high = missing + MISSING_TOLERANCE;
        }
    }

    /// Not-a-number is always missing; otherwise a value within the
    /// tolerance band around the sentinel is missing.
    pub fn is_missing(&self, value: f64) -> bool {
        if value.is_nan() {
            return true;
        }
        if self.missing.is_nan() {
            return false;
        }
        value >= self.missing_low && value <= self.missing_high
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set a free-form named property, preserving insertion order.
    pub fn set_property(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.properties.iter_mut().find(|(key, _)| key == name) {
            entry.1 = value.to_string();
        } else {
            self.properties.push((name.to_string(), value.to_string()));
        }
    }

    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    pub fn flag_meta(&self) -> &[FlagMeta] {
        &self.flag_meta
    }

    pub fn add_flag_meta(&mut self, flag: &str, description: &str) {
        self.flag_meta.push(FlagMeta {
            flag: flag.to_string(),
            description: description.to_string(),
        });
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn is_allocated(&self) -> bool {
        self.data.is_some()
    }

    /// Number of addressable cells in the allocated period.
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    // --- allocation ---

    /// Allocate the data space for the configured interval and period,
    /// pre-filled with the missing sentinel. The period must be set with
    /// start <= end, and the interval multiplier must be 1: N-month and
    /// N-year storage is unsupported and fails here.
    pub fn allocate(&mut self) -> Result<()> {
        let (start, end) = match (&self.start, &self.end) {
            (Some(start), Some(end)) => (start.clone(), end.clone()),
            _ => {
                return Err(HtsError::InvalidPeriod(format!(
                    "period not set for \"{}\"",
                    self.id
                )))
            }
        };
        if end.cmp_shared(&start) == std::cmp::Ordering::Less {
            return Err(HtsError::InvalidPeriod(format!(
                "start {} is after end {} for \"{}\"",
                start, end, self.id
            )));
        }
        if self.interval.mult != 1 {
            return Err(HtsError::UnsupportedInterval(format!(
                "cannot allocate {} data for \"{}\": multiplier must be 1",
                self.interval, self.id
            )));
        }
        let nyears = (end.year() - start.year() + 1) as usize;
        if nyears == 0 {
            return Err(HtsError::InvalidPeriod(format!(
                "zero-year span for \"{}\"",
                self.id
            )));
        }
        self.year_start = start.year();
        self.abs_month_start = start.year() as i64 * 12 + start.month() as i64;
        self.abs_month_end = end.year() as i64 * 12 + end.month() as i64;
        let nmonths = (self.abs_month_end - self.abs_month_start + 1) as usize;
        match self.interval.base {
            IntervalBase::Year => {
                self.data = Some(TsData::Annual(vec![self.missing; nyears]));
                self.cell_count = nyears;
            }
            IntervalBase::Month => {
                self.data = Some(TsData::Monthly(vec![[self.missing; 12]; nyears]));
                self.cell_count = nmonths;
            }
            IntervalBase::Day => {
                let mut rows = Vec::with_capacity(nmonths);
                let mut total = 0usize;
                for offset in 0..nmonths {
                    let abs = self.abs_month_start + offset as i64;
                    let year = ((abs - 1) / 12) as i32;
                    let month = ((abs - 1) % 12 + 1) as u8;
                    let dim = days_in_month(year, month) as usize;
                    rows.push(vec![self.missing; dim]);
                    total += dim;
                }
                // trim the lead-in before the start day and the tail
                // after the end day from the cell count
                total -= start.day() as usize - 1;
                let last_dim = days_in_month(end.year(), end.month()) as usize;
                total -= last_dim - end.day() as usize;
                self.data = Some(TsData::Daily(rows));
                self.cell_count = total;
            }
            other => {
                return Err(HtsError::UnsupportedInterval(format!(
                    "no dense storage for {} data (\"{}\")",
                    other.name(),
                    self.id
                )))
            }
        }
        self.flags = None;
        log::debug!(
            "allocated {} cells for \"{}\" over {} to {}",
            self.cell_count,
            self.id,
            start,
            end
        );
        Ok(())
    }

    /// Resolve a timestamp to a storage position, or None when outside
    /// the allocated bounds. Shared by the get and set paths.
    fn cell_index(&self, at: &CalTime) -> Option<CellIndex> {
        let data = self.data.as_ref()?;
        match data {
            TsData::Annual(values) => {
                let row = at.year().checked_sub(self.year_start)?;
                if row < 0 || row as usize >= values.len() {
                    return None;
                }
                Some(CellIndex::Annual(row as usize))
            }
            TsData::Monthly(_) => {
                let abs = at.year() as i64 * 12 + at.month() as i64;
                if abs < self.abs_month_start || abs > self.abs_month_end {
                    return None;
                }
                let row = (at.year() - self.year_start) as usize;
                let col = at.month() as usize - 1;
                Some(CellIndex::Monthly(row, col))
            }
            TsData::Daily(rows) => {
                let abs = at.year() as i64 * 12 + at.month() as i64;
                if abs < self.abs_month_start || abs > self.abs_month_end {
                    return None;
                }
                let row = (abs - self.abs_month_start) as usize;
                let col = at.day() as usize;
                if col < 1 || col > rows[row].len() {
                    return None;
                }
                Some(CellIndex::Daily(row, col - 1))
            }
        }
    }

    // --- data access ---

    /// Value at the timestamp, or the missing sentinel when the
    /// timestamp is outside the allocated bounds or no data space exists.
    pub fn value_at(&self, at: &CalTime) -> f64 {
        match self.cell_index(at) {
            Some(CellIndex::Annual(row)) => match self.data.as_ref() {
                Some(TsData::Annual(values)) => values[row],
                _ => self.missing,
            },
            Some(CellIndex::Monthly(row, col)) => match self.data.as_ref() {
                Some(TsData::Monthly(rows)) => rows[row][col],
                _ => self.missing,
            },
            Some(CellIndex::Daily(row, col)) => match self.data.as_ref() {
                Some(TsData::Daily(rows)) => rows[row][col],
                _ => self.missing,
            },
            None => self.missing,
        }
    }

    /// Set the value at the timestamp. Out-of-bounds timestamps are
    /// skipped with a warning, not raised.
    pub fn set_value(&mut self, at: &CalTime, value: f64) {
        let index = match self.cell_index(at) {
            Some(index) => index,
            None => {
                log::warn!(
                    "attempt to set value outside allocated period for \"{}\" at {}",
                    self.id,
                    at
                );
                return;
            }
        };
        match (index, self.data.as_mut()) {
            (CellIndex::Annual(row), Some(TsData::Annual(values))) => values[row] = value,
            (CellIndex::Monthly(row, col), Some(TsData::Monthly(rows))) => rows[row][col] = value,
            (CellIndex::Daily(row, col), Some(TsData::Daily(rows))) => rows[row][col] = value,
            _ => return,
        }
        self.dirty = true;
    }

    /// Set a value together with a data flag. The flag array is
    /// allocated on the first flagged write; if allocation is impossible
    /// (no data space), flags are disabled for this series with a
    /// warning rather than raising.
    pub fn set_value_with_flag(&mut self, at: &CalTime, value: f64, flag: &str) {
        self.set_value(at, value);
        if flag.is_empty() || self.flags_disabled {
            return;
        }
        if self.flags.is_none() && !self.ensure_flags() {
            return;
        }
        let index = match self.cell_index(at) {
            Some(index) => index,
            None => return,
        };
        match (index, self.flags.as_mut()) {
            (CellIndex::Annual(row), Some(TsFlags::Annual(cells))) => {
                cells[row] = flag.to_string();
            }
            (CellIndex::Monthly(row, col), Some(TsFlags::Monthly(rows)))
            | (CellIndex::Daily(row, col), Some(TsFlags::Daily(rows))) => {
                rows[row][col] = flag.to_string();
            }
            _ => {}
        }
    }

    /// The data flag at the timestamp; empty when unset or out of bounds.
    pub fn flag_at(&self, at: &CalTime) -> &str {
        match (self.cell_index(at), self.flags.as_ref()) {
            (Some(CellIndex::Annual(row)), Some(TsFlags::Annual(cells))) => &cells[row],
            (Some(CellIndex::Monthly(row, col)), Some(TsFlags::Monthly(rows)))
            | (Some(CellIndex::Daily(row, col)), Some(TsFlags::Daily(rows))) => &rows[row][col],
            _ => "",
        }
    }

    pub fn has_flags(&self) -> bool {
        self.flags.is_some()
    }

    /// Allocate the flag array, same dimensions as the data space,
    /// initialized to empty strings. Returns false and disables flags
    /// when no data space exists.
    fn ensure_flags(&mut self) -> bool {
        let shape = match self.data.as_ref() {
            Some(data) => data,
            None => {
                log::warn!(
                    "cannot allocate data flags for \"{}\": no data space; flags disabled",
                    self.id
                );
                self.flags_disabled = true;
                return false;
            }
        };
        self.flags = Some(match shape {
            TsData::Annual(values) => TsFlags::Annual(vec![String::new(); values.len()]),
            TsData::Monthly(rows) => {
                TsFlags::Monthly(rows.iter().map(|_| vec![String::new(); 12]).collect())
            }
            TsData::Daily(rows) => TsFlags::Daily(
                rows.iter()
                    .map(|row| vec![String::new(); row.len()])
                    .collect(),
            ),
        });
        true
    }

    /// Iterate the allocated period, yielding each timestamp and value.
    /// Timestamps step by the base interval from the period start.
    pub fn iter_values(&self) -> Vec<(CalTime, f64)> {
        let (start, end) = match (&self.start, &self.end) {
            (Some(start), Some(end)) => (start.clone(), end.clone()),
            _ => return Vec::new(),
        };
        let precision = match self.interval.base {
            IntervalBase::Year => Precision::Year,
            IntervalBase::Month => Precision::Month,
            _ => Precision::Day,
        };
        let mut out = Vec::with_capacity(self.cell_count);
        let mut at = start.with_precision(precision);
        let end = end.with_precision(precision);
        while at.less_or_equal(&end) {
            out.push((at.clone(), self.value_at(&at)));
            at.add_interval(self.interval.base, 1);
        }
        out
    }
}
