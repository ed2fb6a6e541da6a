//! Core types for hydrologic time-series data: calendar timestamps with
//! selectable precision, storage intervals, structured series
//! identifiers, and dense time-series containers.

pub mod cal_time;
pub mod error;
pub mod interval;
pub mod series_id;
pub mod time_series;

pub use cal_time::{CalTime, Precision, TimeFormat};
pub use error::{HtsError, Result};
pub use interval::{Interval, IntervalBase};
pub use series_id::SeriesId;
pub use time_series::{FlagMeta, TimeSeries, TsData, DEFAULT_MISSING};
