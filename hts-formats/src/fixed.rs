//! Decoder for the legacy fixed-column hydrologic format.
//!
//! Files carry `#` comment lines, one header line giving the period,
//! units, and year type, then station data rows. Monthly rows hold a
//! year, a station id, and 12 values at fixed 8-character columns;
//! daily rows (detected by line length) add a month field and hold one
//! value per day in the month. The first year block of rows establishes
//! the station order, which later blocks repeat cyclically.

use hts_core::cal_time::CalTime;
use hts_core::error::{HtsError, Result};
use hts_core::interval::{Interval, IntervalBase};
use hts_core::series_id::SeriesId;
use hts_core::time_series::TimeSeries;

/// A monthly data line is at most ~113 characters; daily lines run past
/// 250. Anything longer than this on the first data line means daily.
const DAILY_LINE_THRESHOLD: usize = 150;

/// Fixed width of each value column.
const VALUE_WIDTH: usize = 8;

/// How the file's year labels map onto calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearType {
    /// January through December of the labeled year.
    Calendar,
    /// Water year: October of the labeled year through the following
    /// September.
    Water,
    /// Irrigation year: November of the labeled year through the
    /// following October.
    Irrigation,
}

impl YearType {
    fn parse(text: &str) -> YearType {
        match text.trim().to_ascii_uppercase().as_str() {
            "WYR" => YearType::Water,
            "IYR" => YearType::Irrigation,
            _ => YearType::Calendar,
        }
    }

    /// First calendar month of the labeled year.
    fn start_month(&self, header_month1: u8) -> u8 {
        match self {
            YearType::Calendar => header_month1,
            YearType::Water => 10,
            YearType::Irrigation => 11,
        }
    }
}

#[derive(Debug)]
struct Header {
    month1: u8,
    year1: i32,
    month2: u8,
    year2: i32,
    units: String,
    year_type: YearType,
}

impl Header {
    /// Calendar period covered by the file. For water and irrigation
    /// years the labeled year is the starting calendar year, so the end
    /// year shifts by +1.
    fn period(&self) -> Result<(CalTime, CalTime)> {
        let (start, end) = match self.year_type {
            YearType::Calendar => (
                CalTime::from_ym(self.year1, self.month1)?,
                CalTime::from_ym(self.year2, self.month2)?,
            ),
            YearType::Water => (
                CalTime::from_ym(self.year1, 10)?,
                CalTime::from_ym(self.year2 + 1, 9)?,
            ),
            YearType::Irrigation => (
                CalTime::from_ym(self.year1, 11)?,
                CalTime::from_ym(self.year2 + 1, 10)?,
            ),
        };
        Ok((start, end))
    }
}

/// Parse the single header line `month1 year1 month2 year2 units
/// yeartype`. The primary fixed-column layout applies when the line
/// carries a `/` at index 3 (`MMM/YYYY` date pairs); otherwise a
/// whitespace-token fallback is used.
fn parse_header(line: &str) -> Result<Header> {
    let bytes = line.as_bytes();
    let (month1, year1, month2, year2, units, year_type) =
        if bytes.len() > 3 && bytes[3] == b'/' {
            let field = |range: std::ops::Range<usize>| -> &str {
                line.get(range).unwrap_or("").trim()
            };
            (
                field(0..3),
                field(4..8),
                field(13..18),
                field(19..23),
                field(23..28).to_string(),
                field(28..33).to_string(),
            )
        } else {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 4 {
                return Err(HtsError::InvalidFormat(format!(
                    "header line has {} fields, need at least 4: \"{}\"",
                    tokens.len(),
                    line
                )));
            }
            (
                tokens[0],
                tokens[1],
                tokens[2],
                tokens[3],
                tokens.get(4).copied().unwrap_or("").to_string(),
                tokens.get(5).copied().unwrap_or("").to_string(),
            )
        };
    let parse_num = |text: &str, what: &str| -> Result<i32> {
        text.parse::<i32>().map_err(|_| {
            HtsError::InvalidFormat(format!("bad {} \"{}\" in header \"{}\"", what, text, line))
        })
    };
    Ok(Header {
        month1: parse_num(month1, "start month")? as u8,
        year1: parse_num(year1, "start year")?,
        month2: parse_num(month2, "end month")? as u8,
        year2: parse_num(year2, "end year")?,
        units,
        year_type: YearType::parse(&year_type),
    })
}

/// One parsed data row: the labeled year, optional month (daily files),
/// station id, and the raw value columns.
#[derive(Debug)]
struct DataRow<'a> {
    year: i32,
    month: Option<u8>,
    station: &'a str,
    values: Vec<Option<f64>>,
}

fn parse_row<'a>(line: &'a str, daily: bool, warnings: &mut u32) -> Option<DataRow<'a>> {
    // the column slicing below is byte-indexed
    if !line.is_ascii() {
        log::warn!("skipping non-ASCII data line: \"{}\"", line);
        *warnings += 1;
        return None;
    }
    let min_len = if daily { 21 } else { 17 };
    if line.len() < min_len {
        log::warn!("skipping short data line: \"{}\"", line);
        *warnings += 1;
        return None;
    }
    let year: i32 = match line[0..4].trim().parse() {
        Ok(year) => year,
        Err(_) => {
            log::warn!("skipping data line with bad year: \"{}\"", line);
            *warnings += 1;
            return None;
        }
    };
    let (month, station, value_start) = if daily {
        let month: u8 = match line[4..8].trim().parse() {
            Ok(month) => month,
            Err(_) => {
                log::warn!("skipping daily line with bad month: \"{}\"", line);
                *warnings += 1;
                return None;
            }
        };
        (Some(month), line[9..21].trim(), 21)
    } else {
        (None, line[5..17].trim(), 17)
    };
    let mut values = Vec::new();
    let mut pos = value_start;
    while pos < line.len() {
        let end = (pos + VALUE_WIDTH).min(line.len());
        let cell = line[pos..end].trim();
        if cell.is_empty() {
            values.push(None);
        } else {
            match cell.parse::<f64>() {
                Ok(value) => values.push(Some(value)),
                Err(_) => {
                    log::warn!("bad value \"{}\" in line \"{}\"", cell, line);
                    *warnings += 1;
                    values.push(None);
                }
            }
        }
        pos = end;
    }
    Some(DataRow {
        year,
        month,
        station,
        values,
    })
}

/// Read every time series in the file. See [read_series] for the
/// single-series entry point.
pub fn read_series_list(
    lines: &[&str],
    req_start: Option<&CalTime>,
    req_end: Option<&CalTime>,
    req_units: Option<&str>,
    read_data: bool,
) -> Result<Vec<TimeSeries>> {
    read_inner(None, lines, req_start, req_end, req_units, read_data)
}

/// Read one time series matching the requested identifier. Returns
/// `Ok(None)` when the id is absent from a healthy multi-series file.
/// Raises on empty input or an unparseable header.
pub fn read_series(
    id_text: &str,
    lines: &[&str],
    req_start: Option<&CalTime>,
    req_end: Option<&CalTime>,
    req_units: Option<&str>,
    read_data: bool,
) -> Result<Option<TimeSeries>> {
    let requested = SeriesId::parse(id_text)?;
    let mut found = read_inner(
        Some(&requested),
        lines,
        req_start,
        req_end,
        req_units,
        read_data,
    )?;
    Ok(found.pop())
}

fn read_inner(
    requested: Option<&SeriesId>,
    lines: &[&str],
    req_start: Option<&CalTime>,
    req_end: Option<&CalTime>,
    req_units: Option<&str>,
    read_data: bool,
) -> Result<Vec<TimeSeries>> {
    if lines.is_empty() {
        return Err(HtsError::InvalidFormat("zero-length input".to_string()));
    }

    // HeaderScan: skip comments, take exactly one header line.
    let mut iter = lines.iter().map(|line| *line);
    let header_line = loop {
        match iter.next() {
            Some(line) if line.trim_start().starts_with('#') => continue,
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => break line,
            None => {
                return Err(HtsError::InvalidFormat(
                    "no header line found".to_string(),
                ))
            }
        }
    };
    let header = parse_header(header_line)?;
    let data_lines: Vec<&str> = iter
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .collect();

    let (file_start, file_end) = header.period()?;
    let start = match req_start {
        Some(start) if start.greater_than(&file_start) => {
            log::debug!("clipping period start from {} to {}", file_start, start);
            start.clone()
        }
        _ => file_start.clone(),
    };
    let end = match req_end {
        Some(end) if end.less_than(&file_end) => {
            log::debug!("clipping period end from {} to {}", file_end, end);
            end.clone()
        }
        _ => file_end.clone(),
    };

    // IntervalDecide: line length on the first data line.
    let daily = data_lines
        .first()
        .map(|line| line.len() > DAILY_LINE_THRESHOLD)
        .unwrap_or(false);
    let base = if daily {
        IntervalBase::Day
    } else {
        IntervalBase::Month
    };

    // Single-series heuristic: the same station id on two consecutive
    // lines with differing years means the file holds one series, and a
    // requested id that does not match is tolerated with a warning.
    let mut warnings = 0u32;
    let single_series = match (data_lines.first(), data_lines.get(1)) {
        (Some(first), Some(second)) => {
            match (
                parse_row(first, daily, &mut warnings),
                parse_row(second, daily, &mut warnings),
            ) {
                (Some(a), Some(b)) => {
                    a.station.eq_ignore_ascii_case(b.station) && a.year != b.year
                }
                _ => false,
            }
        }
        (Some(_), None) => true,
        _ => false,
    };
    warnings = 0; // heuristic probe warnings do not count

    // StationDiscovery: the first year block fixes the station order.
    let mut series: Vec<TimeSeries> = Vec::new();
    let mut order: Vec<String> = Vec::new();
    let mut first_block_key: Option<(i32, Option<u8>)> = None;
    let start_month = header.year_type.start_month(header.month1);

    let mut row_index = 0usize;
    for line in &data_lines {
        let row = match parse_row(line, daily, &mut warnings) {
            Some(row) => row,
            None => continue,
        };
        let block_key = (row.year, row.month);
        let station_upper = row.station.to_ascii_uppercase();
        let station_index = match first_block_key {
            None => {
                first_block_key = Some(block_key);
                order.push(station_upper.clone());
                series.push(new_series(
                    &header, row.station, base, &start, &end, req_units, read_data,
                )?);
                0
            }
            Some(key) if key == block_key && !order.contains(&station_upper) => {
                order.push(station_upper.clone());
                series.push(new_series(
                    &header, row.station, base, &start, &end, req_units, read_data,
                )?);
                order.len() - 1
            }
            Some(_) => {
                // DataFill: later blocks reuse the discovered order
                // cyclically.
                let index = row_index % order.len();
                if order[index] != station_upper {
                    log::warn!(
                        "station \"{}\" out of discovered order (expected \"{}\")",
                        row.station,
                        order[index]
                    );
                    warnings += 1;
                }
                index
            }
        };
        row_index = station_index + 1;

        if !read_data {
            continue;
        }
        let ts = &mut series[station_index];
        if !ts.is_allocated() {
            continue;
        }
        fill_row(ts, &row, &header, start_month, &start, &end, daily);
    }

    if warnings > 0 {
        log::warn!("{} data-row warnings while decoding fixed-format input", warnings);
    }
    if series.is_empty() {
        return Err(HtsError::InvalidFormat(
            "no data rows found after header".to_string(),
        ));
    }

    let result = match requested {
        None => series,
        Some(requested) => {
            let loc = requested.location();
            let found = series
                .into_iter()
                .find(|ts| ts.id().location().eq_ignore_ascii_case(&loc));
            match found {
                Some(ts) => vec![ts],
                None if single_series => {
                    // Tolerate-and-relabel: a single-series file is
                    // assumed to be the one the caller asked for.
                    log::warn!(
                        "requested id \"{}\" not found; using the only series in the file",
                        requested
                    );
                    let mut all =
                        read_inner(None, lines, req_start, req_end, req_units, read_data)?;
                    let mut ts = all.remove(0);
                    ts.set_id(requested.clone());
                    vec![ts]
                }
                None => Vec::new(),
            }
        }
    };
    Ok(result)
}

fn new_series(
    header: &Header,
    station: &str,
    base: IntervalBase,
    start: &CalTime,
    end: &CalTime,
    req_units: Option<&str>,
    read_data: bool,
) -> Result<TimeSeries> {
    let mut ts = TimeSeries::new();
    let interval = Interval::new(base, 1);
    let mut id = SeriesId::new();
    id.set_location_full(station, true);
    id.set_interval(&interval.to_string())?;
    ts.set_id(id);
    ts.set_interval(interval);
    ts.set_interval_original(interval);
    ts.set_units(req_units.unwrap_or(&header.units));
    ts.set_units_original(&header.units);
    let (file_start, file_end) = header.period()?;
    ts.set_period_original(file_start, file_end);
    let (mut start, mut end) = (start.clone(), end.clone());
    if base == IntervalBase::Day {
        // month-precision bounds widen to full months for daily storage
        let mut day_end = end.clone().with_precision(hts_core::Precision::Day);
        day_end
            .set_day(hts_core::cal_time::days_in_month(end.year(), end.month()))
            .ok();
        start = start.with_precision(hts_core::Precision::Day);
        end = day_end;
    }
    ts.set_period(start, end);
    if read_data {
        ts.allocate()?;
    }
    Ok(ts)
}

/// Write one row's values into the series, mapping column positions to
/// calendar dates. The labeled year starts at `start_month`; the
/// calendar year advances by one when the mapping wraps past December.
fn fill_row(
    ts: &mut TimeSeries,
    row: &DataRow,
    header: &Header,
    start_month: u8,
    start: &CalTime,
    end: &CalTime,
    daily: bool,
) {
    if daily {
        let month = match row.month {
            Some(month) if (1..=12).contains(&month) => month,
            _ => return,
        };
        // daily rows are labeled with the year-type year; months before
        // the start month belong to the next calendar year
        let year = if month < start_month && header.year_type != YearType::Calendar {
            row.year + 1
        } else {
            row.year
        };
        let dim = hts_core::cal_time::days_in_month(year, month);
        for (offset, value) in row.values.iter().enumerate() {
            let day = offset as u8 + 1;
            if day > dim {
                break;
            }
            let value = match value {
                Some(value) => *value,
                None => continue,
            };
            let at = match CalTime::from_ymd(year, month, day) {
                Ok(at) => at,
                Err(_) => continue,
            };
            if at.less_than(start) || at.greater_than(end) {
                continue;
            }
            ts.set_value(&at, value);
        }
    } else {
        for (offset, value) in row.values.iter().enumerate().take(12) {
            let value = match value {
                Some(value) => *value,
                None => continue,
            };
            let month0 = (start_month as usize - 1 + offset) % 12;
            let wrapped = (start_month as usize - 1 + offset) >= 12;
            let year = row.year + if wrapped { 1 } else { 0 };
            let at = match CalTime::from_ym(year, month0 as u8 + 1) {
                Ok(at) => at,
                Err(_) => continue,
            };
            if at.less_than(start) || at.greater_than(end) {
                continue;
            }
            ts.set_value(&at, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_header, read_series, read_series_list, YearType};
    use hts_core::cal_time::CalTime;
    use hts_core::interval::IntervalBase;

    /// Two stations, water years 1995-1997, 12 monthly values per row.
    fn water_year_fixture() -> Vec<String> {
        let mut lines = vec![
            "# synthetic monthly data".to_string(),
            "1  1995 12  1997     CFS WYR".to_string(),
        ];
        for (block, year) in [1995, 1996, 1997].iter().enumerate() {
            for (s, station) in ["STA1", "STA2"].iter().enumerate() {
                let mut line = format!("{:>4} {:<12}", year, station);
                for m in 0..12 {
                    let value = (block * 100 + s * 1000 + m) as f64;
                    line.push_str(&format!("{:>8.1}", value));
                }
                lines.push(line);
            }
        }
        lines
    }

    #[test]
    fn test_header_fallback_layout() {
        let header = parse_header("1  1995 12  1997     CFS WYR").unwrap();
        assert_eq!(header.month1, 1);
        assert_eq!(header.year1, 1995);
        assert_eq!(header.month2, 12);
        assert_eq!(header.year2, 1997);
        assert_eq!(header.units, "CFS");
        assert_eq!(header.year_type, YearType::Water);
    }

    #[test]
    fn test_header_slash_layout() {
        let header = parse_header("  1/1995  -     12/1997 CFS  WYR ").unwrap();
        assert_eq!(header.month1, 1);
        assert_eq!(header.year1, 1995);
        assert_eq!(header.month2, 12);
        assert_eq!(header.year2, 1997);
        assert_eq!(header.year_type, YearType::Water);
    }

    #[test]
    fn test_two_station_water_year_read() {
        let lines = water_year_fixture();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let list = read_series_list(&refs, None, None, None, true).unwrap();
        assert_eq!(list.len(), 2);

        let sta1 = &list[0];
        assert_eq!(sta1.id().location(), "STA1");
        assert_eq!(sta1.interval().base, IntervalBase::Month);
        // water year 1995 runs October 1995 through September 1996
        assert_eq!(sta1.start().unwrap(), &CalTime::parse("1995-10").unwrap());
        assert_eq!(sta1.end().unwrap(), &CalTime::parse("1998-09").unwrap());
        // first value of the 1995 row lands on October 1995
        assert_eq!(sta1.value_at(&CalTime::parse("1995-10").unwrap()), 0.0);
        // the October shift: column 4 of the 1995 row is January 1996
        assert_eq!(sta1.value_at(&CalTime::parse("1996-01").unwrap()), 3.0);
        // last value of the 1995 row is September 1996... overwritten by
        // nothing: the 1996 row starts at October 1996
        assert_eq!(sta1.value_at(&CalTime::parse("1996-09").unwrap()), 11.0);
        assert_eq!(sta1.value_at(&CalTime::parse("1996-10").unwrap()), 100.0);

        let sta2 = &list[1];
        assert_eq!(sta2.id().location(), "STA2");
        assert_eq!(sta2.value_at(&CalTime::parse("1995-10").unwrap()), 1000.0);
        assert_eq!(sta2.units(), "CFS");
    }

    #[test]
    fn test_requested_id_selects_station() {
        let lines = water_year_fixture();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let ts = read_series("STA2..Flow.Month", &refs, None, None, None, true)
            .unwrap()
            .unwrap();
        assert_eq!(ts.id().location(), "STA2");
    }

    #[test]
    fn test_unmatched_id_returns_none() {
        let lines = water_year_fixture();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let result = read_series("NOPE..Flow.Month", &refs, None, None, None, true).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_empty_input_is_fatal() {
        assert!(read_series_list(&[], None, None, None, true).is_err());
    }

    #[test]
    fn test_missing_header_is_fatal() {
        let lines = ["# only comments", "# nothing else"];
        assert!(read_series_list(&lines, None, None, None, true).is_err());
    }

    #[test]
    fn test_calendar_year_mapping() {
        let lines = [
            "1  1995 12  1995     AF  CYR",
            "1995 ONLY            10.0    20.0    30.0    40.0    50.0    60.0    70.0    80.0    90.0   100.0   110.0   120.0",
        ];
        let list = read_series_list(&lines, None, None, None, true).unwrap();
        assert_eq!(list.len(), 1);
        let ts = &list[0];
        assert_eq!(ts.start().unwrap(), &CalTime::parse("1995-01").unwrap());
        assert_eq!(ts.value_at(&CalTime::parse("1995-01").unwrap()), 10.0);
        assert_eq!(ts.value_at(&CalTime::parse("1995-12").unwrap()), 120.0);
    }

    #[test]
    fn test_multibyte_data_line_skipped() {
        let lines = [
            "1  1995 12  1996     AF  CYR",
            "1995 ONLY            10.0    20.0    30.0    40.0    50.0    60.0    70.0    80.0    90.0   100.0   110.0   120.0",
            "1996 ONLÄ            11.0    21.0    31.0    41.0    51.0    61.0    71.0    81.0    91.0   101.0   111.0   121.0",
        ];
        let list = read_series_list(&lines, None, None, None, true).unwrap();
        assert_eq!(list.len(), 1);
        let ts = &list[0];
        assert_eq!(ts.value_at(&CalTime::parse("1995-01").unwrap()), 10.0);
        assert!(ts.is_missing(ts.value_at(&CalTime::parse("1996-01").unwrap())));
    }

    #[test]
    fn test_single_series_relabel_heuristic() {
        // one station across two years: requested id that matches
        // nothing is tolerated and relabeled, with a warning
        let lines = [
            "1  1995 12  1996     AF  CYR",
            "1995 ONLY            10.0    20.0    30.0    40.0    50.0    60.0    70.0    80.0    90.0   100.0   110.0   120.0",
            "1996 ONLY            11.0    21.0    31.0    41.0    51.0    61.0    71.0    81.0    91.0   101.0   111.0   121.0",
        ];
        let ts = read_series("OTHER..Flow.Month", &lines, None, None, None, true)
            .unwrap()
            .unwrap();
        assert_eq!(ts.id().location(), "OTHER");
        assert_eq!(ts.value_at(&CalTime::parse("1996-01").unwrap()), 11.0);
    }

    #[test]
    fn test_requested_period_clips() {
        let lines = water_year_fixture();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let start = CalTime::parse("1996-01").unwrap();
        let end = CalTime::parse("1996-12").unwrap();
        let list = read_series_list(&refs, Some(&start), Some(&end), None, true).unwrap();
        let ts = &list[0];
        assert_eq!(ts.cell_count(), 12);
        assert_eq!(ts.start().unwrap(), &start);
        // original period still records the file bounds
        assert_eq!(
            ts.start_original().unwrap(),
            &CalTime::parse("1995-10").unwrap()
        );
    }

    #[test]
    fn test_daily_read() {
        let mut lines = vec!["1  1995 12  1995     AF  CYR".to_string()];
        // one station, two daily rows (Jan and Feb 1995)
        for month in [1u8, 2u8] {
            let dim = hts_core::cal_time::days_in_month(1995, month) as usize;
            let mut line = format!("{:>4}{:>4} {:<12}", 1995, month, "STA1");
            for day in 0..31 {
                if day < dim {
                    line.push_str(&format!("{:>8.1}", (month as usize * 100 + day) as f64));
                } else {
                    line.push_str(&format!("{:>8}", ""));
                }
            }
            lines.push(line);
        }
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let list = read_series_list(&refs, None, None, None, true).unwrap();
        assert_eq!(list.len(), 1);
        let ts = &list[0];
        assert_eq!(ts.interval().base, IntervalBase::Day);
        assert_eq!(ts.value_at(&CalTime::parse("1995-01-01").unwrap()), 100.0);
        assert_eq!(ts.value_at(&CalTime::parse("1995-02-28").unwrap()), 227.0);
    }
}
