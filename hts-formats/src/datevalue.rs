//! Decoder for the property-header/delimited time-series format.
//!
//! Files open with `#` comments (one of which may carry a
//! `# DateValueTS <version>` tag), followed by `Name = value` header
//! lines describing one or more series, then one data row per
//! timestamp. List-valued header properties hold one entry per
//! declared series, split by the active delimiter. Each data row holds
//! a date (optionally a separate time column), one value per series,
//! a flag column after each flagged series, and optional trailing
//! count/total-time columns.

use hts_core::cal_time::CalTime;
use hts_core::error::{HtsError, Result};
use hts_core::series_id::SeriesId;
use hts_core::time_series::{TimeSeries, DEFAULT_MISSING};

/// Version tag looked for in comment lines.
const FORMAT_TAG: &str = "DateValueTS";

/// File versions older than this collapse blank entries when splitting
/// delimited lists and rows.
const LEGACY_VERSION: f64 = 1.4;

#[derive(Debug)]
struct Header {
    version: f64,
    delimiter: u8,
    num_ts: usize,
    tsids: Vec<String>,
    aliases: Vec<String>,
    data_types: Vec<String>,
    descriptions: Vec<String>,
    units: Vec<String>,
    missing: Vec<String>,
    sequence_ids: Vec<String>,
    data_flags: Vec<bool>,
    include_count: bool,
    include_total_time: bool,
    start: Option<CalTime>,
    end: Option<CalTime>,
    properties: Vec<Vec<(String, String)>>,
    flag_descriptions: Vec<Vec<(String, String)>>,
    warnings: u32,
}

impl Header {
    fn new() -> Header {
        Header {
            version: 1.6,
            delimiter: b' ',
            num_ts: 1,
            tsids: Vec::new(),
            aliases: Vec::new(),
            data_types: Vec::new(),
            descriptions: Vec::new(),
            units: Vec::new(),
            missing: Vec::new(),
            sequence_ids: Vec::new(),
            data_flags: Vec::new(),
            include_count: false,
            include_total_time: false,
            start: None,
            end: None,
            properties: Vec::new(),
            flag_descriptions: Vec::new(),
            warnings: 0,
        }
    }

    fn legacy(&self) -> bool {
        self.version < LEGACY_VERSION
    }

    /// Count of flag columns in each data row.
    fn flagged_count(&self) -> usize {
        self.data_flags.iter().filter(|flagged| **flagged).count()
    }
}

/// Strip one matching pair of double quotes from a scalar value.
fn unquote(text: &str) -> &str {
    let text = text.trim();
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Split one line into fields with the active delimiter, honoring
/// double-quoted fields. Runs of spaces collapse for the space
/// delimiter (unless the line is quoted), and blank fields drop in
/// legacy mode.
fn split_fields(line: &str, delimiter: u8, legacy: bool) -> Result<Vec<String>> {
    let collapsed;
    let line = if delimiter == b' ' && !line.contains('"') {
        collapsed = line.split_whitespace().collect::<Vec<&str>>().join(" ");
        collapsed.as_str()
    } else {
        line
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let record = match reader.records().next() {
        Some(record) => record.map_err(|err| HtsError::CsvParse(err.to_string()))?,
        None => return Ok(Vec::new()),
    };
    let fields = record
        .iter()
        .map(|field| field.trim().to_string())
        .filter(|field| !legacy || !field.is_empty())
        .collect();
    Ok(fields)
}

/// Parse a `{key=value,key=value}` property block.
fn parse_property_block(value: &str) -> Vec<(String, String)> {
    let inner = value
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}');
    inner
        .split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value).to_string()))
        })
        .collect()
}

/// Pick the file version out of a `# DateValueTS <n>` comment.
fn parse_version(comment: &str) -> Option<f64> {
    let mut tokens = comment.trim_start_matches('#').split_whitespace();
    while let Some(token) = tokens.next() {
        if token == FORMAT_TAG {
            return tokens.next().and_then(|version| version.parse().ok());
        }
    }
    None
}

fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// One-based series index in a `Properties_n` style header name.
fn parse_series_index(text: &str, name: &str) -> Result<usize> {
    match text.parse::<usize>() {
        Ok(index) if index >= 1 => Ok(index),
        _ => Err(HtsError::InvalidFormat(format!(
            "bad property name \"{}\"",
            name
        ))),
    }
}

/// Pad or truncate a per-series list to the declared series count,
/// counting a warning when the length disagrees.
fn fix_list(
    list: &mut Vec<String>,
    num_ts: usize,
    default: &str,
    name: &str,
    warnings: &mut u32,
) {
    if !list.is_empty() && list.len() != num_ts {
        log::warn!(
            "{} lists {} entries for {} declared series",
            name,
            list.len(),
            num_ts
        );
        *warnings += 1;
    }
    list.resize(num_ts, default.to_string());
}

/// Apply one `Name = value` header assignment.
fn apply_property(header: &mut Header, name: &str, value: &str) -> Result<()> {
    let upper = name.to_ascii_uppercase();
    let delimiter = header.delimiter;
    let legacy = header.legacy();
    match upper.as_str() {
        "DELIMITER" => {
            let text = unquote(value);
            if text.is_empty() {
                log::warn!("empty Delimiter value; keeping \"{}\"", delimiter as char);
                header.warnings += 1;
            } else {
                if text.len() > 1 {
                    log::warn!(
                        "multi-character Delimiter \"{}\"; using the first character",
                        text
                    );
                }
                header.delimiter = text.as_bytes()[0];
            }
        }
        "NUMTS" => {
            header.num_ts = value.trim().parse().map_err(|_| {
                HtsError::InvalidFormat(format!("bad NumTS value \"{}\"", value.trim()))
            })?;
        }
        "TSID" => header.tsids = split_fields(value, delimiter, legacy)?,
        "ALIAS" => header.aliases = split_fields(value, delimiter, legacy)?,
        "DATATYPE" => header.data_types = split_fields(value, delimiter, legacy)?,
        "DESCRIPTION" => header.descriptions = split_fields(value, delimiter, legacy)?,
        "UNITS" => header.units = split_fields(value, delimiter, legacy)?,
        "MISSINGVAL" => header.missing = split_fields(value, delimiter, legacy)?,
        "SEQUENCEID" | "SEQUENCENUM" => {
            header.sequence_ids = split_fields(value, delimiter, legacy)?
        }
        "DATAFLAGS" => {
            header.data_flags = split_fields(value, delimiter, legacy)?
                .iter()
                .map(|field| parse_bool(field))
                .collect();
        }
        "INCLUDECOUNT" => header.include_count = parse_bool(value),
        "INCLUDETOTALTIME" => header.include_total_time = parse_bool(value),
        "START" => header.start = Some(CalTime::parse(unquote(value))?),
        "END" => header.end = Some(CalTime::parse(unquote(value))?),
        _ => {
            if let Some(index) = upper.strip_prefix("PROPERTIES_") {
                let index = parse_series_index(index, name)?;
                if header.properties.len() < index {
                    header.properties.resize(index, Vec::new());
                }
                header.properties[index - 1] = parse_property_block(value);
            } else if let Some(index) = upper.strip_prefix("DATAFLAGDESCRIPTIONS_") {
                let index = parse_series_index(index, name)?;
                if header.flag_descriptions.len() < index {
                    header.flag_descriptions.resize(index, Vec::new());
                }
                header.flag_descriptions[index - 1] = parse_property_block(value);
            } else {
                // tolerated so newer writers stay readable
                log::debug!("ignoring unrecognized header property \"{}\"", name);
            }
        }
    }
    Ok(())
}

/// True when the line is a `Name = value` header assignment.
fn is_assignment(line: &str) -> bool {
    match line.split_once('=') {
        Some((name, _)) => {
            let name = name.trim();
            !name.is_empty()
                && name
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        None => false,
    }
}

/// Read series from a property-header file. A requested identifier is
/// matched against each series' alias (case-insensitive) and then its
/// full identifier; no match raises [HtsError::SeriesNotFound]. With no
/// requested identifier every declared series is returned.
pub fn read_series(
    id_or_alias: Option<&str>,
    lines: &[&str],
    req_start: Option<&CalTime>,
    req_end: Option<&CalTime>,
    req_units: Option<&str>,
    read_data: bool,
) -> Result<Vec<TimeSeries>> {
    if lines.is_empty() {
        return Err(HtsError::InvalidFormat("zero-length input".to_string()));
    }

    // Header phase: comments and assignments until the first blank or
    // non-assignment line.
    let mut header = Header::new();
    let mut data_from = lines.len();
    for (index, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.starts_with('#') {
            if let Some(version) = parse_version(line) {
                header.version = version;
            }
            continue;
        }
        if line.is_empty() {
            data_from = index + 1;
            break;
        }
        if !is_assignment(line) {
            data_from = index;
            break;
        }
        let (name, value) = line.split_once('=').unwrap_or((line, ""));
        apply_property(&mut header, name.trim(), value.trim())?;
    }

    if header.tsids.is_empty() {
        return Err(HtsError::InvalidFormat(
            "no TSID property in header".to_string(),
        ));
    }
    let num_ts = header.num_ts;
    let mut warnings = header.warnings;
    fix_list(&mut header.tsids, num_ts, "", "TSID", &mut warnings);
    fix_list(&mut header.aliases, num_ts, "", "Alias", &mut warnings);
    fix_list(&mut header.data_types, num_ts, "", "DataType", &mut warnings);
    fix_list(
        &mut header.descriptions,
        num_ts,
        "",
        "Description",
        &mut warnings,
    );
    fix_list(&mut header.units, num_ts, "", "Units", &mut warnings);
    fix_list(&mut header.missing, num_ts, "-999", "MissingVal", &mut warnings);
    fix_list(
        &mut header.sequence_ids,
        num_ts,
        "",
        "SequenceID",
        &mut warnings,
    );
    if !header.data_flags.is_empty() && header.data_flags.len() != num_ts {
        log::warn!(
            "DataFlags lists {} entries for {} declared series",
            header.data_flags.len(),
            num_ts
        );
        warnings += 1;
    }
    header.data_flags.resize(num_ts, false);
    header.properties.resize(num_ts, Vec::new());
    header.flag_descriptions.resize(num_ts, Vec::new());

    if read_data && warnings > 0 {
        return Err(HtsError::InvalidFormat(format!(
            "{} header warning(s); not reading data",
            warnings
        )));
    }

    // Clip the declared period to the requested bounds.
    let period = match (&header.start, &header.end) {
        (Some(file_start), Some(file_end)) => {
            let start = match req_start {
                Some(start) if start.greater_than(file_start) => {
                    log::debug!("clipping period start from {} to {}", file_start, start);
                    start.clone()
                }
                _ => file_start.clone(),
            };
            let end = match req_end {
                Some(end) if end.less_than(file_end) => {
                    log::debug!("clipping period end from {} to {}", file_end, end);
                    end.clone()
                }
                _ => file_end.clone(),
            };
            Some((start, end))
        }
        _ => {
            if read_data {
                return Err(HtsError::InvalidFormat(
                    "missing Start/End in header".to_string(),
                ));
            }
            None
        }
    };

    let mut series = Vec::with_capacity(num_ts);
    for position in 0..num_ts {
        series.push(new_series(&header, position, period.as_ref(), req_units, read_data)?);
    }

    // Resolve a requested identifier: alias first, then full id.
    let selected = match id_or_alias {
        None => None,
        Some(requested) => {
            let by_alias = series
                .iter()
                .position(|ts| ts.alias().eq_ignore_ascii_case(requested));
            let position = match by_alias {
                Some(position) => position,
                None => {
                    let requested_id = SeriesId::parse(requested)?;
                    series
                        .iter()
                        .position(|ts| ts.id().matches(&requested_id))
                        .ok_or_else(|| HtsError::SeriesNotFound(requested.to_string()))?
                }
            };
            Some(position)
        }
    };

    if read_data {
        if let Some((start, end)) = period.as_ref() {
            fill_data(
                &mut series,
                &header,
                &lines[data_from.min(lines.len())..],
                start,
                end,
                selected,
            )?;
        }
    }

    Ok(match selected {
        Some(position) => vec![series.swap_remove(position)],
        None => series,
    })
}

fn new_series(
    header: &Header,
    position: usize,
    period: Option<&(CalTime, CalTime)>,
    req_units: Option<&str>,
    read_data: bool,
) -> Result<TimeSeries> {
    let mut ts = TimeSeries::new();
    let tsid = &header.tsids[position];
    let mut id = if tsid.is_empty() {
        // padded placeholder from a short TSID list
        SeriesId::new()
    } else {
        SeriesId::parse(tsid)?
    };
    let data_type = &header.data_types[position];
    if id.data_type().is_empty() && !data_type.is_empty() {
        id.set_data_type_full(data_type, false);
    }
    match id.interval() {
        Some(interval) => {
            ts.set_interval(interval);
            ts.set_interval_original(interval);
        }
        None if read_data => {
            return Err(HtsError::IntervalParse(format!(
                "no interval in identifier \"{}\"",
                tsid
            )))
        }
        None => {}
    }
    ts.set_id(id);
    ts.set_alias(&header.aliases[position]);
    ts.set_description(&header.descriptions[position]);
    let units = &header.units[position];
    ts.set_units(req_units.unwrap_or(units));
    ts.set_units_original(units);
    let missing_text = &header.missing[position];
    if missing_text.eq_ignore_ascii_case("nan") {
        ts.set_missing(f64::NAN);
    } else {
        ts.set_missing(missing_text.parse().unwrap_or(DEFAULT_MISSING));
    }
    let sequence_id = &header.sequence_ids[position];
    if !sequence_id.is_empty() {
        ts.id_mut().set_sequence_id(sequence_id);
    }
    for (key, value) in &header.properties[position] {
        ts.set_property(key, value);
    }
    for (flag, description) in &header.flag_descriptions[position] {
        ts.add_flag_meta(flag, description);
    }
    if let (Some(file_start), Some(file_end)) = (&header.start, &header.end) {
        ts.set_period_original(file_start.clone(), file_end.clone());
    }
    if let Some((start, end)) = period {
        ts.set_period(start.clone(), end.clone());
    }
    if read_data {
        ts.allocate()?;
    }
    Ok(ts)
}

/// Distribute data rows across the series. Rows dated before `start`
/// skip; the first row dated after `end` stops the read. Malformed
/// rows count a warning and skip; the count reports once at the end.
fn fill_data(
    series: &mut [TimeSeries],
    header: &Header,
    lines: &[&str],
    start: &CalTime,
    end: &CalTime,
    selected: Option<usize>,
) -> Result<()> {
    let mut warnings = 0u32;
    let mut time_split: Option<bool> = None;
    for raw in lines {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // column-header line some writers emit before the data
        if line
            .get(..4)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("date"))
        {
            continue;
        }
        let fields = split_fields(line, header.delimiter, header.legacy())?;
        if fields.is_empty() {
            continue;
        }
        let split = *time_split.get_or_insert_with(|| {
            fields.len() > 1 && !fields[0].contains(':') && fields[1].contains(':')
        });
        let date_cols = if split { 2 } else { 1 };
        let expected = date_cols
            + header.num_ts
            + header.flagged_count()
            + header.include_count as usize
            + header.include_total_time as usize;
        if fields.len() != expected {
            log::warn!(
                "row has {} columns, expected {}: \"{}\"",
                fields.len(),
                expected,
                line
            );
            warnings += 1;
            continue;
        }
        let date_text = if split {
            format!("{} {}", fields[0], fields[1])
        } else {
            fields[0].clone()
        };
        let at = match CalTime::parse(&date_text) {
            Ok(at) => at,
            Err(_) => {
                log::warn!("unparseable date \"{}\"", date_text);
                warnings += 1;
                continue;
            }
        };
        if at.less_than(start) {
            continue;
        }
        if at.greater_than(end) {
            break;
        }
        let mut cursor = date_cols;
        for (position, ts) in series.iter_mut().enumerate() {
            let value_text = &fields[cursor];
            cursor += 1;
            let flag = if header.data_flags[position] {
                let flag = &fields[cursor];
                cursor += 1;
                flag.as_str()
            } else {
                ""
            };
            if let Some(wanted) = selected {
                if wanted != position {
                    continue;
                }
            }
            let value = if value_text.eq_ignore_ascii_case("nan") {
                f64::NAN
            } else {
                match value_text.parse() {
                    Ok(value) => value,
                    Err(_) => {
                        log::warn!("bad value \"{}\" at {}", value_text, at);
                        warnings += 1;
                        ts.missing()
                    }
                }
            };
            if flag.is_empty() {
                ts.set_value(&at, value);
            } else {
                ts.set_value_with_flag(&at, value, flag);
            }
        }
    }
    if warnings > 0 {
        log::warn!(
            "{} data-row warnings while decoding delimited input",
            warnings
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hts_core::interval::IntervalBase;

    const SINGLE: &str = "\
#
# DateValueTS 1.6 file
#
NumTS = 1
TSID = ABC.XYZ.Flow.Month
Description = \"Example flow\"
Units = CFS
MissingVal = -999
Start = 1995-01
End = 1995-03
1995-01 1.0
1995-02 2.0
1995-03 3.0
";

    const PAIR: &str = "\
# DateValueTS 1.6 file
Delimiter = \",\"
NumTS = 2
TSID = A.S.Flow.Month,B.S.Flow.Month
Alias = first,second
DataFlags = true,false
Units = CFS,CFS
MissingVal = -999,-999
Start = 2000-01
End = 2000-03
2000-01,1.0,g,10.0
2000-02,2.0,,20.0
2000-03,NaN,e,30.0
";

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_single_series_requested() {
        let lines = lines(SINGLE);
        let result = read_series(
            Some("ABC.XYZ.Flow.Month"),
            &lines,
            None,
            None,
            None,
            true,
        )
        .unwrap();
        assert_eq!(result.len(), 1);
        let ts = &result[0];
        assert_eq!(ts.id().location(), "ABC");
        assert_eq!(ts.units(), "CFS");
        assert_eq!(ts.interval().base, IntervalBase::Month);
        assert_eq!(ts.cell_count(), 3);
        let jan = CalTime::from_ym(1995, 1).unwrap();
        let feb = CalTime::from_ym(1995, 2).unwrap();
        let mar = CalTime::from_ym(1995, 3).unwrap();
        assert_eq!(ts.value_at(&jan), 1.0);
        assert_eq!(ts.value_at(&feb), 2.0);
        assert_eq!(ts.value_at(&mar), 3.0);
        assert!(!ts.has_flags());
    }

    #[test]
    fn test_full_read_with_flags() {
        let lines = lines(PAIR);
        let result = read_series(None, &lines, None, None, None, true).unwrap();
        assert_eq!(result.len(), 2);
        let a = &result[0];
        let b = &result[1];
        let jan = CalTime::from_ym(2000, 1).unwrap();
        let feb = CalTime::from_ym(2000, 2).unwrap();
        let mar = CalTime::from_ym(2000, 3).unwrap();
        assert_eq!(a.value_at(&jan), 1.0);
        assert_eq!(a.flag_at(&jan), "g");
        assert_eq!(a.flag_at(&feb), "");
        assert!(a.is_missing(a.value_at(&mar)));
        assert_eq!(a.flag_at(&mar), "e");
        assert!(!b.has_flags());
        assert_eq!(b.value_at(&jan), 10.0);
        assert_eq!(b.value_at(&mar), 30.0);
    }

    #[test]
    fn test_alias_request() {
        let lines = lines(PAIR);
        let result = read_series(Some("second"), &lines, None, None, None, true).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id().location(), "B");
        let feb = CalTime::from_ym(2000, 2).unwrap();
        assert_eq!(result[0].value_at(&feb), 20.0);
    }

    #[test]
    fn test_unmatched_id_raises() {
        let lines = lines(PAIR);
        let err = read_series(Some("Z.S.Flow.Month"), &lines, None, None, None, true)
            .unwrap_err();
        assert!(matches!(err, HtsError::SeriesNotFound(_)));
    }

    #[test]
    fn test_header_warning_aborts_data_read() {
        let text = "\
NumTS = 2
TSID = A.S.Flow.Month,B.S.Flow.Month
Units = CFS
Start = 2000-01
End = 2000-02
2000-01 1.0 10.0
";
        let lines: Vec<&str> = text.lines().collect();
        let err = read_series(None, &lines, None, None, None, true).unwrap_err();
        assert!(matches!(err, HtsError::InvalidFormat(_)));
        // metadata-only reads tolerate the same header, padding the
        // short list with defaults
        let result = read_series(None, &lines, None, None, None, false).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].units(), "CFS");
        assert_eq!(result[1].units(), "");
    }

    #[test]
    fn test_requested_period_clips_rows() {
        let lines = lines(SINGLE);
        let start = CalTime::from_ym(1995, 2).unwrap();
        let result = read_series(None, &lines, Some(&start), None, None, true).unwrap();
        let ts = &result[0];
        assert_eq!(ts.cell_count(), 2);
        assert_eq!(ts.start().unwrap().month(), 2);
        assert_eq!(ts.start_original().unwrap().month(), 1);
        let feb = CalTime::from_ym(1995, 2).unwrap();
        assert_eq!(ts.value_at(&feb), 2.0);
    }

    #[test]
    fn test_legacy_version_collapses_blanks() {
        let text = "\
# DateValueTS 1.2 file
NumTS = 1
TSID = ABC.XYZ.Flow.Month
Start = 1995-01
End = 1995-02
1995-01   1.0
1995-02  2.0
";
        let lines: Vec<&str> = text.lines().collect();
        let result = read_series(None, &lines, None, None, None, true).unwrap();
        let jan = CalTime::from_ym(1995, 1).unwrap();
        let feb = CalTime::from_ym(1995, 2).unwrap();
        assert_eq!(result[0].value_at(&jan), 1.0);
        assert_eq!(result[0].value_at(&feb), 2.0);
    }

    #[test]
    fn test_malformed_rows_skip_without_failing() {
        let text = "\
NumTS = 1
TSID = ABC.XYZ.Flow.Month
Start = 1995-01
End = 1995-03
1995-01 1.0
garbage
1995-03 3.0
";
        let lines: Vec<&str> = text.lines().collect();
        let result = read_series(None, &lines, None, None, None, true).unwrap();
        let ts = &result[0];
        let jan = CalTime::from_ym(1995, 1).unwrap();
        let feb = CalTime::from_ym(1995, 2).unwrap();
        let mar = CalTime::from_ym(1995, 3).unwrap();
        assert_eq!(ts.value_at(&jan), 1.0);
        assert!(ts.is_missing(ts.value_at(&feb)));
        assert_eq!(ts.value_at(&mar), 3.0);
    }

    #[test]
    fn test_properties_and_flag_descriptions() {
        let text = "\
NumTS = 1
TSID = ABC.XYZ.Flow.Month
DataFlags = true
Properties_1 = {source=gauge,checked=yes}
DataFlagDescriptions_1 = {g=good,e=estimated}
Start = 1995-01
End = 1995-01
1995-01 1.0 g
";
        let lines: Vec<&str> = text.lines().collect();
        let result = read_series(None, &lines, None, None, None, true).unwrap();
        let ts = &result[0];
        assert_eq!(ts.property("source"), Some("gauge"));
        assert_eq!(ts.property("checked"), Some("yes"));
        assert_eq!(ts.flag_meta().len(), 2);
        assert_eq!(ts.flag_meta()[1].flag, "e");
        let jan = CalTime::from_ym(1995, 1).unwrap();
        assert_eq!(ts.flag_at(&jan), "g");
    }

    #[test]
    fn test_sequence_and_datatype_fill_identifier() {
        let text = "\
NumTS = 1
TSID = ABC.XYZ..Month
DataType = Flow
SequenceID = 1950
Start = 1995-01
End = 1995-01
1995-01 1.0
";
        let lines: Vec<&str> = text.lines().collect();
        let result = read_series(None, &lines, None, None, None, true).unwrap();
        let id = result[0].id();
        assert_eq!(id.data_type(), "Flow");
        assert_eq!(id.sequence_id(), "1950");
    }

    #[test]
    fn test_missing_tsid_is_fatal() {
        let text = "\
NumTS = 1
Units = CFS
Start = 1995-01
End = 1995-01
1995-01 1.0
";
        let lines: Vec<&str> = text.lines().collect();
        let err = read_series(None, &lines, None, None, None, true).unwrap_err();
        assert!(matches!(err, HtsError::InvalidFormat(_)));
    }

    #[test]
    fn test_count_and_total_time_columns_ignored() {
        let text = "\
# DateValueTS 1.6 file
NumTS = 1
TSID = ABC.XYZ.Flow.Month
Units = CFS
IncludeCount = true
IncludeTotalTime = true
Start = 1995-01
End = 1995-02
1995-01 4.0 3 720
1995-02 5.0 2 672
";
        let lines: Vec<&str> = text.lines().collect();
        let result = read_series(None, &lines, None, None, None, true).unwrap();
        let ts = &result[0];
        let jan = CalTime::from_ym(1995, 1).unwrap();
        let feb = CalTime::from_ym(1995, 2).unwrap();
        assert_eq!(ts.value_at(&jan), 4.0);
        assert_eq!(ts.value_at(&feb), 5.0);
    }

    #[test]
    fn test_separate_time_column() {
        let text = "\
# DateValueTS 1.6 file
NumTS = 1
TSID = ABC.XYZ.Stage.Day
Units = FT
Start = 1995-01-01
End = 1995-01-03
1995-01-01 00:00 1.5
1995-01-02 00:00 2.5
1995-01-03 00:00 3.5
";
        let lines: Vec<&str> = text.lines().collect();
        let result = read_series(None, &lines, None, None, None, true).unwrap();
        let ts = &result[0];
        assert_eq!(ts.cell_count(), 3);
        assert_eq!(ts.value_at(&CalTime::from_ymd(1995, 1, 1).unwrap()), 1.5);
        assert_eq!(ts.value_at(&CalTime::from_ymd(1995, 1, 2).unwrap()), 2.5);
        assert_eq!(ts.value_at(&CalTime::from_ymd(1995, 1, 3).unwrap()), 3.5);
    }

    #[test]
    fn test_multibyte_date_row_skipped() {
        let text = "\
NumTS = 1
TSID = ABC.XYZ.Stage.Day
Start = 1995-01-01
End = 1995-01-02
1995-01-01 12:00 1.5
1995-01-02 12:30:45ä. 2.5
";
        let lines: Vec<&str> = text.lines().collect();
        let result = read_series(None, &lines, None, None, None, true).unwrap();
        let ts = &result[0];
        let day1 = CalTime::from_ymd(1995, 1, 1).unwrap();
        let day2 = CalTime::from_ymd(1995, 1, 2).unwrap();
        assert_eq!(ts.value_at(&day1), 1.5);
        assert!(ts.is_missing(ts.value_at(&day2)));
    }

    #[test]
    fn test_missing_val_nan() {
        let text = "\
NumTS = 1
TSID = ABC.XYZ.Flow.Month
MissingVal = NaN
Start = 1995-01
End = 1995-02
1995-01 NaN
1995-02 2.0
";
        let lines: Vec<&str> = text.lines().collect();
        let result = read_series(None, &lines, None, None, None, true).unwrap();
        let ts = &result[0];
        let jan = CalTime::from_ym(1995, 1).unwrap();
        assert!(ts.value_at(&jan).is_nan());
        assert!(ts.is_missing(ts.value_at(&jan)));
    }
}
