//! Shared decoding helper: reads a file, detects its format, and
//! returns the decoded series.

use hts_core::cal_time::CalTime;
use hts_core::time_series::TimeSeries;

pub fn decode_file(
    path: &str,
    id: Option<&str>,
    start: Option<&CalTime>,
    end: Option<&CalTime>,
    read_data: bool,
) -> anyhow::Result<Vec<TimeSeries>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("cannot read {}: {}", path, err))?;
    let lines: Vec<&str> = contents.lines().collect();
    let series = if hts_formats::is_property_header(&lines) {
        hts_formats::datevalue::read_series(id, &lines, start, end, None, read_data)?
    } else {
        match id {
            Some(id) => hts_formats::fixed::read_series(id, &lines, start, end, None, read_data)?
                .map(|ts| vec![ts])
                .ok_or_else(|| anyhow::anyhow!("series \"{}\" not found in {}", id, path))?,
            None => hts_formats::fixed::read_series_list(&lines, start, end, None, read_data)?,
        }
    };
    Ok(series)
}
