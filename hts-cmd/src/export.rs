//! CSV export command.

use hts_core::cal_time::CalTime;
use log::info;

/// Decode a file and write its non-missing values to a CSV with
/// `date,id,value,flag` columns.
pub fn run_export(
    file: &str,
    output: &str,
    id: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> anyhow::Result<()> {
    let start = start.map(CalTime::parse).transpose()?;
    let end = end.map(CalTime::parse).transpose()?;
    let series = crate::decode::decode_file(file, id, start.as_ref(), end.as_ref(), true)?;

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(["date", "id", "value", "flag"])?;
    let mut rows = 0usize;
    for ts in &series {
        let id_text = ts.id().to_full_string();
        for (at, value) in ts.iter_values() {
            if ts.is_missing(value) {
                continue;
            }
            writer.write_record([
                at.to_string(),
                id_text.clone(),
                value.to_string(),
                ts.flag_at(&at).to_string(),
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;
    info!("wrote {} rows for {} series to {}", rows, series.len(), output);
    Ok(())
}
