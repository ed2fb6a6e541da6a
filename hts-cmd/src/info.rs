//! File inspection command.

use log::info;

/// Decode a file and print per-series metadata and value counts.
pub fn run_info(file: &str, id: Option<&str>) -> anyhow::Result<()> {
    let series = crate::decode::decode_file(file, id, None, None, true)?;
    info!("decoded {} series from {}", series.len(), file);
    for ts in &series {
        let period = match (ts.start(), ts.end()) {
            (Some(start), Some(end)) => format!("{} to {}", start, end),
            _ => "unset".to_string(),
        };
        let non_missing = ts
            .iter_values()
            .iter()
            .filter(|(_, value)| !ts.is_missing(*value))
            .count();
        println!("{}", ts.id());
        if !ts.alias().is_empty() {
            println!("  alias:       {}", ts.alias());
        }
        if !ts.description().is_empty() {
            println!("  description: {}", ts.description());
        }
        println!("  interval:    {}", ts.interval());
        println!("  units:       {}", ts.units());
        println!("  period:      {}", period);
        println!(
            "  values:      {} of {} non-missing",
            non_missing,
            ts.cell_count()
        );
        if ts.has_flags() {
            println!("  flags:       present");
        }
    }
    Ok(())
}
