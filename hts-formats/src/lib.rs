//! Text-format decoders for hydrologic time-series files.
//!
//! Two formats are supported: [fixed] reads the legacy fixed-column
//! layout of year/station rows, and [datevalue] reads the
//! property-header/delimited layout. Both take the file contents as a
//! slice of lines; callers do the I/O.

pub mod datevalue;
pub mod fixed;

/// True when the lines look like a property-header file rather than a
/// fixed-column one: a `# DateValueTS` tag or a `Name = value`
/// assignment before any data.
pub fn is_property_header(lines: &[&str]) -> bool {
    for raw in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            if line.trim_start_matches('#').trim_start().starts_with("DateValueTS") {
                return true;
            }
            continue;
        }
        return match line.split_once('=') {
            Some((name, _)) => {
                let name = name.trim();
                !name.is_empty()
                    && name
                        .chars()
                        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            }
            None => false,
        };
    }
    false
}
