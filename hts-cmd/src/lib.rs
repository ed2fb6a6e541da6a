//! Command implementations for the hydrologic time-series CLI.
//!
//! Provides subcommands for inspecting time-series files and
//! exporting their values as CSV. The input format (fixed-column or
//! property-header) is detected automatically.

use clap::Subcommand;

pub mod export;
pub mod info;

mod decode;

#[derive(Subcommand)]
pub enum Command {
    /// Print metadata and value counts for series in a file
    Info {
        /// Path to the input time-series file
        #[arg(short = 'f', long)]
        file: String,

        /// Restrict to one series identifier or alias
        #[arg(long)]
        id: Option<String>,
    },

    /// Export series values to a CSV file
    Export {
        /// Path to the input time-series file
        #[arg(short = 'f', long)]
        file: String,

        /// Output CSV path
        #[arg(short = 'o', long)]
        output: String,

        /// Restrict to one series identifier or alias
        #[arg(long)]
        id: Option<String>,

        /// Period start, e.g. 1995-10
        #[arg(long)]
        start: Option<String>,

        /// Period end, e.g. 1997-09
        #[arg(long)]
        end: Option<String>,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Info { file, id } => info::run_info(&file, id.as_deref()),
        Command::Export {
            file,
            output,
            id,
            start,
            end,
        } => export::run_export(
            &file,
            &output,
            id.as_deref(),
            start.as_deref(),
            end.as_deref(),
        ),
    }
}
