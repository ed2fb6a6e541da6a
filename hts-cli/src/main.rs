//! hts-cli - Command line tool for inspecting and exporting hydrologic
//! time-series files.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "hts-cli",
    version,
    about = "Hydrologic time-series file toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: hts_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    hts_cmd::run(cli.command)
}
