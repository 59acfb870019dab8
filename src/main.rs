//! # toxhub
//!
//! Command-line front end for the toxicology post-hoc analysis pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # List the studies visible to a user
//! toxhub --config toxhub.toml -u client01 studies
//!
//! # Summarize day 28 body weights and run every procedure
//! toxhub --config toxhub.toml -u client01 analyze C01_study.csv \
//!     -m BodyWeight -t 28 -c G1 --all --export Report.xlsx
//!
//! # Administrators manage the data directory
//! toxhub --config toxhub.toml -u admin upload ./C02_study.csv
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
