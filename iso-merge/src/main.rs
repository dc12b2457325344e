//! Cross-sample consolidation.
//!
//! Takes every sample's identity-tagged, collapsed records and produces
//! the two final artifacts: one metadata row per distinct splice
//! structure, and the sample x isoform evidence matrix mixing expression
//! magnitudes with presence flags. Counts from merged records were
//! already folded into their survivors, so column sums stay honest.

use clap::{self, Parser};
use config::ArgCheck;
use log::{error, info, Level};
use simple_logger::init_with_level;

use iso_merge::cli::Args;
use iso_merge::run_merge;

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();

    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    run_merge(args).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
