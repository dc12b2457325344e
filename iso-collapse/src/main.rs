//! Within-sample collapse of redundant annotation calls.
//!
//! An annotation tool run on one sample often reports several calls
//! against the same reference transcript: one full match plus a tail of
//! truncated fragments. This stage keeps one representative per
//! reference association, folds the merged records' expression evidence
//! into it, and writes an audit trail of every merge decision.

use clap::{self, Parser};
use config::ArgCheck;
use log::{error, info, Level};
use simple_logger::init_with_level;

use iso_collapse::cli::Args;
use iso_collapse::run_collapse;

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();

    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    run_collapse(args).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
