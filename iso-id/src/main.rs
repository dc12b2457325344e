//! Identity stage for cross-sample isoform comparison.
//!
//! Derives a junction chain per transcript from its gene-model exon rows
//! and assigns one stable universal identifier per unique chain across
//! every sample in the manifest. Identical splice structures observed in
//! different samples end up with the same identifier, which is what makes
//! the downstream evidence matrix line up.

use clap::{self, Parser};
use config::ArgCheck;
use log::{error, info, Level};
use simple_logger::init_with_level;

use iso_id::cli::Args;
use iso_id::run_id;

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();

    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    run_id(args).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
