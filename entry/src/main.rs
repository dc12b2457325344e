//! isocompare: reconcile per-sample isoform annotations into one
//! cross-sample reference.
//!
//! This is the entry point for the isocompare CLI. It parses the
//! top-level arguments and dispatches to the stage subcommands:
//!
//! - iso-id: assign universal identifiers to splice structures
//! - iso-collapse: collapse redundant calls within each sample
//! - iso-merge: build the isoform metadata table and evidence matrix
//! - run: the full pipeline in one process
//!
//! Each stage is also available as its own binary; `run` threads the
//! in-memory tables straight through without intermediate files.

use clap::{Args, Parser, Subcommand};
use log::{error, info, Level};
use simple_logger::init_with_level;
use std::path::PathBuf;

use isocompare::{run_pipeline, RunOpts};

#[derive(Parser)]
#[command(name = "isocompare")]
#[command(about = "isocompare: cross-sample isoform canonicalization and deduplication")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "iso-id")]
    Id(PassArgs),
    #[command(name = "iso-collapse")]
    Collapse(PassArgs),
    #[command(name = "iso-merge")]
    Merge(PassArgs),
    #[command(name = "run")]
    Run(RunArgs),
}

#[derive(Args)]
struct PassArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Args)]
struct RunArgs {
    #[arg(
        short = 'm',
        long = "manifest",
        required = true,
        value_name = "PATH",
        help = "TSV manifest with per-sample paths: classification, junctions, gene model[, expression]"
    )]
    manifest: PathBuf,

    #[arg(
        short = 'o',
        long = "outdir",
        required = true,
        value_name = "DIR",
        help = "Output directory for all artifacts"
    )]
    outdir: PathBuf,

    #[arg(long = "no-collapse", help = "Skip the within-sample collapse stage")]
    no_collapse: bool,

    #[arg(
        short = 'n',
        long = "normalize",
        value_name = "METHOD",
        help = "Normalize expression counts before aggregation [supported: cpm]"
    )]
    normalize: Option<String>,

    #[arg(
        short = 't',
        long = "threads",
        value_name = "THREADS",
        default_value_t = num_cpus::get(),
        help = "Number of threads for the per-sample stages"
    )]
    threads: usize,
}

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Id(args) => iso_id::lib_iso_id(args.args),
        Commands::Collapse(args) => iso_collapse::lib_iso_collapse(args.args),
        Commands::Merge(args) => iso_merge::lib_iso_merge(args.args),
        Commands::Run(args) => {
            rayon::ThreadPoolBuilder::new()
                .num_threads(args.threads.max(config::MIN_THREADS))
                .build_global()
                .unwrap_or_else(|e| {
                    error!("{}", e);
                    std::process::exit(1);
                });

            if !args.outdir.exists() {
                std::fs::create_dir_all(&args.outdir).unwrap_or_else(|e| {
                    error!("{}", e);
                    std::process::exit(1);
                });
            }

            run_pipeline(RunOpts {
                manifest: args.manifest,
                outdir: args.outdir,
                collapse: !args.no_collapse,
                normalize: args.normalize,
            })
            .map(|_| ())
        }
    };

    outcome.unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}
