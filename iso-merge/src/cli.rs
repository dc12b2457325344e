use clap::{ArgAction, Parser};
use config::ArgCheck;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Consolidate samples into the isoform metadata table and evidence matrix", long_about = None)]
pub struct Args {
    #[arg(
        short = 'm',
        long = "manifest",
        required = true,
        value_name = "PATH",
        help = "TSV manifest with per-sample paths: classification, junctions, gene model[, expression]"
    )]
    pub manifest: PathBuf,

    #[arg(
        short = 'o',
        long = "outdir",
        required = true,
        value_name = "DIR",
        help = "Output directory for the consolidated artifacts"
    )]
    pub outdir: PathBuf,

    #[arg(
        long = "no-collapse",
        action = ArgAction::SetTrue,
        help = "Skip the within-sample collapse of redundant calls"
    )]
    pub no_collapse: bool,

    #[arg(
        short = 'n',
        long = "normalize",
        value_name = "METHOD",
        help = "Normalize expression counts before aggregation [supported: cpm]"
    )]
    pub normalize: Option<String>,
}

impl From<Vec<String>> for Args {
    fn from(args: Vec<String>) -> Self {
        Args::parse_from(std::iter::once("iso-merge".to_string()).chain(args))
    }
}

impl ArgCheck for Args {
    fn get_manifest(&self) -> &PathBuf {
        &self.manifest
    }

    fn get_outdir(&self) -> &PathBuf {
        &self.outdir
    }
}
