use clap::Parser;
use config::ArgCheck;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Collapse redundant incomplete calls within each sample", long_about = None)]
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
        help = "Output directory for collapsed tables and the collapse summary"
    )]
    pub outdir: PathBuf,
}

impl From<Vec<String>> for Args {
    fn from(args: Vec<String>) -> Self {
        Args::parse_from(std::iter::once("iso-collapse".to_string()).chain(args))
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
