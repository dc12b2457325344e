use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// sentinels
pub const NOVEL: &str = "novel";

// numeric values
pub const MIN_THREADS: usize = 1;
pub const FIRST_UNIVERSAL_ID: u64 = 1;
pub const MANIFEST_MIN_FIELDS: usize = 3;
pub const MANIFEST_MAX_FIELDS: usize = 4;
pub const GTF_FIELDS: usize = 9;

// file names
pub const ISOFORM_INFO: &str = "isoform_info.tsv";
pub const ISOFORM_MATRIX: &str = "isoform_matrix.tsv";
pub const COLLAPSE_SUMMARY: &str = "collapse_summary.tsv";
pub const DIAGNOSTICS: &str = "diagnostics.tsv";
pub const RUN_SUMMARY: &str = "run_summary.json";

// per-sample file suffixes
pub const UID_CLASSIFICATION: &str = "classification.uid.tsv";
pub const UID_JUNCTIONS: &str = "junctions.uid.tsv";
pub const COLLAPSED_CLASSIFICATION: &str = "classification.collapsed.tsv";
pub const COLLAPSED_JUNCTIONS: &str = "junctions.collapsed.tsv";
pub const COLLAPSED_EXPRESSION: &str = "expression.collapsed.tsv";

// classification suffix stripped to derive sample names
pub const CLASSIFICATION_STEM: &str = "_classification";

// os
#[cfg(not(windows))]
const TICK_SETTINGS: (&str, u64) = ("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ", 80);
#[cfg(windows)]
const TICK_SETTINGS: (&str, u64) = (r"+-x| ", 200);

/// return a pre-configured progress bar
pub fn get_progress_bar(length: u64, msg: &str) -> ProgressBar {
    let progressbar_style = ProgressStyle::default_spinner()
        .tick_chars(TICK_SETTINGS.0)
        .template(" {spinner} {msg:<30} {wide_bar} ETA {eta_precise} ")
        .expect("no template error");

    let progress_bar = ProgressBar::new(length);

    progress_bar.set_style(progressbar_style);
    progress_bar.enable_steady_tick(Duration::from_millis(TICK_SETTINGS.1));
    progress_bar.set_message(msg.to_owned());

    progress_bar
}

/// write an ordered collection of lines to a file
pub fn write_collection(data: &[String], fname: &str) {
    log::info!("Rows in {}: {:?}. Writing...", fname, data.len());
    let f = match File::create(fname) {
        Ok(f) => f,
        Err(e) => panic!("Error creating file: {}", e),
    };
    let mut writer = BufWriter::new(f);

    for line in data.iter() {
        writeln!(writer, "{}", line).unwrap_or_else(|e| {
            panic!("Error writing to file: {}", e);
        });
    }
}

/// write a header line followed by ordered rows to a file
pub fn write_table(header: &str, rows: &[String], fname: &str) {
    log::info!("Rows in {}: {:?}. Writing...", fname, rows.len());
    let f = match File::create(fname) {
        Ok(f) => f,
        Err(e) => panic!("Error creating file: {}", e),
    };
    let mut writer = BufWriter::new(f);

    writeln!(writer, "{}", header).unwrap_or_else(|e| {
        panic!("Error writing to file: {}", e);
    });
    for line in rows.iter() {
        writeln!(writer, "{}", line).unwrap_or_else(|e| {
            panic!("Error writing to file: {}", e);
        });
    }
}

/// argument checker for all subcommands
pub trait ArgCheck {
    fn check(&self) -> Result<(), CliError> {
        self.validate_args()
    }

    fn validate_args(&self) -> Result<(), CliError> {
        validate(self.get_manifest())?;

        let outdir = self.get_outdir();
        if !outdir.exists() {
            std::fs::create_dir_all(outdir)?;
        } else if !outdir.is_dir() {
            return Err(CliError::InvalidInput(format!(
                "{:?} exists and is not a directory",
                outdir
            )));
        }

        Ok(())
    }

    fn get_manifest(&self) -> &PathBuf;
    fn get_outdir(&self) -> &PathBuf;
}

/// error handling for CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// argument validation
pub fn validate(arg: &PathBuf) -> Result<(), CliError> {
    if !arg.exists() {
        return Err(CliError::InvalidInput(format!("{:?} does not exist", arg)));
    }

    if !arg.is_file() {
        return Err(CliError::InvalidInput(format!("{:?} is not a file", arg)));
    }

    match std::fs::metadata(arg) {
        Ok(metadata) if metadata.len() == 0 => {
            Err(CliError::InvalidInput(format!("file {:?} is empty", arg)))
        }
        Ok(_) => Ok(()),
        Err(e) => Err(CliError::IoError(e)),
    }
}
