use anyhow::Result;

pub mod cli;
pub mod core;
pub mod utils;

/// Run the collapse stage standalone: load the manifest, collapse every
/// sample, write the collapsed tables and the audit summary.
pub fn lib_iso_collapse(args: Vec<String>) -> Result<()> {
    let args = cli::Args::from(args);
    run_collapse(args)
}

pub fn run_collapse(args: cli::Args) -> Result<()> {
    let manifest = annopack::read_manifest(&args.manifest)?;
    let mut samples = annopack::load_samples(&manifest)?;

    let records = core::collapse_all(&mut samples);

    for sample in &samples {
        utils::write_collapsed(sample, &args.outdir);
    }
    utils::write_summary(&records, &args.outdir);

    Ok(())
}
