use anyhow::Result;

pub mod cli;
pub mod core;
pub mod utils;

use log::warn;

/// Run the identity stage standalone: load the manifest, assign universal
/// identifiers, write the tagged per-sample tables.
pub fn lib_iso_id(args: Vec<String>) -> Result<()> {
    let args = cli::Args::from(args);
    run_id(args)
}

pub fn run_id(args: cli::Args) -> Result<()> {
    let manifest = annopack::read_manifest(&args.manifest)?;
    let mut samples = annopack::load_samples(&manifest)?;

    let (_registry, diagnostics) = core::assign_universal_ids(&mut samples)?;

    for sample in &samples {
        utils::write_tagged(sample, &args.outdir);
    }

    if !diagnostics.is_empty() {
        for row in diagnostics.to_rows() {
            warn!("{}", row);
        }
        config::write_table(
            annopack::Diagnostics::header(),
            &diagnostics.to_rows(),
            &args.outdir.join(config::DIAGNOSTICS).to_string_lossy(),
        );
    }

    Ok(())
}
