use anyhow::Result;
use log::warn;

pub mod cli;
pub mod core;
pub mod utils;

/// Run the aggregation stage standalone: load, assign identifiers,
/// collapse (unless disabled), normalize (if requested), consolidate.
pub fn lib_iso_merge(args: Vec<String>) -> Result<()> {
    let args = cli::Args::from(args);
    run_merge(args)
}

pub fn run_merge(args: cli::Args) -> Result<()> {
    let manifest = annopack::read_manifest(&args.manifest)?;
    let mut samples = annopack::load_samples(&manifest)?;

    let (_registry, mut diagnostics) = iso_id::core::assign_universal_ids(&mut samples)?;

    if !args.no_collapse {
        let records = iso_collapse::core::collapse_all(&mut samples);
        iso_collapse::utils::write_summary(&records, &args.outdir);
    }

    if let Some(method) = &args.normalize {
        let normalizer = utils::normalizer_for(method)?;
        for sample in samples.iter_mut() {
            if let Some(expression) = sample.expression.as_mut() {
                normalizer.normalize(expression);
            }
        }
    }

    let (info, matrix, merge_diagnostics) = core::aggregate(&samples);
    diagnostics.merge(merge_diagnostics);

    utils::write_info(&info, &args.outdir);
    utils::write_matrix(&matrix, &args.outdir);

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
