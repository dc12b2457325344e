use anyhow::Result;
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;

/// Options for one full pipeline run.
#[derive(Debug, Clone)]
pub struct RunOpts {
    pub manifest: PathBuf,
    pub outdir: PathBuf,
    pub collapse: bool,
    pub normalize: Option<String>,
}

/// What one run did, also serialized next to the primary outputs.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub samples: Vec<String>,
    pub transcripts: usize,
    pub universal_ids: usize,
    pub collapsed: usize,
    pub anomalies: usize,
}

/// The engine's public entry point.
///
/// Load manifest -> load samples -> assign universal identifiers ->
/// collapse per sample -> normalize -> aggregate -> write artifacts.
/// Malformed input aborts before any output lands on disk; recoverable
/// anomalies are collected and returned with the summary.
pub fn run_pipeline(opts: RunOpts) -> Result<RunSummary> {
    let manifest = annopack::read_manifest(&opts.manifest)?;
    let mut samples = annopack::load_samples(&manifest)?;

    let (registry, mut diagnostics) = iso_id::core::assign_universal_ids(&mut samples)?;
    for sample in &samples {
        iso_id::utils::write_tagged(sample, &opts.outdir);
    }

    let collapsed = if opts.collapse {
        let records = iso_collapse::core::collapse_all(&mut samples);
        for sample in &samples {
            iso_collapse::utils::write_collapsed(sample, &opts.outdir);
        }
        iso_collapse::utils::write_summary(&records, &opts.outdir);
        records.iter().map(|r| r.removed_total()).sum()
    } else {
        0
    };

    if let Some(method) = &opts.normalize {
        let normalizer = iso_merge::utils::normalizer_for(method)?;
        for sample in samples.iter_mut() {
            if let Some(expression) = sample.expression.as_mut() {
                normalizer.normalize(expression);
            }
        }
    }

    let (info_rows, matrix, merge_diagnostics) = iso_merge::core::aggregate(&samples);
    diagnostics.merge(merge_diagnostics);

    iso_merge::utils::write_info(&info_rows, &opts.outdir);
    iso_merge::utils::write_matrix(&matrix, &opts.outdir);

    if !diagnostics.is_empty() {
        for row in diagnostics.to_rows() {
            warn!("{}", row);
        }
        config::write_table(
            annopack::Diagnostics::header(),
            &diagnostics.to_rows(),
            &opts.outdir.join(config::DIAGNOSTICS).to_string_lossy(),
        );
    }

    let summary = RunSummary {
        samples: samples.iter().map(|s| s.name.clone()).collect(),
        transcripts: samples.iter().map(|s| s.classification.len()).sum(),
        universal_ids: registry.len(),
        collapsed,
        anomalies: diagnostics.len(),
    };

    std::fs::write(
        opts.outdir.join(config::RUN_SUMMARY),
        serde_json::to_string_pretty(&summary)?,
    )?;

    info!(
        "Run complete: {} samples, {} unique isoforms, {} calls collapsed",
        summary.samples.len(),
        summary.universal_ids,
        summary.collapsed
    );

    Ok(summary)
}
