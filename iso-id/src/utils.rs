use std::path::Path;

use annopack::SampleBundle;
use config::{write_table, UID_CLASSIFICATION, UID_JUNCTIONS};

use crate::core::uid_map;

/// Write the id-tagged classification and junction tables for one sample.
pub fn write_tagged(sample: &SampleBundle, outdir: &Path) {
    let uids = uid_map(sample);

    let classification: Vec<String> = sample
        .classification
        .iter()
        .map(|rec| rec.to_uid_row())
        .collect();
    write_table(
        annopack::TranscriptRecord::uid_header(),
        &classification,
        &outdir
            .join(format!("{}_{}", sample.name, UID_CLASSIFICATION))
            .to_string_lossy(),
    );

    let junctions: Vec<String> = sample
        .junctions
        .iter()
        .map(|rec| {
            let uid = uids
                .get(rec.isoform.as_str())
                .map(|u| u.to_string())
                .unwrap_or_else(|| "NA".to_string());
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                rec.isoform, rec.chrom, rec.strand, rec.start, rec.end, uid
            )
        })
        .collect();
    write_table(
        annopack::JunctionRecord::uid_header(),
        &junctions,
        &outdir
            .join(format!("{}_{}", sample.name, UID_JUNCTIONS))
            .to_string_lossy(),
    );
}
