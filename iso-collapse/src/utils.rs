use std::path::Path;

use annopack::SampleBundle;
use config::{
    write_table, COLLAPSED_CLASSIFICATION, COLLAPSED_EXPRESSION, COLLAPSED_JUNCTIONS,
    COLLAPSE_SUMMARY,
};

use crate::core::SampleCollapse;

pub const SUMMARY_HEADER: &str = "sample\tsurvivor_isoform\tcollapsed_isoforms\tcategory\tsubcategory";

/// Render the audit rows: one line per survivor that absorbed members.
pub fn summary_rows(records: &[SampleCollapse]) -> Vec<String> {
    let mut rows = Vec::new();

    for record in records {
        for group in &record.groups {
            if group.removed.is_empty() {
                continue;
            }
            rows.push(format!(
                "{}\t{}\t{}\t{}\t{}",
                record.sample,
                group.survivor,
                group.removed.join(","),
                group.category,
                group.subcategory
            ));
        }
    }

    rows
}

/// Write one sample's collapsed tables.
pub fn write_collapsed(sample: &SampleBundle, outdir: &Path) {
    let classification: Vec<String> = sample
        .classification
        .iter()
        .map(|rec| rec.to_uid_row())
        .collect();
    write_table(
        annopack::TranscriptRecord::uid_header(),
        &classification,
        &outdir
            .join(format!("{}_{}", sample.name, COLLAPSED_CLASSIFICATION))
            .to_string_lossy(),
    );

    let junctions: Vec<String> = sample
        .junctions
        .iter()
        .map(|rec| {
            format!(
                "{}\t{}\t{}\t{}\t{}",
                rec.isoform, rec.chrom, rec.strand, rec.start, rec.end
            )
        })
        .collect();
    write_table(
        "isoform\tchrom\tstrand\tgenomic_start_coord\tgenomic_end_coord",
        &junctions,
        &outdir
            .join(format!("{}_{}", sample.name, COLLAPSED_JUNCTIONS))
            .to_string_lossy(),
    );

    if let Some(expression) = &sample.expression {
        let rows: Vec<String> = expression
            .iter()
            .map(|rec| match rec.norm {
                Some(norm) => format!("{}\t{}\t{}", rec.isoform, rec.count, norm),
                None => format!("{}\t{}", rec.isoform, rec.count),
            })
            .collect();
        config::write_collection(
            &rows,
            &outdir
                .join(format!("{}_{}", sample.name, COLLAPSED_EXPRESSION))
                .to_string_lossy(),
        );
    }
}

/// Write the cross-sample collapse summary.
pub fn write_summary(records: &[SampleCollapse], outdir: &Path) {
    write_table(
        SUMMARY_HEADER,
        &summary_rows(records),
        &outdir.join(COLLAPSE_SUMMARY).to_string_lossy(),
    );
}
