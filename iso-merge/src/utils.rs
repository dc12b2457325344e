use std::path::Path;

use anyhow::{bail, Result};
use annopack::ExpressionRecord;
use config::{write_table, ISOFORM_INFO, ISOFORM_MATRIX};

use crate::core::{EvidenceMatrix, IsoformInfo};

/// Library-size normalization seam.
///
/// Implementations replace magnitudes but must leave row identity alone:
/// the same transcripts, in the same order, go out as came in. The
/// aggregator treats whatever lands in `norm` as opaque.
pub trait Normalizer {
    fn normalize(&self, rows: &mut [ExpressionRecord]);
}

/// Counts-per-million scaling against the sample's library size.
pub struct CpmNormalizer;

impl Normalizer for CpmNormalizer {
    fn normalize(&self, rows: &mut [ExpressionRecord]) {
        let total: f64 = rows.iter().map(|rec| rec.count).sum();
        if total == 0.0 {
            return;
        }
        for rec in rows.iter_mut() {
            rec.norm = Some(rec.count / total * 1_000_000.0);
        }
    }
}

/// Resolve a normalization method named on the command line.
pub fn normalizer_for(method: &str) -> Result<Box<dyn Normalizer>> {
    match method {
        "cpm" => Ok(Box::new(CpmNormalizer)),
        other => bail!("unknown normalization method: {}", other),
    }
}

/// Render a matrix cell: whole numbers without a trailing fraction.
pub fn format_cell(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Write the isoform metadata table.
pub fn write_info(info: &[IsoformInfo], outdir: &Path) {
    let rows: Vec<String> = info
        .iter()
        .map(|row| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                row.universal_id,
                row.category,
                row.associated_gene,
                row.associated_transcript,
                row.exons,
                row.average_length
            )
        })
        .collect();

    write_table(
        "universal_id\tcategory\tassociated_gene\tassociated_transcript\texons_n\taverage_length",
        &rows,
        &outdir.join(ISOFORM_INFO).to_string_lossy(),
    );
}

/// Write the sample x isoform evidence matrix.
pub fn write_matrix(matrix: &EvidenceMatrix, outdir: &Path) {
    let header = std::iter::once("universal_id".to_string())
        .chain(matrix.samples.iter().cloned())
        .collect::<Vec<_>>()
        .join("\t");

    let rows: Vec<String> = matrix
        .ids
        .iter()
        .zip(matrix.values.iter())
        .map(|(id, row)| {
            std::iter::once(id.to_string())
                .chain(row.iter().map(|&v| format_cell(v)))
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect();

    write_table(&header, &rows, &outdir.join(ISOFORM_MATRIX).to_string_lossy());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<ExpressionRecord> {
        vec![
            ExpressionRecord {
                isoform: "PB.1.1".to_string(),
                count: 750_000.0,
                norm: None,
            },
            ExpressionRecord {
                isoform: "PB.1.2".to_string(),
                count: 250_000.0,
                norm: None,
            },
        ]
    }

    #[test]
    fn test_cpm_preserves_row_identity() {
        let mut data = rows();
        CpmNormalizer.normalize(&mut data);

        assert_eq!(data.len(), 2);
        assert_eq!(data[0].isoform, "PB.1.1");
        assert_eq!(data[1].isoform, "PB.1.2");
        assert_eq!(data[0].norm, Some(750_000.0));
        assert_eq!(data[1].norm, Some(250_000.0));
        // raw counts untouched
        assert_eq!(data[0].count, 750_000.0);
    }

    #[test]
    fn test_cpm_empty_library_is_left_raw() {
        let mut data = vec![ExpressionRecord {
            isoform: "PB.1.1".to_string(),
            count: 0.0,
            norm: None,
        }];
        CpmNormalizer.normalize(&mut data);

        assert_eq!(data[0].norm, None);
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        assert!(normalizer_for("cpm").is_ok());
        assert!(normalizer_for("tmm_via_carrier_pigeon").is_err());
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(1.0), "1");
        assert_eq!(format_cell(0.0), "0");
        assert_eq!(format_cell(12.5), "12.5");
    }
}
