use serde::Serialize;

use crate::record::UniversalId;

/// A transcript with zero exon rows: no fingerprint can be derived, so it
/// is excluded from identity assignment and every downstream output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityGap {
    pub sample: String,
    pub isoform: String,
}

/// The same universal identifier reported conflicting invariant metadata
/// across samples; the first-observed value is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataConflict {
    pub universal_id: UniversalId,
    pub field: &'static str,
    pub kept: String,
    pub conflicting: String,
    pub sample: String,
}

/// Expression rows whose transcript identifiers never matched the
/// collapsed classification table; they carry no usable evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionMismatch {
    pub sample: String,
    pub dropped: usize,
}

/// Recoverable anomalies collected over one run, returned alongside the
/// primary outputs and rendered as a flat audit table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub identity_gaps: Vec<IdentityGap>,
    pub metadata_conflicts: Vec<MetadataConflict>,
    pub expression_mismatches: Vec<ExpressionMismatch>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.identity_gaps.is_empty()
            && self.metadata_conflicts.is_empty()
            && self.expression_mismatches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.identity_gaps.len() + self.metadata_conflicts.len() + self.expression_mismatches.len()
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.identity_gaps.extend(other.identity_gaps);
        self.metadata_conflicts.extend(other.metadata_conflicts);
        self.expression_mismatches.extend(other.expression_mismatches);
    }

    pub fn header() -> &'static str {
        "kind\tsample\tdetail"
    }

    /// Flatten to audit rows, one anomaly per line.
    pub fn to_rows(&self) -> Vec<String> {
        let mut rows = Vec::with_capacity(self.len());

        for gap in &self.identity_gaps {
            rows.push(format!(
                "identity_gap\t{}\ttranscript {} has no exon rows",
                gap.sample, gap.isoform
            ));
        }
        for conflict in &self.metadata_conflicts {
            rows.push(format!(
                "inconsistent_metadata\t{}\t{} {}: kept '{}', saw '{}'",
                conflict.sample,
                conflict.universal_id,
                conflict.field,
                conflict.kept,
                conflict.conflicting
            ));
        }
        for mismatch in &self.expression_mismatches {
            rows.push(format!(
                "aggregation_mismatch\t{}\t{} expression rows without a matching transcript",
                mismatch.sample, mismatch.dropped
            ));
        }

        rows
    }
}
