use hashbrown::HashMap;
use log::info;

use annopack::{
    Diagnostics, ExpressionMismatch, MetadataConflict, SampleBundle, StructuralCategory,
    UniversalId,
};

/// One consolidated metadata row per distinct universal identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct IsoformInfo {
    pub universal_id: UniversalId,
    pub category: StructuralCategory,
    pub associated_gene: String,
    pub associated_transcript: String,
    pub exons: u64,
    pub average_length: f64,
}

/// Sample x isoform evidence: expression magnitudes where a sample
/// supplied counts, presence flags where it did not.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceMatrix {
    pub ids: Vec<UniversalId>,
    pub samples: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl EvidenceMatrix {
    pub fn get(&self, id: UniversalId, sample: &str) -> Option<f64> {
        let row = self.ids.iter().position(|&i| i == id)?;
        let col = self.samples.iter().position(|s| s == sample)?;
        Some(self.values[row][col])
    }
}

struct InfoAccum {
    category: StructuralCategory,
    associated_gene: String,
    associated_transcript: String,
    exons: u64,
    length_sum: f64,
    observations: u64,
}

/// Consolidate per-isoform metadata across samples.
///
/// Category, gene, transcript, and exon count are invariant properties of
/// the fingerprint: the first-observed value (manifest order, row order)
/// is kept and any later divergence is reported, never silently resolved.
/// Length is averaged over every record reporting the identifier.
pub fn build_isoform_info(
    samples: &[SampleBundle],
    diagnostics: &mut Diagnostics,
) -> Vec<IsoformInfo> {
    let mut order: Vec<UniversalId> = Vec::new();
    let mut accum: HashMap<UniversalId, InfoAccum> = HashMap::new();

    for sample in samples {
        for rec in &sample.classification {
            let Some(uid) = rec.universal_id else {
                continue;
            };

            match accum.get_mut(&uid) {
                None => {
                    order.push(uid);
                    accum.insert(
                        uid,
                        InfoAccum {
                            category: rec.structural_category,
                            associated_gene: rec.associated_gene.clone(),
                            associated_transcript: rec.associated_transcript.clone(),
                            exons: rec.exons,
                            length_sum: rec.length as f64,
                            observations: 1,
                        },
                    );
                }
                Some(entry) => {
                    entry.length_sum += rec.length as f64;
                    entry.observations += 1;

                    if entry.category != rec.structural_category {
                        diagnostics.metadata_conflicts.push(MetadataConflict {
                            universal_id: uid,
                            field: "structural_category",
                            kept: entry.category.to_string(),
                            conflicting: rec.structural_category.to_string(),
                            sample: sample.name.clone(),
                        });
                    }
                    if entry.associated_gene != rec.associated_gene {
                        diagnostics.metadata_conflicts.push(MetadataConflict {
                            universal_id: uid,
                            field: "associated_gene",
                            kept: entry.associated_gene.clone(),
                            conflicting: rec.associated_gene.clone(),
                            sample: sample.name.clone(),
                        });
                    }
                    if entry.associated_transcript != rec.associated_transcript {
                        diagnostics.metadata_conflicts.push(MetadataConflict {
                            universal_id: uid,
                            field: "associated_transcript",
                            kept: entry.associated_transcript.clone(),
                            conflicting: rec.associated_transcript.clone(),
                            sample: sample.name.clone(),
                        });
                    }
                    if entry.exons != rec.exons {
                        diagnostics.metadata_conflicts.push(MetadataConflict {
                            universal_id: uid,
                            field: "exons",
                            kept: entry.exons.to_string(),
                            conflicting: rec.exons.to_string(),
                            sample: sample.name.clone(),
                        });
                    }
                }
            }
        }
    }

    let mut rows: Vec<IsoformInfo> = order
        .into_iter()
        .map(|uid| {
            let entry = &accum[&uid];
            IsoformInfo {
                universal_id: uid,
                category: entry.category,
                associated_gene: entry.associated_gene.clone(),
                associated_transcript: entry.associated_transcript.clone(),
                exons: entry.exons,
                average_length: entry.length_sum / entry.observations as f64,
            }
        })
        .collect();

    rows.sort_by_key(|row| row.universal_id);
    rows
}

/// Build the evidence matrix: one row per universal identifier (sorted),
/// one column per sample (manifest order).
///
/// Expression samples contribute summed evidence per identifier, raw or
/// normalized; presence samples contribute 1/0 flags. Expression rows
/// that match no surviving transcript are dropped and counted; absent
/// combinations are explicit zeros.
pub fn build_matrix(
    samples: &[SampleBundle],
    ids: &[UniversalId],
    diagnostics: &mut Diagnostics,
) -> EvidenceMatrix {
    let row_of: HashMap<UniversalId, usize> =
        ids.iter().copied().enumerate().map(|(i, id)| (id, i)).collect();

    let mut values = vec![vec![0.0; samples.len()]; ids.len()];

    for (col, sample) in samples.iter().enumerate() {
        let uid_of: HashMap<&str, UniversalId> = sample
            .classification
            .iter()
            .filter_map(|rec| rec.universal_id.map(|uid| (rec.isoform.as_str(), uid)))
            .collect();

        match &sample.expression {
            Some(expression) => {
                let mut dropped = 0usize;
                for rec in expression {
                    match uid_of.get(rec.isoform.as_str()) {
                        Some(uid) => {
                            if let Some(&row) = row_of.get(uid) {
                                values[row][col] += rec.evidence();
                            }
                        }
                        None => dropped += 1,
                    }
                }
                if dropped > 0 {
                    diagnostics.expression_mismatches.push(ExpressionMismatch {
                        sample: sample.name.clone(),
                        dropped,
                    });
                }
            }
            None => {
                for uid in uid_of.values() {
                    if let Some(&row) = row_of.get(uid) {
                        values[row][col] = 1.0;
                    }
                }
            }
        }
    }

    EvidenceMatrix {
        ids: ids.to_vec(),
        samples: samples.iter().map(|s| s.name.clone()).collect(),
        values,
    }
}

/// Consolidate all samples into the two final artifacts.
pub fn aggregate(samples: &[SampleBundle]) -> (Vec<IsoformInfo>, EvidenceMatrix, Diagnostics) {
    let mut diagnostics = Diagnostics::default();

    let info = build_isoform_info(samples, &mut diagnostics);
    let ids: Vec<UniversalId> = info.iter().map(|row| row.universal_id).collect();
    let matrix = build_matrix(samples, &ids, &mut diagnostics);

    info!(
        "Aggregated {} isoforms across {} samples ({} anomalies)",
        info.len(),
        samples.len(),
        diagnostics.len()
    );

    (info, matrix, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use annopack::{ExpressionRecord, Strand, Subcategory, TranscriptRecord};

    fn transcript(isoform: &str, uid: u64, length: u64) -> TranscriptRecord {
        TranscriptRecord {
            isoform: isoform.to_string(),
            chrom: "chr1".to_string(),
            strand: Strand::Forward,
            length,
            exons: 2,
            structural_category: StructuralCategory::FullSpliceMatch,
            associated_gene: "G1".to_string(),
            associated_transcript: "TX1".to_string(),
            subcategory: Subcategory::ReferenceMatch,
            universal_id: Some(UniversalId(uid)),
        }
    }

    fn bundle(
        name: &str,
        classification: Vec<TranscriptRecord>,
        expression: Option<Vec<ExpressionRecord>>,
    ) -> SampleBundle {
        SampleBundle {
            name: name.to_string(),
            classification,
            junctions: Vec::new(),
            gene_model: Vec::new(),
            expression,
        }
    }

    #[test]
    fn test_shared_id_yields_one_row_present_in_both() {
        // two samples report the same splice structure
        let samples = vec![
            bundle("s1", vec![transcript("PB.1.1", 1, 1000)], None),
            bundle("s2", vec![transcript("PB.7.3", 1, 1100)], None),
        ];

        let (info, matrix, diagnostics) = aggregate(&samples);

        assert!(diagnostics.is_empty());
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].average_length, 1050.0);
        assert_eq!(matrix.ids.len(), 1);
        assert_eq!(matrix.get(UniversalId(1), "s1"), Some(1.0));
        assert_eq!(matrix.get(UniversalId(1), "s2"), Some(1.0));
    }

    #[test]
    fn test_expression_and_presence_columns_coexist() {
        let samples = vec![
            bundle(
                "s1",
                vec![transcript("PB.1.1", 1, 1000)],
                Some(vec![ExpressionRecord {
                    isoform: "PB.1.1".to_string(),
                    count: 15.0,
                    norm: None,
                }]),
            ),
            bundle("s2", vec![transcript("PB.2.1", 1, 1000)], None),
        ];

        let (_, matrix, _) = aggregate(&samples);

        assert_eq!(matrix.get(UniversalId(1), "s1"), Some(15.0));
        assert_eq!(matrix.get(UniversalId(1), "s2"), Some(1.0));
    }

    #[test]
    fn test_absent_combination_is_explicit_zero() {
        let samples = vec![
            bundle("s1", vec![transcript("PB.1.1", 1, 1000)], None),
            bundle("s2", vec![transcript("PB.2.1", 2, 900)], None),
        ];

        let (info, matrix, _) = aggregate(&samples);

        assert_eq!(info.len(), 2);
        assert_eq!(matrix.get(UniversalId(1), "s2"), Some(0.0));
        assert_eq!(matrix.get(UniversalId(2), "s1"), Some(0.0));
        for row in &matrix.values {
            assert_eq!(row.len(), 2);
        }
    }

    #[test]
    fn test_duplicate_ids_within_sample_are_summed() {
        let samples = vec![bundle(
            "s1",
            vec![transcript("PB.1.1", 1, 1000), transcript("PB.1.2", 1, 1000)],
            Some(vec![
                ExpressionRecord {
                    isoform: "PB.1.1".to_string(),
                    count: 4.0,
                    norm: None,
                },
                ExpressionRecord {
                    isoform: "PB.1.2".to_string(),
                    count: 6.0,
                    norm: None,
                },
            ]),
        )];

        let (_, matrix, _) = aggregate(&samples);

        assert_eq!(matrix.get(UniversalId(1), "s1"), Some(10.0));
    }

    #[test]
    fn test_metadata_conflict_keeps_first_and_reports() {
        let mut divergent = transcript("PB.9.1", 1, 1000);
        divergent.structural_category = StructuralCategory::IncompleteSpliceMatch;

        let samples = vec![
            bundle("s1", vec![transcript("PB.1.1", 1, 1000)], None),
            bundle("s2", vec![divergent], None),
        ];

        let (info, _, diagnostics) = aggregate(&samples);

        assert_eq!(info[0].category, StructuralCategory::FullSpliceMatch);
        assert_eq!(diagnostics.metadata_conflicts.len(), 1);
        assert_eq!(diagnostics.metadata_conflicts[0].sample, "s2");
        assert_eq!(
            diagnostics.metadata_conflicts[0].field,
            "structural_category"
        );
    }

    #[test]
    fn test_unmatched_expression_rows_are_dropped_and_counted() {
        let samples = vec![bundle(
            "s1",
            vec![transcript("PB.1.1", 1, 1000)],
            Some(vec![
                ExpressionRecord {
                    isoform: "PB.1.1".to_string(),
                    count: 2.0,
                    norm: None,
                },
                ExpressionRecord {
                    isoform: "PB.404".to_string(),
                    count: 99.0,
                    norm: None,
                },
            ]),
        )];

        let (_, matrix, diagnostics) = aggregate(&samples);

        assert_eq!(matrix.get(UniversalId(1), "s1"), Some(2.0));
        assert_eq!(diagnostics.expression_mismatches.len(), 1);
        assert_eq!(diagnostics.expression_mismatches[0].dropped, 1);
    }

    #[test]
    fn test_rows_sorted_by_identifier() {
        let samples = vec![bundle(
            "s1",
            vec![
                transcript("PB.3.1", 3, 500),
                transcript("PB.1.1", 1, 500),
                transcript("PB.2.1", 2, 500),
            ],
            None,
        )];

        let (info, matrix, _) = aggregate(&samples);

        let ids: Vec<u64> = info.iter().map(|r| r.universal_id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(matrix.ids, vec![UniversalId(1), UniversalId(2), UniversalId(3)]);
    }

    #[test]
    fn test_normalized_value_preferred_over_raw() {
        let samples = vec![bundle(
            "s1",
            vec![transcript("PB.1.1", 1, 1000)],
            Some(vec![ExpressionRecord {
                isoform: "PB.1.1".to_string(),
                count: 10.0,
                norm: Some(123.5),
            }]),
        )];

        let (_, matrix, _) = aggregate(&samples);

        assert_eq!(matrix.get(UniversalId(1), "s1"), Some(123.5));
    }
}
