use anyhow::Result;
use hashbrown::HashMap;
use log::info;
use rayon::prelude::*;

use annopack::{Diagnostics, IdentityGap, PackError, SampleBundle, UniversalId};
use config::{get_progress_bar, FIRST_UNIVERSAL_ID};

/// Canonical structural key of one transcript: chromosome plus the flat
/// ordered exon boundary list `[start1, end1, start2, end2, ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JunctionChain {
    pub chrom: String,
    pub bounds: Vec<u64>,
}

impl JunctionChain {
    /// Build a chain from one transcript's exon coordinates.
    ///
    /// Exons are stable-sorted by (start, end) so the chain is independent
    /// of input row order.
    pub fn from_exons(chrom: &str, exons: &[(u64, u64)]) -> Self {
        let mut sorted = exons.to_vec();
        sorted.sort_by_key(|&(start, end)| (start, end));

        let mut bounds = Vec::with_capacity(sorted.len() * 2);
        for (start, end) in sorted {
            bounds.push(start);
            bounds.push(end);
        }

        Self {
            chrom: chrom.to_string(),
            bounds,
        }
    }
}

impl std::fmt::Display for JunctionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.chrom)?;
        for bound in &self.bounds {
            write!(f, ":{}", bound)?;
        }
        Ok(())
    }
}

pub type ChainMap = HashMap<String, JunctionChain>;

/// Derive the junction chain of every transcript with exon rows in the
/// sample's gene model.
///
/// An exon row that cannot yield a transcript identifier is malformed
/// input and fails the whole sample.
pub fn extract_chains(sample: &SampleBundle) -> Result<ChainMap, PackError> {
    let mut exons_by_tid: HashMap<&str, (&str, Vec<(u64, u64)>)> = HashMap::new();

    for row in sample.gene_model.iter().filter(|r| r.is_exon()) {
        let tid = row
            .transcript_id
            .as_deref()
            .ok_or_else(|| PackError::MissingTranscriptId {
                line: row.attribute.clone(),
            })?;
        exons_by_tid
            .entry(tid)
            .or_insert_with(|| (row.chrom.as_str(), Vec::new()))
            .1
            .push((row.start, row.end));
    }

    Ok(exons_by_tid
        .into_iter()
        .map(|(tid, (chrom, exons))| (tid.to_string(), JunctionChain::from_exons(chrom, &exons)))
        .collect())
}

/// One fingerprint, one identifier, for the lifetime of a run.
#[derive(Debug, Default)]
pub struct IdRegistry {
    ids: HashMap<JunctionChain, UniversalId>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: the same chain always returns the same identifier.
    pub fn assign(&mut self, chain: &JunctionChain) -> UniversalId {
        if let Some(&uid) = self.ids.get(chain) {
            return uid;
        }
        let uid = UniversalId(self.ids.len() as u64 + FIRST_UNIVERSAL_ID);
        self.ids.insert(chain.clone(), uid);
        uid
    }

    pub fn lookup(&self, chain: &JunctionChain) -> Option<UniversalId> {
        self.ids.get(chain).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Assign universal identifiers across all samples and tag every
/// classification record.
///
/// Chain extraction runs per sample in parallel; assignment itself is one
/// sequential pass in manifest order, classification-row order within a
/// sample, so numbering is reproducible run to run. Transcripts with no
/// exon rows are recorded as identity gaps and pruned from the bundle
/// together with their junction, gene-model, and expression rows.
pub fn assign_universal_ids(
    samples: &mut [SampleBundle],
) -> Result<(IdRegistry, Diagnostics), PackError> {
    let pb = get_progress_bar(samples.len() as u64, "Extracting junction chains");

    let chain_maps = samples
        .par_iter()
        .map(|sample| {
            let chains = extract_chains(sample);
            pb.inc(1);
            chains
        })
        .collect::<Result<Vec<_>, _>>()?;

    pb.finish_and_clear();

    let mut registry = IdRegistry::new();
    let mut diagnostics = Diagnostics::default();

    for (sample, chains) in samples.iter_mut().zip(chain_maps.iter()) {
        let mut gapped: Vec<String> = Vec::new();

        for record in sample.classification.iter_mut() {
            match chains.get(&record.isoform) {
                Some(chain) => record.universal_id = Some(registry.assign(chain)),
                None => {
                    diagnostics.identity_gaps.push(IdentityGap {
                        sample: sample.name.clone(),
                        isoform: record.isoform.clone(),
                    });
                    gapped.push(record.isoform.clone());
                }
            }
        }

        if !gapped.is_empty() {
            prune_transcripts(sample, &gapped);
        }
    }

    info!(
        "Assigned {} universal identifiers across {} samples",
        registry.len(),
        samples.len()
    );

    Ok((registry, diagnostics))
}

/// Remove the named transcripts from every table of the bundle.
pub fn prune_transcripts(sample: &mut SampleBundle, dropped: &[String]) {
    let dropped: hashbrown::HashSet<&str> = dropped.iter().map(|s| s.as_str()).collect();

    sample
        .classification
        .retain(|rec| !dropped.contains(rec.isoform.as_str()));
    sample
        .junctions
        .retain(|rec| !dropped.contains(rec.isoform.as_str()));
    sample.gene_model.retain(|rec| {
        rec.transcript_id
            .as_deref()
            .map(|tid| !dropped.contains(tid))
            .unwrap_or(true)
    });
    if let Some(expression) = sample.expression.as_mut() {
        expression.retain(|rec| !dropped.contains(rec.isoform.as_str()));
    }
}

/// The per-sample transcript -> universal identifier view, for tagging
/// dependent tables on output.
pub fn uid_map(sample: &SampleBundle) -> HashMap<&str, UniversalId> {
    sample
        .classification
        .iter()
        .filter_map(|rec| rec.universal_id.map(|uid| (rec.isoform.as_str(), uid)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use annopack::record::parse_gene_model_line;
    use annopack::{Strand, StructuralCategory, Subcategory, TranscriptRecord};

    fn transcript(isoform: &str) -> TranscriptRecord {
        TranscriptRecord {
            isoform: isoform.to_string(),
            chrom: "chr1".to_string(),
            strand: Strand::Forward,
            length: 1000,
            exons: 2,
            structural_category: StructuralCategory::FullSpliceMatch,
            associated_gene: "G1".to_string(),
            associated_transcript: "TX1".to_string(),
            subcategory: Subcategory::ReferenceMatch,
            universal_id: None,
        }
    }

    fn exon(chrom: &str, start: u64, end: u64, tid: &str) -> annopack::GeneModelRecord {
        parse_gene_model_line(&format!(
            "{}\tsrc\texon\t{}\t{}\t.\t+\t.\ttranscript_id \"{}\";",
            chrom, start, end, tid
        ))
        .unwrap()
    }

    fn bundle(name: &str, transcripts: Vec<&str>, exons: Vec<annopack::GeneModelRecord>) -> SampleBundle {
        SampleBundle {
            name: name.to_string(),
            classification: transcripts.into_iter().map(transcript).collect(),
            junctions: Vec::new(),
            gene_model: exons,
            expression: None,
        }
    }

    #[test]
    fn test_chain_is_row_order_independent() {
        let forward = JunctionChain::from_exons("chr1", &[(100, 200), (300, 400)]);
        let shuffled = JunctionChain::from_exons("chr1", &[(300, 400), (100, 200)]);

        assert_eq!(forward, shuffled);
        assert_eq!(forward.bounds, vec![100, 200, 300, 400]);
    }

    #[test]
    fn test_chain_tie_on_start_sorted_by_end() {
        let a = JunctionChain::from_exons("chr1", &[(100, 300), (100, 200)]);
        let b = JunctionChain::from_exons("chr1", &[(100, 200), (100, 300)]);

        assert_eq!(a, b);
        assert_eq!(a.bounds, vec![100, 200, 100, 300]);
    }

    #[test]
    fn test_registry_idempotent_and_unique() {
        let mut registry = IdRegistry::new();
        let chain_a = JunctionChain::from_exons("chr1", &[(100, 200)]);
        let chain_b = JunctionChain::from_exons("chr2", &[(100, 200)]);

        let id_a = registry.assign(&chain_a);
        let id_b = registry.assign(&chain_b);

        assert_ne!(id_a, id_b);
        assert_eq!(registry.assign(&chain_a), id_a);
        assert_eq!(registry.lookup(&chain_b), Some(id_b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_same_chain_across_samples_shares_id() {
        let mut samples = vec![
            bundle(
                "s1",
                vec!["PB.1.1"],
                vec![exon("chr1", 100, 200, "PB.1.1"), exon("chr1", 300, 400, "PB.1.1")],
            ),
            bundle(
                "s2",
                vec!["PB.9.9"],
                vec![exon("chr1", 300, 400, "PB.9.9"), exon("chr1", 100, 200, "PB.9.9")],
            ),
        ];

        let (registry, diagnostics) = assign_universal_ids(&mut samples).unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            samples[0].classification[0].universal_id,
            samples[1].classification[0].universal_id
        );
    }

    #[test]
    fn test_assignment_order_is_deterministic() {
        let build = || {
            vec![
                bundle(
                    "s1",
                    vec!["PB.1.1", "PB.1.2"],
                    vec![
                        exon("chr1", 100, 200, "PB.1.1"),
                        exon("chr2", 500, 600, "PB.1.2"),
                    ],
                ),
            ]
        };

        let mut first = build();
        let mut second = build();
        assign_universal_ids(&mut first).unwrap();
        assign_universal_ids(&mut second).unwrap();

        assert_eq!(
            first[0].classification[0].universal_id,
            second[0].classification[0].universal_id
        );
        assert_eq!(first[0].classification[0].universal_id, Some(UniversalId(1)));
        assert_eq!(first[0].classification[1].universal_id, Some(UniversalId(2)));
    }

    #[test]
    fn test_zero_exon_transcript_is_gapped_and_pruned() {
        let mut samples = vec![bundle(
            "s1",
            vec!["PB.1.1", "PB.2.1"],
            vec![exon("chr1", 100, 200, "PB.1.1")],
        )];

        let (registry, diagnostics) = assign_universal_ids(&mut samples).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(diagnostics.identity_gaps.len(), 1);
        assert_eq!(diagnostics.identity_gaps[0].isoform, "PB.2.1");
        assert_eq!(samples[0].classification.len(), 1);
        assert_eq!(samples[0].classification[0].isoform, "PB.1.1");
    }

    #[test]
    fn test_exon_without_transcript_id_is_malformed() {
        let mut bad = exon("chr1", 100, 200, "PB.1.1");
        bad.transcript_id = None;

        let sample = bundle("s1", vec!["PB.1.1"], vec![bad]);
        let err = extract_chains(&sample).unwrap_err();

        assert!(matches!(err, PackError::MissingTranscriptId { .. }));
    }
}
