use hashbrown::{HashMap, HashSet};
use log::info;
use rayon::prelude::*;

use annopack::{SampleBundle, StructuralCategory, Subcategory};
use config::{get_progress_bar, NOVEL};

/// One collapsed group: the surviving transcript, everything merged into
/// it, and the category/subcategory that won the tie-break.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapseRecord {
    pub survivor: String,
    pub removed: Vec<String>,
    pub category: StructuralCategory,
    pub subcategory: Subcategory,
}

/// Audit trail of one sample's collapse pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleCollapse {
    pub sample: String,
    pub groups: Vec<CollapseRecord>,
}

impl SampleCollapse {
    pub fn removed_total(&self) -> usize {
        self.groups.iter().map(|g| g.removed.len()).sum()
    }
}

/// Pick the surviving member of one multi-member group.
///
/// If any full-splice-match member exists the survivor is chosen among
/// those by subcategory priority; otherwise every member competes on the
/// fragment ladder. Groups with no recognized subcategory at all fall
/// through the same fragment branch, where every member ranks equal and
/// input order decides. Ties always resolve to the earliest input row.
fn select_survivor(members: &[usize], records: &[annopack::TranscriptRecord]) -> usize {
    let fsm: Vec<usize> = members
        .iter()
        .copied()
        .filter(|&i| records[i].structural_category == StructuralCategory::FullSpliceMatch)
        .collect();

    if !fsm.is_empty() {
        return fsm
            .into_iter()
            .min_by_key(|&i| (records[i].subcategory.fsm_rank(), i))
            .unwrap();
    }

    members
        .iter()
        .copied()
        .min_by_key(|&i| (records[i].subcategory.ism_rank(), i))
        .unwrap()
}

/// Collapse redundant calls within one sample.
///
/// Partitions classification records by `associated_transcript` in
/// first-occurrence order; `novel` groups and singletons pass through.
/// Junction and gene-model rows of removed transcripts are dropped in
/// lockstep, and removed expression evidence is folded into the survivor
/// before its rows disappear.
pub fn collapse_sample(sample: &mut SampleBundle) -> SampleCollapse {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();

    for (i, rec) in sample.classification.iter().enumerate() {
        let key = rec.associated_transcript.clone();
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(i);
    }

    let mut collapsed: Vec<CollapseRecord> = Vec::new();
    let mut removed_set: HashSet<String> = HashSet::new();
    let mut survivor_of: HashMap<String, String> = HashMap::new();

    for key in &order {
        if key == NOVEL {
            continue;
        }
        let members = &groups[key];
        if members.len() == 1 {
            continue;
        }

        let survivor_idx = select_survivor(members, &sample.classification);
        let survivor = &sample.classification[survivor_idx];

        let removed: Vec<String> = members
            .iter()
            .copied()
            .filter(|&i| i != survivor_idx)
            .map(|i| sample.classification[i].isoform.clone())
            .collect();

        for name in &removed {
            removed_set.insert(name.clone());
            survivor_of.insert(name.clone(), survivor.isoform.clone());
        }

        collapsed.push(CollapseRecord {
            survivor: survivor.isoform.clone(),
            removed,
            category: survivor.structural_category,
            subcategory: survivor.subcategory.clone(),
        });
    }

    sample
        .classification
        .retain(|rec| !removed_set.contains(rec.isoform.as_str()));
    sample
        .junctions
        .retain(|rec| !removed_set.contains(rec.isoform.as_str()));
    sample.gene_model.retain(|rec| {
        rec.transcript_id
            .as_deref()
            .map(|tid| !removed_set.contains(tid))
            .unwrap_or(true)
    });

    if let Some(expression) = sample.expression.take() {
        sample.expression = Some(reaggregate_expression(
            expression,
            &survivor_of,
            &removed_set,
        ));
    }

    SampleCollapse {
        sample: sample.name.clone(),
        groups: collapsed,
    }
}

/// Fold removed transcripts' evidence into their survivors.
///
/// Rows keep the sample's input order; the survivor keeps its identifying
/// columns and accumulates every merged row's numbers. Summation follows
/// input row order so results are reproducible.
fn reaggregate_expression(
    expression: Vec<annopack::ExpressionRecord>,
    survivor_of: &HashMap<String, String>,
    removed_set: &HashSet<String>,
) -> Vec<annopack::ExpressionRecord> {
    let mut totals: HashMap<String, (f64, Option<f64>)> = HashMap::new();

    for rec in &expression {
        let owner = survivor_of
            .get(rec.isoform.as_str())
            .map(|s| s.as_str())
            .unwrap_or(rec.isoform.as_str());
        let entry = totals.entry(owner.to_string()).or_insert((0.0, None));
        entry.0 += rec.count;
        if let Some(norm) = rec.norm {
            *entry.1.get_or_insert(0.0) += norm;
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    expression
        .into_iter()
        .filter(|rec| !removed_set.contains(rec.isoform.as_str()))
        .filter_map(|mut rec| {
            if !seen.insert(rec.isoform.clone()) {
                return None;
            }
            if let Some(&(count, norm)) = totals.get(rec.isoform.as_str()) {
                rec.count = count;
                rec.norm = norm;
            }
            Some(rec)
        })
        .collect()
}

/// Collapse every sample, in parallel, returning audit records in the
/// samples' original order.
pub fn collapse_all(samples: &mut [SampleBundle]) -> Vec<SampleCollapse> {
    let pb = get_progress_bar(samples.len() as u64, "Collapsing redundant calls");

    let records: Vec<SampleCollapse> = samples
        .par_iter_mut()
        .map(|sample| {
            let record = collapse_sample(sample);
            pb.inc(1);
            record
        })
        .collect();

    pb.finish_and_clear();

    info!(
        "Collapsed {} transcripts across {} samples",
        records.iter().map(|r| r.removed_total()).sum::<usize>(),
        records.len()
    );

    records
}
