use std::fmt::Debug;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use config::get_progress_bar;
use log::info;
use rayon::prelude::*;
use thiserror::Error;

pub mod diagnostics;
pub mod record;

pub use diagnostics::{Diagnostics, ExpressionMismatch, IdentityGap, MetadataConflict};
pub use record::{
    ExpressionRecord, GeneModelRecord, JunctionRecord, Strand, StructuralCategory, Subcategory,
    TranscriptRecord, UniversalId,
};

use record::{
    parse_expression_line, parse_gene_model_line, parse_junction_row, parse_transcript_row,
    ColumnIndex,
};

/// Malformed-input taxonomy; every variant aborts the run before any
/// output is written.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("missing required column '{column}' in {table} table")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("cannot parse {table} field '{field}' from value '{value}'")]
    BadField {
        table: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("malformed gene-model line (expected 9 tab-separated fields): {line}")]
    BadGeneModelLine { line: String },
    #[error("gene-model exon row without a transcript identifier: {line}")]
    MissingTranscriptId { line: String },
    #[error("malformed expression line (expected isoform<TAB>count): {line}")]
    BadExpressionLine { line: String },
    #[error("malformed manifest row (expected 3-4 path fields): {line}")]
    BadManifestRow { line: String },
    #[error("empty {table} table")]
    EmptyTable { table: &'static str },
    #[error("error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// One row of the input manifest: where a sample's tables live on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub sample: String,
    pub classification: PathBuf,
    pub junctions: PathBuf,
    pub gene_model: PathBuf,
    pub expression: Option<PathBuf>,
}

/// All tables of one sample, typed and ready for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBundle {
    pub name: String,
    pub classification: Vec<TranscriptRecord>,
    pub junctions: Vec<JunctionRecord>,
    pub gene_model: Vec<GeneModelRecord>,
    pub expression: Option<Vec<ExpressionRecord>>,
}

impl SampleBundle {
    pub fn has_expression(&self) -> bool {
        self.expression.is_some()
    }
}

fn reader<P: AsRef<Path> + Debug>(file: P) -> Result<String, PackError> {
    let path = format!("{:?}", file);
    let mut handle = File::open(&file).map_err(|e| PackError::Io {
        path: path.clone(),
        source: e,
    })?;
    let mut contents = String::new();
    handle
        .read_to_string(&mut contents)
        .map_err(|e| PackError::Io { path, source: e })?;
    Ok(contents)
}

/// Derive the sample name from its classification file path.
///
/// `heart_classification.txt` -> `heart`; a stem without the suffix is
/// used as-is.
pub fn sample_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    stem.strip_suffix(config::CLASSIFICATION_STEM)
        .map(|s| s.to_string())
        .unwrap_or(stem)
}

/// Read the headerless manifest: one sample per row, 3-4 path columns.
pub fn read_manifest<P: AsRef<Path> + Debug>(path: P) -> Result<Vec<ManifestEntry>, PackError> {
    let contents = reader(&path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < config::MANIFEST_MIN_FIELDS || fields.len() > config::MANIFEST_MAX_FIELDS
        {
            return Err(PackError::BadManifestRow {
                line: line.to_string(),
            });
        }

        let classification = PathBuf::from(fields[0]);
        entries.push(ManifestEntry {
            sample: sample_name_from_path(&classification),
            classification,
            junctions: PathBuf::from(fields[1]),
            gene_model: PathBuf::from(fields[2]),
            expression: fields.get(3).map(PathBuf::from),
        });
    }

    if entries.is_empty() {
        return Err(PackError::EmptyTable { table: "manifest" });
    }

    Ok(entries)
}

/// Parse a classification table: header row + one record per line.
pub fn parse_classification(contents: &str) -> Result<Vec<TranscriptRecord>, PackError> {
    let mut lines = contents.lines();
    let header = lines
        .next()
        .ok_or(PackError::EmptyTable {
            table: "classification",
        })?;
    let cols = ColumnIndex::new(header, "classification");

    lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            parse_transcript_row(&fields, &cols)
        })
        .collect()
}

/// Parse a junction table: header row + one record per line.
pub fn parse_junctions(contents: &str) -> Result<Vec<JunctionRecord>, PackError> {
    let mut lines = contents.lines();
    let header = lines.next().ok_or(PackError::EmptyTable { table: "junctions" })?;
    let cols = ColumnIndex::new(header, "junctions");

    lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            parse_junction_row(&fields, &cols)
        })
        .collect()
}

/// Parse a gene-model file, skipping comment lines.
pub fn parse_gene_model(contents: &str) -> Result<Vec<GeneModelRecord>, PackError> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(parse_gene_model_line)
        .collect()
}

/// Parse a headerless expression table.
pub fn parse_expression(contents: &str) -> Result<Vec<ExpressionRecord>, PackError> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_expression_line)
        .collect()
}

/// Load one sample's bundle from its manifest entry.
pub fn load_sample(entry: &ManifestEntry) -> Result<SampleBundle, PackError> {
    let classification = parse_classification(&reader(&entry.classification)?)?;
    let junctions = parse_junctions(&reader(&entry.junctions)?)?;
    let gene_model = parse_gene_model(&reader(&entry.gene_model)?)?;
    let expression = match &entry.expression {
        Some(path) => Some(parse_expression(&reader(path)?)?),
        None => None,
    };

    Ok(SampleBundle {
        name: entry.sample.clone(),
        classification,
        junctions,
        gene_model,
        expression,
    })
}

/// Load every sample in the manifest, in parallel, preserving manifest
/// order in the returned vector.
pub fn load_samples(entries: &[ManifestEntry]) -> Result<Vec<SampleBundle>, PackError> {
    let pb = get_progress_bar(entries.len() as u64, "Loading samples");

    let bundles = entries
        .par_iter()
        .map(|entry| {
            let bundle = load_sample(entry);
            pb.inc(1);
            bundle
        })
        .collect::<Result<Vec<_>, _>>();

    pb.finish_and_clear();

    if let Ok(bundles) = &bundles {
        info!(
            "Loaded {} samples, {} transcripts total",
            bundles.len(),
            bundles.iter().map(|b| b.classification.len()).sum::<usize>()
        );
    }

    bundles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_name_from_path() {
        assert_eq!(
            sample_name_from_path(Path::new("/data/heart_classification.txt")),
            "heart"
        );
        assert_eq!(sample_name_from_path(Path::new("liver.txt")), "liver");
    }

    #[test]
    fn test_parse_classification_roundtrip() {
        let table = "isoform\tchrom\tstrand\tlength\texons\tstructural_category\tassociated_gene\tassociated_transcript\tsubcategory\n\
                     PB.1.1\tchr1\t+\t1000\t2\tfull-splice_match\tG1\tTX1\treference_match\n\
                     PB.1.2\tchr1\t+\t800\t2\tincomplete-splice_match\tG1\tTX1\t5prime_fragment\n";
        let records = parse_classification(table).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].isoform, "PB.1.1");
        assert_eq!(records[1].subcategory, Subcategory::FivePrimeFragment);
    }

    #[test]
    fn test_parse_junctions() {
        let table = "isoform\tchrom\tstrand\tgenomic_start_coord\tgenomic_end_coord\n\
                     PB.1.1\tchr1\t+\t200\t300\n";
        let records = parse_junctions(table).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].start, 200);
        assert_eq!(records[0].end, 300);
    }

    #[test]
    fn test_parse_gene_model_skips_comments() {
        let contents = "#comment\n\
                        chr1\tsrc\texon\t100\t200\t.\t+\t.\ttranscript_id \"PB.1.1\";\n\
                        chr1\tsrc\ttranscript\t100\t400\t.\t+\t.\ttranscript_id \"PB.1.1\";\n";
        let records = parse_gene_model(contents).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records[0].is_exon());
        assert!(!records[1].is_exon());
    }

    #[test]
    fn test_read_manifest_rejects_short_rows() {
        let dir = std::env::temp_dir().join("annopack_manifest_test");
        std::fs::create_dir_all(&dir).unwrap();
        let manifest = dir.join("manifest.tsv");
        std::fs::write(&manifest, "only_one_field\n").unwrap();

        let err = read_manifest(&manifest).unwrap_err();
        assert!(matches!(err, PackError::BadManifestRow { .. }));
    }
}
