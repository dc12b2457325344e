use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::PackError;

/// Stable cross-sample identifier for one junction chain.
///
/// Only equality is meaningful downstream; the number encodes nothing
/// beyond assignment order within one run.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct UniversalId(pub u64);

impl std::fmt::Display for UniversalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "isoform{}", self.0)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
    Unknown,
}

impl Strand {
    pub fn parse(value: &str) -> Self {
        match value {
            "+" => Strand::Forward,
            "-" => Strand::Reverse,
            _ => Strand::Unknown,
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}

/// Structural category called by the upstream annotation tool.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum StructuralCategory {
    FullSpliceMatch,
    IncompleteSpliceMatch,
    NovelInCatalog,
    NovelNotInCatalog,
    Genic,
    Antisense,
    Fusion,
    Intergenic,
    GenicIntron,
}

impl StructuralCategory {
    /// Both the dashed and underscored spellings occur in the wild.
    pub fn parse(value: &str) -> Result<Self, PackError> {
        match value {
            "full-splice_match" | "full_splice_match" => Ok(Self::FullSpliceMatch),
            "incomplete-splice_match" | "incomplete_splice_match" => {
                Ok(Self::IncompleteSpliceMatch)
            }
            "novel_in_catalog" => Ok(Self::NovelInCatalog),
            "novel_not_in_catalog" => Ok(Self::NovelNotInCatalog),
            "genic" => Ok(Self::Genic),
            "antisense" => Ok(Self::Antisense),
            "fusion" => Ok(Self::Fusion),
            "intergenic" => Ok(Self::Intergenic),
            "genic_intron" => Ok(Self::GenicIntron),
            _ => Err(PackError::BadField {
                table: "classification",
                field: "structural_category",
                value: value.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for StructuralCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::FullSpliceMatch => "full-splice_match",
            Self::IncompleteSpliceMatch => "incomplete-splice_match",
            Self::NovelInCatalog => "novel_in_catalog",
            Self::NovelNotInCatalog => "novel_not_in_catalog",
            Self::Genic => "genic",
            Self::Antisense => "antisense",
            Self::Fusion => "fusion",
            Self::Intergenic => "intergenic",
            Self::GenicIntron => "genic_intron",
        };
        write!(f, "{}", label)
    }
}

/// Finer-grained tag; only meaningful within the two splice-match categories.
///
/// Unrecognized values are carried verbatim and rank below every named
/// variant in both priority ladders.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum Subcategory {
    ReferenceMatch,
    Alternative5End,
    Alternative3End,
    Alternative3End5End,
    FivePrimeFragment,
    ThreePrimeFragment,
    InternalFragment,
    MonoExon,
    Other(String),
}

impl Subcategory {
    pub fn parse(value: &str) -> Self {
        match value {
            "reference_match" => Self::ReferenceMatch,
            "alternative_5end" => Self::Alternative5End,
            "alternative_3end" => Self::Alternative3End,
            "alternative_3end5end" => Self::Alternative3End5End,
            "5prime_fragment" => Self::FivePrimeFragment,
            "3prime_fragment" => Self::ThreePrimeFragment,
            "internal_fragment" => Self::InternalFragment,
            "mono-exon" => Self::MonoExon,
            other => Self::Other(other.to_string()),
        }
    }

    /// Tie-break priority among full-splice-match members; lower wins.
    pub fn fsm_rank(&self) -> usize {
        match self {
            Self::ReferenceMatch => 0,
            Self::Alternative5End => 1,
            Self::Alternative3End => 2,
            Self::Alternative3End5End => 3,
            _ => 4,
        }
    }

    /// Tie-break priority among fragment members; lower wins.
    pub fn ism_rank(&self) -> usize {
        match self {
            Self::FivePrimeFragment => 0,
            Self::ThreePrimeFragment => 1,
            Self::InternalFragment => 2,
            _ => 3,
        }
    }
}

impl std::fmt::Display for Subcategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::ReferenceMatch => "reference_match",
            Self::Alternative5End => "alternative_5end",
            Self::Alternative3End => "alternative_3end",
            Self::Alternative3End5End => "alternative_3end5end",
            Self::FivePrimeFragment => "5prime_fragment",
            Self::ThreePrimeFragment => "3prime_fragment",
            Self::InternalFragment => "internal_fragment",
            Self::MonoExon => "mono-exon",
            Self::Other(other) => other.as_str(),
        };
        write!(f, "{}", label)
    }
}

/// One called isoform within one sample.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub isoform: String,
    pub chrom: String,
    pub strand: Strand,
    pub length: u64,
    pub exons: u64,
    pub structural_category: StructuralCategory,
    pub associated_gene: String,
    pub associated_transcript: String,
    pub subcategory: Subcategory,
    pub universal_id: Option<UniversalId>,
}

impl TranscriptRecord {
    pub fn uid_header() -> &'static str {
        "isoform\tchrom\tstrand\tlength\texons\tstructural_category\tassociated_gene\tassociated_transcript\tsubcategory\tuniversal_id"
    }

    pub fn to_uid_row(&self) -> String {
        let uid = self
            .universal_id
            .map(|u| u.to_string())
            .unwrap_or_else(|| "NA".to_string());
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.isoform,
            self.chrom,
            self.strand,
            self.length,
            self.exons,
            self.structural_category,
            self.associated_gene,
            self.associated_transcript,
            self.subcategory,
            uid,
        )
    }
}

/// One splice junction belonging to a transcript.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct JunctionRecord {
    pub isoform: String,
    pub chrom: String,
    pub strand: Strand,
    pub start: u64,
    pub end: u64,
}

impl JunctionRecord {
    pub fn uid_header() -> &'static str {
        "isoform\tchrom\tstrand\tgenomic_start_coord\tgenomic_end_coord\tuniversal_id"
    }
}

/// One exon-level row of the gene-model file.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct GeneModelRecord {
    pub chrom: String,
    pub source: String,
    pub feature: String,
    pub start: u64,
    pub end: u64,
    pub score: Option<f64>,
    pub strand: Strand,
    pub frame: Option<u8>,
    pub attribute: String,
    pub transcript_id: Option<String>,
}

impl GeneModelRecord {
    pub fn is_exon(&self) -> bool {
        self.feature == "exon"
    }
}

/// Per-transcript numeric evidence; raw count always, normalized optionally.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ExpressionRecord {
    pub isoform: String,
    pub count: f64,
    pub norm: Option<f64>,
}

impl ExpressionRecord {
    /// The value the evidence matrix consumes.
    pub fn evidence(&self) -> f64 {
        self.norm.unwrap_or(self.count)
    }
}

/// Header-indexed column lookup for the tab-separated tables.
pub struct ColumnIndex {
    cols: HashMap<String, usize>,
    table: &'static str,
}

impl ColumnIndex {
    pub fn new(header: &str, table: &'static str) -> Self {
        let cols = header
            .split('\t')
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        Self { cols, table }
    }

    pub fn get<'a>(
        &self,
        fields: &'a [&'a str],
        column: &'static str,
    ) -> Result<&'a str, PackError> {
        let idx = *self.cols.get(column).ok_or(PackError::MissingColumn {
            table: self.table,
            column,
        })?;
        fields.get(idx).copied().ok_or(PackError::BadField {
            table: self.table,
            field: column,
            value: String::new(),
        })
    }
}

pub(crate) fn parse_u64(
    value: &str,
    table: &'static str,
    field: &'static str,
) -> Result<u64, PackError> {
    value.trim().parse::<u64>().map_err(|_| PackError::BadField {
        table,
        field,
        value: value.to_string(),
    })
}

pub(crate) fn parse_f64(
    value: &str,
    table: &'static str,
    field: &'static str,
) -> Result<f64, PackError> {
    value.trim().parse::<f64>().map_err(|_| PackError::BadField {
        table,
        field,
        value: value.to_string(),
    })
}

/// Parse one classification row against its header.
pub fn parse_transcript_row(
    fields: &[&str],
    cols: &ColumnIndex,
) -> Result<TranscriptRecord, PackError> {
    Ok(TranscriptRecord {
        isoform: cols.get(fields, "isoform")?.to_string(),
        chrom: cols.get(fields, "chrom")?.to_string(),
        strand: Strand::parse(cols.get(fields, "strand")?),
        length: parse_u64(cols.get(fields, "length")?, "classification", "length")?,
        exons: parse_u64(cols.get(fields, "exons")?, "classification", "exons")?,
        structural_category: StructuralCategory::parse(cols.get(fields, "structural_category")?)?,
        associated_gene: cols.get(fields, "associated_gene")?.to_string(),
        associated_transcript: cols.get(fields, "associated_transcript")?.to_string(),
        subcategory: Subcategory::parse(cols.get(fields, "subcategory")?),
        universal_id: None,
    })
}

/// Parse one junction row against its header.
pub fn parse_junction_row(
    fields: &[&str],
    cols: &ColumnIndex,
) -> Result<JunctionRecord, PackError> {
    Ok(JunctionRecord {
        isoform: cols.get(fields, "isoform")?.to_string(),
        chrom: cols.get(fields, "chrom")?.to_string(),
        strand: Strand::parse(cols.get(fields, "strand")?),
        start: parse_u64(
            cols.get(fields, "genomic_start_coord")?,
            "junctions",
            "genomic_start_coord",
        )?,
        end: parse_u64(
            cols.get(fields, "genomic_end_coord")?,
            "junctions",
            "genomic_end_coord",
        )?,
    })
}

/// Pull a transcript identifier out of a gene-model attribute string.
///
/// Handles both `transcript_id "x";` and `transcript_id=x;` spellings.
pub fn transcript_id_from_attr(attr: &str) -> Option<String> {
    for field in attr.split(';') {
        let field = field.trim();
        if !field.contains("transcript_id") {
            continue;
        }
        if let Some(quoted) = field.split('"').nth(1) {
            return Some(quoted.to_string());
        }
        if let Some(eq) = field.splitn(2, '=').nth(1) {
            let eq = eq.trim().trim_matches('"');
            if !eq.is_empty() {
                return Some(eq.to_string());
            }
        }
    }
    None
}

/// Parse one 9-column gene-model line.
pub fn parse_gene_model_line(line: &str) -> Result<GeneModelRecord, PackError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < config::GTF_FIELDS {
        return Err(PackError::BadGeneModelLine {
            line: line.to_string(),
        });
    }

    let score = match fields[5] {
        "." => None,
        value => Some(parse_f64(value, "gene-model", "score")?),
    };
    let frame = match fields[7] {
        "." => None,
        value => value.trim().parse::<u8>().ok(),
    };

    Ok(GeneModelRecord {
        chrom: fields[0].to_string(),
        source: fields[1].to_string(),
        feature: fields[2].to_string(),
        start: parse_u64(fields[3], "gene-model", "start")?,
        end: parse_u64(fields[4], "gene-model", "end")?,
        score,
        strand: Strand::parse(fields[6]),
        frame,
        attribute: fields[8].to_string(),
        transcript_id: transcript_id_from_attr(fields[8]),
    })
}

/// Parse one headerless expression row: `isoform<TAB>count`.
pub fn parse_expression_line(line: &str) -> Result<ExpressionRecord, PackError> {
    let mut fields = line.split('\t');
    let isoform = fields
        .next()
        .filter(|f| !f.is_empty())
        .ok_or_else(|| PackError::BadExpressionLine {
            line: line.to_string(),
        })?;
    let count = fields.next().ok_or_else(|| PackError::BadExpressionLine {
        line: line.to_string(),
    })?;

    Ok(ExpressionRecord {
        isoform: isoform.to_string(),
        count: parse_f64(count, "expression", "count")?,
        norm: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_category_both_spellings() {
        assert_eq!(
            StructuralCategory::parse("full-splice_match").unwrap(),
            StructuralCategory::FullSpliceMatch
        );
        assert_eq!(
            StructuralCategory::parse("full_splice_match").unwrap(),
            StructuralCategory::FullSpliceMatch
        );
        assert!(StructuralCategory::parse("garbage").is_err());
    }

    #[test]
    fn test_subcategory_rank_orders() {
        assert!(
            Subcategory::ReferenceMatch.fsm_rank() < Subcategory::Alternative5End.fsm_rank()
        );
        assert!(
            Subcategory::Alternative5End.fsm_rank() < Subcategory::Alternative3End.fsm_rank()
        );
        assert!(
            Subcategory::Alternative3End.fsm_rank() < Subcategory::Alternative3End5End.fsm_rank()
        );

        assert!(
            Subcategory::FivePrimeFragment.ism_rank() < Subcategory::ThreePrimeFragment.ism_rank()
        );
        assert!(
            Subcategory::ThreePrimeFragment.ism_rank() < Subcategory::InternalFragment.ism_rank()
        );
    }

    #[test]
    fn test_unknown_subcategory_ranks_last() {
        let odd = Subcategory::parse("something_new");
        assert_eq!(odd, Subcategory::Other("something_new".to_string()));
        assert!(odd.fsm_rank() > Subcategory::Alternative3End5End.fsm_rank());
        assert!(odd.ism_rank() > Subcategory::InternalFragment.ism_rank());
    }

    #[test]
    fn test_parse_transcript_row() {
        let header = "isoform\tchrom\tstrand\tlength\texons\tstructural_category\tassociated_gene\tassociated_transcript\tsubcategory";
        let cols = ColumnIndex::new(header, "classification");
        let line = "PB.1.1\tchr1\t+\t1500\t3\tfull-splice_match\tGENE1\tTX1\treference_match";
        let fields: Vec<&str> = line.split('\t').collect();

        let rec = parse_transcript_row(&fields, &cols).unwrap();
        assert_eq!(rec.isoform, "PB.1.1");
        assert_eq!(rec.structural_category, StructuralCategory::FullSpliceMatch);
        assert_eq!(rec.subcategory, Subcategory::ReferenceMatch);
        assert_eq!(rec.length, 1500);
        assert_eq!(rec.universal_id, None);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let header = "isoform\tchrom\tstrand";
        let cols = ColumnIndex::new(header, "classification");
        let fields = vec!["PB.1.1", "chr1", "+"];

        let err = parse_transcript_row(&fields, &cols).unwrap_err();
        match err {
            PackError::MissingColumn { table, column } => {
                assert_eq!(table, "classification");
                assert_eq!(column, "length");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_transcript_id_from_attr() {
        assert_eq!(
            transcript_id_from_attr("gene_id \"G1\"; transcript_id \"PB.1.1\";"),
            Some("PB.1.1".to_string())
        );
        assert_eq!(
            transcript_id_from_attr("ID=ex1;transcript_id=PB.2.1"),
            Some("PB.2.1".to_string())
        );
        assert_eq!(transcript_id_from_attr("gene_id \"G1\";"), None);
    }

    #[test]
    fn test_parse_gene_model_line() {
        let line = "chr1\tPacBio\texon\t100\t200\t.\t+\t.\tgene_id \"G1\"; transcript_id \"PB.1.1\";";
        let rec = parse_gene_model_line(line).unwrap();

        assert!(rec.is_exon());
        assert_eq!(rec.start, 100);
        assert_eq!(rec.end, 200);
        assert_eq!(rec.transcript_id.as_deref(), Some("PB.1.1"));
        assert_eq!(rec.strand, Strand::Forward);
    }

    #[test]
    fn test_parse_expression_line() {
        let rec = parse_expression_line("PB.1.1\t42.0").unwrap();
        assert_eq!(rec.isoform, "PB.1.1");
        assert_eq!(rec.count, 42.0);
        assert_eq!(rec.norm, None);
        assert_eq!(rec.evidence(), 42.0);

        assert!(parse_expression_line("PB.1.1").is_err());
        assert!(parse_expression_line("PB.1.1\tnot_a_number").is_err());
    }

    #[test]
    fn test_universal_id_display() {
        assert_eq!(UniversalId(7).to_string(), "isoform7");
    }
}
