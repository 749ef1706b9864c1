//! Typed rows produced by the corpus parsers

use std::fmt;

/// Where a sequence came from. TrEMBL holds unreviewed entries (`tr`),
/// Swiss-Prot holds manually reviewed ones (`sp`), and the varsplic file
/// holds reviewed isoforms (`sp_iso`). `tr_iso` exists in the database enum
/// but the header classifier never assigns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceSource {
    Sp,
    Tr,
    SpIso,
    TrIso,
}

impl SequenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceSource::Sp => "sp",
            SequenceSource::Tr => "tr",
            SequenceSource::SpIso => "sp_iso",
            SequenceSource::TrIso => "tr_iso",
        }
    }
}

impl fmt::Display for SequenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One UniProt KB entry, e.g.
/// `>sp|P01308|INS_HUMAN Insulin OS=Homo sapiens OX=9606 GN=INS PE=1 SV=1`
/// followed by its sequence lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub source: SequenceSource,
    pub is_reviewed: bool,
    pub accession: String,
    pub entry_name: String,
    pub peptide_name: String,
    pub ncbi_id: i32,
    pub organism_name: String,
    pub sequence: String,
}

/// One NCBI taxonomy row. `tax_name` is canonicalized as
/// `<display>[<ncbi_id>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    pub rank: String,
    pub ncbi_id: i32,
    pub tax_name: String,
}

/// Taxon / ancestor pair from the lineage dump. Every taxon also pairs with
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineagePair {
    pub main_taxid: i32,
    pub parent_taxid: i32,
}

/// Deprecated / current taxon id pair, used once during finalize to rewrite
/// stale organism ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedPair {
    pub deprecated_id: i32,
    pub current_id: i32,
}

/// Any row flowing through the copy pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Sequence(SequenceRecord),
    Taxonomy(Taxonomy),
    Lineage(LineagePair),
    Merged(MergedPair),
}

impl From<SequenceRecord> for Record {
    fn from(record: SequenceRecord) -> Self {
        Record::Sequence(record)
    }
}

impl From<Taxonomy> for Record {
    fn from(record: Taxonomy) -> Self {
        Record::Taxonomy(record)
    }
}

impl From<LineagePair> for Record {
    fn from(record: LineagePair) -> Self {
        Record::Lineage(record)
    }
}

impl From<MergedPair> for Record {
    fn from(record: MergedPair) -> Self {
        Record::Merged(record)
    }
}
