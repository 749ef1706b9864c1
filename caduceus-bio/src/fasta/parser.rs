//! Single-record FASTA parsing

use caduceus_core::error::{CaduceusError, CaduceusResult};

use crate::record::{SequenceRecord, SequenceSource};

const ORGANISM_NAME_TAG: &str = " OS=";
const NCBI_ID_TAG: &str = " OX=";

/// Parse one FASTA record from its header line and gathered sequence lines.
///
/// The header has the shape
/// `>sp|A0A076FVY1|A0A076FVY1_BATSU Tyrosine-protein kinase receptor (Fragment)
/// OS=Bathyergus suillus OX=10172 GN=IGF1R PE=2 SV=1`; sequence fragments are
/// the already-trimmed lines that followed it.
pub fn parse_record(header: &str, fragments: &[String]) -> CaduceusResult<SequenceRecord> {
    parse_record_inner(header, fragments).map_err(|err| match err {
        CaduceusError::InvalidRecord(reason) => CaduceusError::InvalidRecord(format!(
            "{reason}; record: {header:?}, sequence fragments: {}",
            fragments.len()
        )),
        other => other,
    })
}

fn parse_record_inner(header: &str, fragments: &[String]) -> CaduceusResult<SequenceRecord> {
    if header.is_empty() {
        return Err(invalid("empty record header"));
    }

    let mut parts = header.splitn(3, '|');
    let prefix = parts.next().unwrap_or_default();
    let accession = parts
        .next()
        .ok_or_else(|| invalid("header has no accession part"))?;
    let biological = parts
        .next()
        .ok_or_else(|| invalid("header has no biological info part"))?;

    // sp = Swiss-Prot, sequences that were reviewed manually.
    let is_reviewed = prefix == ">sp";
    let source = sequence_source(is_reviewed, accession);

    let entry_name = biological
        .split_whitespace()
        .next()
        .ok_or_else(|| invalid("header has no entry name"))?
        .to_string();
    let biological = biological.replace(&format!("{entry_name} "), "");

    let peptide_end = biological
        .find(ORGANISM_NAME_TAG)
        .ok_or_else(|| invalid("header has no OS= tag"))?;
    let organism_end = biological
        .find(NCBI_ID_TAG)
        .ok_or_else(|| invalid("header has no OX= tag"))?;

    let peptide_name = biological[..peptide_end].to_string();
    let organism_name = biological[peptide_end..organism_end]
        .replace(ORGANISM_NAME_TAG, "")
        .to_string();
    let ncbi_id = biological[organism_end..]
        .replace(NCBI_ID_TAG, "")
        .split(' ')
        .next()
        .unwrap_or_default()
        .parse::<i32>()
        .map_err(|_| invalid("OX= tag holds no numeric taxon id"))?;

    if fragments.is_empty() {
        return Err(invalid("empty sequence"));
    }

    Ok(SequenceRecord {
        source,
        is_reviewed,
        accession: accession.to_string(),
        entry_name,
        peptide_name,
        ncbi_id,
        organism_name,
        sequence: fragments.concat(),
    })
}

fn sequence_source(is_reviewed: bool, accession: &str) -> SequenceSource {
    const ISOFORM_SUFFIX: char = '-';

    if !is_reviewed {
        SequenceSource::Tr
    } else if !accession.contains(ISOFORM_SUFFIX) {
        SequenceSource::Sp
    } else {
        SequenceSource::SpIso
    }
}

fn invalid(reason: &str) -> CaduceusError {
    CaduceusError::InvalidRecord(reason.to_string())
}
