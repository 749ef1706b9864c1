//! Row parsers for the five NCBI dump files

use caduceus_core::error::{CaduceusError, CaduceusResult};

use crate::record::MergedPair;

const COLUMN_DELIMITER: &str = "\t|\t";
const ROW_TERMINATOR: &str = "\t|";
const SCIENTIFIC_NAME_TAG: &str = "|\tscientific name\t|";

/// A known misprint in the upstream corpus; the quote breaks the column
/// layout downstream.
const MISPRINTED_NAME: &str = "'Beach rock 4+5\"'";
const FIXED_NAME: &str = "'Beach rock 4+5'";

/// Scientific-name row of `names.dmp`, e.g.
/// `2\t|\tBacteria\t|\tBacteria <bacteria>\t|\tscientific name\t|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameData {
    pub ncbi_id: i32,
    pub tax_name: String,
    pub specification: String,
}

/// Main taxid plus every ancestor taxid of one `taxidlineage.dmp` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageTaxonomyIds {
    pub main_taxid: i32,
    pub parent_taxids: Vec<i32>,
}

/// Extract the rank (third column) from a `nodes.dmp` row.
pub fn parse_rank(record: &str) -> CaduceusResult<String> {
    record
        .trim()
        .split(COLUMN_DELIMITER)
        .nth(2)
        .map(str::to_string)
        .ok_or_else(|| malformed("nodes.dmp", record))
}

/// Parse a `names.dmp` row. Rows without the scientific-name tag are not
/// wanted and map to `None`.
pub fn parse_name(record: &str) -> CaduceusResult<Option<NameData>> {
    if !record.contains(SCIENTIFIC_NAME_TAG) {
        return Ok(None);
    }

    let record = record.replace(MISPRINTED_NAME, FIXED_NAME);
    let mut parts = record.trim().split(COLUMN_DELIMITER);

    let ncbi_id = parts
        .next()
        .and_then(|raw| raw.parse::<i32>().ok())
        .ok_or_else(|| malformed("names.dmp", &record))?;
    let tax_name = parts
        .next()
        .ok_or_else(|| malformed("names.dmp", &record))?
        .to_string();
    let specification = parts
        .next()
        .ok_or_else(|| malformed("names.dmp", &record))?
        .to_string();

    Ok(Some(NameData {
        ncbi_id,
        tax_name,
        specification,
    }))
}

/// Parse a `taxidlineage.dmp` row: the main taxid and a space-separated
/// ancestor list, e.g. `12345\t|\t1 2 3 4 \t|`.
pub fn parse_lineage(record: &str) -> CaduceusResult<LineageTaxonomyIds> {
    let mut parts = record.trim().split(COLUMN_DELIMITER);

    let main_taxid = parts
        .next()
        .and_then(|raw| raw.parse::<i32>().ok())
        .ok_or_else(|| malformed("taxidlineage.dmp", record))?;

    let parent_taxids = parts
        .next()
        .ok_or_else(|| malformed("taxidlineage.dmp", record))?
        .replace('|', "")
        .split_whitespace()
        .map(|raw| {
            raw.parse::<i32>()
                .map_err(|_| malformed("taxidlineage.dmp", record))
        })
        .collect::<CaduceusResult<Vec<i32>>>()?;

    Ok(LineageTaxonomyIds {
        main_taxid,
        parent_taxids,
    })
}

/// Parse a `merged.dmp` row, e.g. `12\t|\t74109\t|` (deprecated, current).
pub fn parse_merged(record: &str) -> CaduceusResult<MergedPair> {
    let mut parts = record.trim().split(COLUMN_DELIMITER);

    let deprecated_id = parts
        .next()
        .and_then(|raw| raw.parse::<i32>().ok())
        .ok_or_else(|| malformed("merged.dmp", record))?;
    let current_id = parts
        .next()
        .map(|raw| raw.replace(ROW_TERMINATOR, ""))
        .and_then(|raw| raw.parse::<i32>().ok())
        .ok_or_else(|| malformed("merged.dmp", record))?;

    Ok(MergedPair {
        deprecated_id,
        current_id,
    })
}

/// Parse a `delnodes.dmp` row, a single taxid like `3418941\t|`.
pub fn parse_delnode(record: &str) -> CaduceusResult<i32> {
    record
        .trim()
        .replace(ROW_TERMINATOR, "")
        .parse::<i32>()
        .map_err(|_| malformed("delnodes.dmp", record))
}

fn malformed(file: &str, record: &str) -> CaduceusError {
    CaduceusError::InvalidRecord(format!(
        "malformed {file} row, the file might be damaged: {record:?}"
    ))
}
