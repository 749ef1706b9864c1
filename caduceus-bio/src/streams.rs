//! Pairing of record producers with their destination tables

use std::path::{Path, PathBuf};

use caduceus_core::config::{NcbiFile, UniprotFile};
use caduceus_core::error::CaduceusResult;
use caduceus_core::types::{ChunkRange, Table};

use crate::fasta::{FastaIterator, FastaRecords};
use crate::ncbi::{
    DelnodesRecords, LineageRecords, MergedRecords, TaxonomyIterator, TaxonomyRecords,
};
use crate::record::Record;

/// A deferred record producer. Files are opened only when the owning copy
/// worker starts, not when the run is composed.
pub enum RecordStream {
    Fasta {
        path: PathBuf,
        range: Option<ChunkRange>,
    },
    NcbiLineage {
        path: PathBuf,
    },
    NcbiMerged {
        path: PathBuf,
    },
    NcbiDelnodes {
        path: PathBuf,
    },
    NcbiTaxonomy {
        names: PathBuf,
        nodes: PathBuf,
    },
}

impl RecordStream {
    /// Open the underlying file(s) and return the live iterator.
    pub fn open(&self) -> CaduceusResult<RecordIter> {
        match self {
            RecordStream::Fasta { path, range } => {
                let iterator = match range {
                    Some(range) => FastaIterator::with_range(path, *range),
                    None => FastaIterator::new(path),
                };
                Ok(RecordIter::Fasta(iterator.records()?))
            }
            RecordStream::NcbiLineage { path } => {
                Ok(RecordIter::Lineage(LineageRecords::open(path)?))
            }
            RecordStream::NcbiMerged { path } => Ok(RecordIter::Merged(MergedRecords::open(path)?)),
            RecordStream::NcbiDelnodes { path } => {
                Ok(RecordIter::Delnodes(DelnodesRecords::open(path)?))
            }
            RecordStream::NcbiTaxonomy { names, nodes } => Ok(RecordIter::Taxonomy(
                TaxonomyIterator::new(names, nodes).records()?,
            )),
        }
    }

    /// Short label for logs.
    pub fn describe(&self) -> String {
        match self {
            RecordStream::Fasta {
                path,
                range: Some(range),
            } => format!("{} [{}..{}]", path.display(), range.start, range.end),
            RecordStream::Fasta { path, range: None } => path.display().to_string(),
            RecordStream::NcbiLineage { path }
            | RecordStream::NcbiMerged { path }
            | RecordStream::NcbiDelnodes { path } => path.display().to_string(),
            RecordStream::NcbiTaxonomy { names, nodes } => {
                format!("{} + {}", names.display(), nodes.display())
            }
        }
    }
}

/// A live, file-backed record iterator.
pub enum RecordIter {
    Fasta(FastaRecords),
    Lineage(LineageRecords),
    Merged(MergedRecords),
    Delnodes(DelnodesRecords),
    Taxonomy(TaxonomyRecords),
}

impl Iterator for RecordIter {
    type Item = CaduceusResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RecordIter::Fasta(records) => Some(records.next()?.map(Record::from)),
            RecordIter::Lineage(records) => Some(records.next()?.map(Record::from)),
            RecordIter::Merged(records) => Some(records.next()?.map(Record::from)),
            RecordIter::Delnodes(records) => Some(records.next()?.map(Record::from)),
            RecordIter::Taxonomy(records) => Some(records.next()?.map(Record::from)),
        }
    }
}

/// One copy stream: a record producer and the table it populates.
pub struct StreamToTable {
    pub stream: RecordStream,
    pub table: Table,
}

/// The fixed pairings for every small source file. Note the deliberate
/// cross-pairings: both the delnodes stream and the names+nodes walk
/// populate the taxonomy table.
pub fn streams_for_source_folder(source_folder: &Path) -> Vec<StreamToTable> {
    vec![
        StreamToTable {
            stream: RecordStream::NcbiLineage {
                path: source_folder.join(NcbiFile::Lineage.file_name()),
            },
            table: Table::Lineage,
        },
        StreamToTable {
            stream: RecordStream::NcbiMerged {
                path: source_folder.join(NcbiFile::Merged.file_name()),
            },
            table: Table::MergedId,
        },
        StreamToTable {
            stream: RecordStream::NcbiDelnodes {
                path: source_folder.join(NcbiFile::Delnodes.file_name()),
            },
            table: Table::Taxonomy,
        },
        StreamToTable {
            stream: RecordStream::NcbiTaxonomy {
                names: source_folder.join(NcbiFile::Names.file_name()),
                nodes: source_folder.join(NcbiFile::Ranks.file_name()),
            },
            table: Table::Taxonomy,
        },
        StreamToTable {
            stream: RecordStream::Fasta {
                path: source_folder.join(UniprotFile::SwissProt.file_name()),
                range: None,
            },
            table: Table::UniprotKb,
        },
        StreamToTable {
            stream: RecordStream::Fasta {
                path: source_folder.join(UniprotFile::SpIsoforms.file_name()),
                range: None,
            },
            table: Table::UniprotKb,
        },
    ]
}

/// One TrEMBL copy stream per chunk range.
pub fn trembl_streams(source_folder: &Path, ranges: Vec<ChunkRange>) -> Vec<StreamToTable> {
    let path = source_folder.join(UniprotFile::Trembl.file_name());

    ranges
        .into_iter()
        .map(|range| StreamToTable {
            stream: RecordStream::Fasta {
                path: path.clone(),
                range: Some(range),
            },
            table: Table::UniprotKb,
        })
        .collect()
}

/// Workers dedicated to splitting TrEMBL; one slot stays reserved for the
/// small-file streams.
pub fn trembl_splitter_count(workers: usize) -> usize {
    workers.saturating_sub(1).max(1)
}
