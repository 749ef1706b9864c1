//! Streaming parsers for the UniProt FASTA and NCBI taxdump corpora

pub mod fasta;
pub mod ncbi;
pub mod record;
pub mod streams;

pub use record::{LineagePair, MergedPair, Record, SequenceRecord, SequenceSource, Taxonomy};
pub use streams::{
    streams_for_source_folder, trembl_splitter_count, trembl_streams, RecordIter, RecordStream,
    StreamToTable,
};
