//! UniProt FASTA handling: header parsing, record streaming, byte-range
//! splitting for parallel workers

pub mod chunks;
pub mod iterator;
pub mod parser;

pub use chunks::FastaChunker;
pub use iterator::{FastaIterator, FastaRecords};
pub use parser::parse_record;
