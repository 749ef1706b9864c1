//! NCBI taxdump handling: `.dmp` dialect parsers and record iterators
//!
//! Every dump file is tab-separated with a `\t|\t` column delimiter and a
//! trailing `\t|`.

pub mod iterators;
pub mod parsers;

pub use iterators::{
    DelnodesRecords, LineageRecords, MergedRecords, TaxonomyIterator, TaxonomyRecords,
};
pub use parsers::{
    parse_delnode, parse_lineage, parse_merged, parse_name, parse_rank, LineageTaxonomyIds,
    NameData,
};
