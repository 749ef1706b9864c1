//! Small shared value types

use std::fmt;

/// Inclusive byte range into a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Tables created in the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Metadata,
    Taxonomy,
    Lineage,
    UniprotKb,
    MergedId,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Metadata => "metadata",
            Table::Taxonomy => "taxonomy",
            Table::Lineage => "lineage",
            Table::UniprotKb => "uniprot_kb",
            Table::MergedId => "merged_id",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
