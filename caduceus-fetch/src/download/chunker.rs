//! Byte-range assignment for the multi-connection TrEMBL download

use caduceus_core::types::ChunkRange;

/// Calculates the byte range each download connection requests.
pub struct FileChunkCalculator {
    file_size: u64,
    total_chunks: usize,
    chunk_size: u64,
}

impl FileChunkCalculator {
    pub fn new(file_size: u64, total_chunks: usize) -> Self {
        Self {
            file_size,
            total_chunks,
            chunk_size: file_size / total_chunks as u64,
        }
    }

    /// Inclusive range of chunk `number`; the last chunk absorbs the
    /// remainder of the integer division.
    pub fn chunk_range(&self, number: usize) -> ChunkRange {
        let start = self.chunk_size * number as u64;

        let end = if number < self.total_chunks - 1 {
            start + self.chunk_size - 1
        } else {
            self.file_size - 1
        };

        ChunkRange::new(start, end)
    }
}
