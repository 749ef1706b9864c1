//! Split a decompressed FASTA file into byte ranges aligned on record starts

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use caduceus_core::error::{CaduceusError, CaduceusResult};
use caduceus_core::types::ChunkRange;

/// Computes disjoint byte ranges over a FASTA file so that several workers
/// can stream it concurrently. Every range except the first begins exactly at
/// a line starting with `>`, so no record is ever split across workers.
pub struct FastaChunker {
    path: PathBuf,
    workers: usize,
}

impl FastaChunker {
    pub fn new(path: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            path: path.into(),
            workers: workers.max(1),
        }
    }

    /// Contiguous inclusive ranges covering the whole file. May return fewer
    /// ranges than workers when no further record boundary exists.
    pub fn chunk_ranges(&self) -> CaduceusResult<Vec<ChunkRange>> {
        let boundaries = self.chunk_boundaries()?;

        Ok(boundaries
            .windows(2)
            .map(|pair| ChunkRange::new(pair[0], pair[1] - 1))
            .collect())
    }

    fn chunk_boundaries(&self) -> CaduceusResult<Vec<u64>> {
        let file_size = std::fs::metadata(&self.path)
            .map_err(|err| open_error(&self.path, &err))?
            .len();

        if file_size == 0 {
            return Err(CaduceusError::Iterator(format!(
                "empty file provided: {}",
                self.path.display()
            )));
        }

        let chunk_size = file_size / self.workers as u64;

        let file = File::open(&self.path).map_err(|err| open_error(&self.path, &err))?;
        let mut reader = BufReader::new(file);

        // The first chunk starts at position 0.
        let mut boundaries: Vec<u64> = vec![0];
        let mut position = chunk_size;

        while position < file_size {
            match self.nearest_record_start(&mut reader, position)? {
                Some(boundary) => {
                    boundaries.push(boundary);
                    position = boundary + chunk_size;
                }
                None => break,
            }
        }

        boundaries.push(file_size);
        Ok(boundaries)
    }

    /// Offset of the first `>` line at or after `position`, skipping the
    /// line `position` may have landed in the middle of.
    fn nearest_record_start(
        &self,
        reader: &mut BufReader<File>,
        position: u64,
    ) -> CaduceusResult<Option<u64>> {
        reader.seek(SeekFrom::Start(position))?;

        let mut line = Vec::new();
        let skipped = reader.read_until(b'\n', &mut line)?;
        let mut offset = position + skipped as u64;

        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line)?;

            if read == 0 {
                return Ok(None);
            }

            if line.starts_with(b">") {
                return Ok(Some(offset));
            }

            offset += read as u64;
        }
    }
}

fn open_error(path: &Path, err: &std::io::Error) -> CaduceusError {
    CaduceusError::Iterator(format!("failed to open file {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fasta_file(records: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for index in 0..records {
            writeln!(file, ">sp|P{index:05}|ENTRY_{index} Test OS=X OX=1 SV=1").unwrap();
            writeln!(file, "MAGTVLGVGAGVFILALLWVAVLL").unwrap();
            writeln!(file, "CVLLSRASGAARFSVIFLFFGAVI").unwrap();
        }
        file
    }

    #[test]
    fn ranges_cover_file_exactly_without_overlap() {
        let file = fasta_file(12);
        let file_size = file.as_file().metadata().unwrap().len();

        let ranges = FastaChunker::new(file.path(), 4).chunk_ranges().unwrap();

        assert_eq!(ranges.first().unwrap().start, 0);
        assert_eq!(ranges.last().unwrap().end, file_size - 1);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
        }
    }

    #[test]
    fn every_boundary_starts_a_record() {
        let file = fasta_file(9);
        let content = std::fs::read(file.path()).unwrap();

        let ranges = FastaChunker::new(file.path(), 3).chunk_ranges().unwrap();

        for range in ranges.iter().skip(1) {
            assert_eq!(content[range.start as usize], b'>');
            assert_eq!(content[range.start as usize - 1], b'\n');
        }
    }

    #[test]
    fn single_worker_yields_one_range() {
        let file = fasta_file(3);
        let file_size = file.as_file().metadata().unwrap().len();

        let ranges = FastaChunker::new(file.path(), 1).chunk_ranges().unwrap();

        assert_eq!(ranges, vec![ChunkRange::new(0, file_size - 1)]);
    }

    #[test]
    fn more_workers_than_records_degrades_gracefully() {
        let file = fasta_file(2);

        let ranges = FastaChunker::new(file.path(), 50).chunk_ranges().unwrap();

        assert!(ranges.len() <= 2);
        assert_eq!(ranges.first().unwrap().start, 0);
    }

    #[test]
    fn missing_file_is_an_iterator_error() {
        let result = FastaChunker::new("/no/such/file.fasta", 2).chunk_ranges();
        assert!(matches!(result, Err(CaduceusError::Iterator(_))));
    }
}
