//! Range-bounded streaming of FASTA records

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::PathBuf;

use caduceus_core::error::{CaduceusError, CaduceusResult};
use caduceus_core::types::ChunkRange;
use tracing::debug;

use crate::fasta::parser::parse_record;
use crate::record::SequenceRecord;

/// Streams [`SequenceRecord`]s from one byte range of a FASTA file.
///
/// Without an explicit range the whole file is iterated. Ranges produced by
/// [`crate::fasta::FastaChunker`] end one byte before the next record header,
/// so the record in flight when the range end is crossed is always complete.
pub struct FastaIterator {
    path: PathBuf,
    range: Option<ChunkRange>,
}

impl FastaIterator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            range: None,
        }
    }

    pub fn with_range(path: impl Into<PathBuf>, range: ChunkRange) -> Self {
        Self {
            path: path.into(),
            range: Some(range),
        }
    }

    /// Open the file and position the cursor at the range start.
    pub fn records(&self) -> CaduceusResult<FastaRecords> {
        let range = self.resolve_range()?;

        let file = File::open(&self.path).map_err(|err| self.open_error(&err))?;
        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(range.start))
            .map_err(|err| self.open_error(&err))?;

        debug!(path = %self.path.display(), start = range.start, end = range.end, "opened fasta range");

        Ok(FastaRecords {
            reader,
            path: self.path.clone(),
            position: range.start,
            end: range.end,
            header: String::new(),
            fragments: Vec::new(),
            out: VecDeque::new(),
            finished: false,
        })
    }

    fn resolve_range(&self) -> CaduceusResult<ChunkRange> {
        if let Some(range) = self.range {
            return Ok(range);
        }

        let file_size = std::fs::metadata(&self.path)
            .map_err(|err| self.open_error(&err))?
            .len();

        if file_size == 0 {
            return Err(CaduceusError::Iterator(format!(
                "empty file provided: {}",
                self.path.display()
            )));
        }

        Ok(ChunkRange::new(0, file_size - 1))
    }

    fn open_error(&self, err: &std::io::Error) -> CaduceusError {
        CaduceusError::Iterator(format!("failed to open file {}: {err}", self.path.display()))
    }
}

/// Live iteration state over one FASTA byte range.
pub struct FastaRecords {
    reader: BufReader<File>,
    path: PathBuf,
    position: u64,
    end: u64,
    header: String,
    fragments: Vec<String>,
    out: VecDeque<CaduceusResult<SequenceRecord>>,
    finished: bool,
}

impl FastaRecords {
    fn step(&mut self) {
        let mut line = String::new();

        let read = match self.reader.read_line(&mut line) {
            Ok(read) => read,
            Err(err) => {
                self.finished = true;
                self.out.push_back(Err(CaduceusError::Iterator(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                ))));
                return;
            }
        };

        if read == 0 {
            self.finished = true;
            let final_record = self.flush_final();
            self.out.push_back(final_record);
            return;
        }

        self.position += read as u64;
        let trimmed = line.trim();

        if trimmed.starts_with('>') {
            if !self.fragments.is_empty() {
                let record = parse_record(&self.header, &self.fragments);
                self.out.push_back(record);
            }
            self.fragments.clear();
            self.header = trimmed.to_string();
        } else {
            self.fragments.push(trimmed.to_string());
        }

        // The range end has been crossed: the record in flight is complete.
        if self.position > self.end {
            self.finished = true;
            let final_record = self.flush_final();
            self.out.push_back(final_record);
        }
    }

    fn flush_final(&mut self) -> CaduceusResult<SequenceRecord> {
        parse_record(&self.header, &self.fragments).map_err(|err| {
            CaduceusError::Iterator(format!(
                "invalid file provided: {} ({err})",
                self.path.display()
            ))
        })
    }
}

impl Iterator for FastaRecords {
    type Item = CaduceusResult<SequenceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.out.is_empty() && !self.finished {
            self.step();
        }

        self.out.pop_front()
    }
}
