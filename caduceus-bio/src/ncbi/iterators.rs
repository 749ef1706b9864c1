//! Record iterators over the NCBI dump files
//!
//! Each iterator owns its file handle and yields fully typed rows. The
//! lineage iterator performs the cartesian self+parents expansion, the
//! delnodes iterator synthesizes taxonomy rows for deleted ids, and the
//! taxonomy iterator walks `names.dmp` and `nodes.dmp` in lockstep: one
//! nodes row is consumed per kept (scientific-name) names row.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use caduceus_core::error::{CaduceusError, CaduceusResult};

use crate::ncbi::parsers::{parse_delnode, parse_lineage, parse_merged, parse_name, parse_rank};
use crate::record::{LineagePair, MergedPair, Taxonomy};

type FileLines = Lines<BufReader<File>>;

fn open_lines(path: &Path) -> CaduceusResult<FileLines> {
    let file = File::open(path).map_err(|err| {
        CaduceusError::Iterator(format!("failed to open file {}: {err}", path.display()))
    })?;
    Ok(BufReader::new(file).lines())
}

fn read_error(path: &Path, err: &std::io::Error) -> CaduceusError {
    CaduceusError::Iterator(format!("failed to read {}: {err}", path.display()))
}

/// Yields `(main, main)` followed by `(main, parent_i)` for every lineage row.
pub struct LineageRecords {
    lines: FileLines,
    pending: VecDeque<LineagePair>,
    path: PathBuf,
}

impl LineageRecords {
    pub fn open(path: impl Into<PathBuf>) -> CaduceusResult<Self> {
        let path = path.into();
        Ok(Self {
            lines: open_lines(&path)?,
            pending: VecDeque::new(),
            path,
        })
    }
}

impl Iterator for LineageRecords {
    type Item = CaduceusResult<LineagePair>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pair) = self.pending.pop_front() {
            return Some(Ok(pair));
        }

        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(err) => return Some(Err(read_error(&self.path, &err))),
        };

        let ids = match parse_lineage(&line) {
            Ok(ids) => ids,
            Err(err) => return Some(Err(err)),
        };

        for parent_taxid in ids.parent_taxids {
            self.pending.push_back(LineagePair {
                main_taxid: ids.main_taxid,
                parent_taxid,
            });
        }

        Some(Ok(LineagePair {
            main_taxid: ids.main_taxid,
            parent_taxid: ids.main_taxid,
        }))
    }
}

/// Yields deprecated/current id pairs from `merged.dmp`.
pub struct MergedRecords {
    lines: FileLines,
    path: PathBuf,
}

impl MergedRecords {
    pub fn open(path: impl Into<PathBuf>) -> CaduceusResult<Self> {
        let path = path.into();
        Ok(Self {
            lines: open_lines(&path)?,
            path,
        })
    }
}

impl Iterator for MergedRecords {
    type Item = CaduceusResult<MergedPair>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.lines.next()? {
            Ok(line) => Some(parse_merged(&line)),
            Err(err) => Some(Err(read_error(&self.path, &err))),
        }
    }
}

/// Presents deleted taxon ids as real taxonomy rows:
/// `3418941\t|` becomes `("no rank", 3418941, "deleted[3418941]")`.
pub struct DelnodesRecords {
    lines: FileLines,
    path: PathBuf,
}

impl DelnodesRecords {
    pub fn open(path: impl Into<PathBuf>) -> CaduceusResult<Self> {
        let path = path.into();
        Ok(Self {
            lines: open_lines(&path)?,
            path,
        })
    }
}

impl Iterator for DelnodesRecords {
    type Item = CaduceusResult<Taxonomy>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(err) => return Some(Err(read_error(&self.path, &err))),
        };

        Some(parse_delnode(&line).map(|deleted_id| Taxonomy {
            rank: "no rank".to_string(),
            ncbi_id: deleted_id,
            tax_name: format!("deleted[{deleted_id}]"),
        }))
    }
}

/// Joins `names.dmp` and `nodes.dmp` into taxonomy rows.
pub struct TaxonomyIterator {
    names_path: PathBuf,
    nodes_path: PathBuf,
}

impl TaxonomyIterator {
    pub fn new(names_path: impl Into<PathBuf>, nodes_path: impl Into<PathBuf>) -> Self {
        Self {
            names_path: names_path.into(),
            nodes_path: nodes_path.into(),
        }
    }

    pub fn records(&self) -> CaduceusResult<TaxonomyRecords> {
        Ok(TaxonomyRecords {
            names: open_lines(&self.names_path)?,
            nodes: open_lines(&self.nodes_path)?,
            names_path: self.names_path.clone(),
            nodes_path: self.nodes_path.clone(),
        })
    }
}

/// Live parallel walk over the two dump files.
pub struct TaxonomyRecords {
    names: FileLines,
    nodes: FileLines,
    names_path: PathBuf,
    nodes_path: PathBuf,
}

impl Iterator for TaxonomyRecords {
    type Item = CaduceusResult<Taxonomy>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let name_line = match self.names.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(read_error(&self.names_path, &err))),
            };

            let name = match parse_name(&name_line) {
                Ok(Some(name)) => name,
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            };

            let rank_line = match self.nodes.next() {
                Some(Ok(line)) => line,
                Some(Err(err)) => return Some(Err(read_error(&self.nodes_path, &err))),
                None => {
                    return Some(Err(CaduceusError::Iterator(format!(
                        "{} ended before {}",
                        self.nodes_path.display(),
                        self.names_path.display()
                    ))))
                }
            };

            let rank = match parse_rank(&rank_line) {
                Ok(rank) => rank,
                Err(err) => return Some(Err(err)),
            };

            let display = if name.specification.is_empty() {
                &name.tax_name
            } else {
                &name.specification
            };

            return Some(Ok(Taxonomy {
                rank,
                ncbi_id: name.ncbi_id,
                tax_name: format!("{display}[{}]", name.ncbi_id),
            }));
        }
    }
}
