//! Scheduling of the file transforms with fail-fast coordination

use std::path::{Path, PathBuf};

use caduceus_core::config::{NcbiFile, UniprotFile};
use caduceus_core::error::{CaduceusError, CaduceusResult};
use caduceus_core::shutdown::ShutdownSignal;
use caduceus_core::tasks::process_tasks_with_shutdown;
use tracing::error;

use crate::prepare::files::{decompress_gz, extract_from_tar, prepare_trembl};

const SP_ARCHIVE: &str = "uniprot_sprot.fasta.gz";
const SP_ISOFORMS_ARCHIVE: &str = "uniprot_sprot_varsplic.fasta.gz";
const TREMBL_ARCHIVE: &str = "uniprot_trembl.fasta.gz";
const TAXDUMP_ARCHIVE: &str = "new_taxdump.tar.gz";

/// Prepares every file the copy phase reads: extracts the taxdump members,
/// decompresses the two small FASTA archives, and reassembles + decompresses
/// the TrEMBL parts. Preparation can be skipped entirely when the caller
/// asserts the flat files already exist.
pub struct FilePreparer {
    source_folder: PathBuf,
    preparation_is_required: bool,
}

impl FilePreparer {
    pub fn new(source_folder: impl Into<PathBuf>, preparation_is_required: bool) -> Self {
        Self {
            source_folder: source_folder.into(),
            preparation_is_required,
        }
    }

    pub async fn prepare_required_files(&self, shutdown: &ShutdownSignal) -> CaduceusResult<()> {
        if !self.preparation_is_required {
            return self.check_prepared_files_exist();
        }

        self.check_archives_exist()?;

        let transforms: Vec<(PathBuf, fn(&Path, &ShutdownSignal) -> CaduceusResult<()>)> = vec![
            (self.source_folder.join(TAXDUMP_ARCHIVE), extract_taxdump),
            (self.source_folder.join(SP_ARCHIVE), decompress_gz),
            (self.source_folder.join(SP_ISOFORMS_ARCHIVE), decompress_gz),
            (self.source_folder.join(TREMBL_ARCHIVE), prepare_trembl),
        ];

        let handles = transforms
            .into_iter()
            .map(|(path, transform)| {
                let shutdown = shutdown.clone();
                tokio::task::spawn_blocking(move || transform(&path, &shutdown))
            })
            .collect();

        process_tasks_with_shutdown(handles, shutdown, || {
            CaduceusError::FilePreparation("a neighbouring transform failed".to_string())
        })
        .await
    }

    fn check_archives_exist(&self) -> CaduceusResult<()> {
        let trembl_parts_exist = std::fs::read_dir(&self.source_folder)
            .map(|entries| {
                entries.flatten().any(|entry| {
                    entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| name.starts_with(&format!("{TREMBL_ARCHIVE}.")))
                })
            })
            .unwrap_or(false);

        if !trembl_parts_exist {
            return Err(missing_file(
                &self.source_folder.join(format!("{TREMBL_ARCHIVE}.*")),
            ));
        }

        for archive in [SP_ARCHIVE, SP_ISOFORMS_ARCHIVE, TAXDUMP_ARCHIVE] {
            self.check_file_exists(&self.source_folder.join(archive))?;
        }

        Ok(())
    }

    fn check_prepared_files_exist(&self) -> CaduceusResult<()> {
        for file in NcbiFile::ALL {
            self.check_file_exists(&self.source_folder.join(file.file_name()))?;
        }
        for file in UniprotFile::ALL {
            self.check_file_exists(&self.source_folder.join(file.file_name()))?;
        }

        Ok(())
    }

    fn check_file_exists(&self, file: &Path) -> CaduceusResult<()> {
        if !file.exists() {
            error!(file = %file.display(), "missing required file");
            return Err(missing_file(file));
        }

        Ok(())
    }
}

fn extract_taxdump(path: &Path, shutdown: &ShutdownSignal) -> CaduceusResult<()> {
    let members: Vec<&str> = NcbiFile::ALL.iter().map(|file| file.file_name()).collect();
    extract_from_tar(path, &members, shutdown)
}

fn missing_file(file: &Path) -> CaduceusError {
    CaduceusError::FilePreparation(format!("missing required file {}", file.display()))
}
