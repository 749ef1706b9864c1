//! Pre-flight environment work: disk-space estimate, folders, cleanup

use std::io::Write;
use std::path::PathBuf;

use caduceus_core::config::{
    HEAD_REQUEST_TIMEOUT, NCBI_TAXDUMP_URL, UNIPROT_SP_ISOFORMS_URL, UNIPROT_SP_URL,
    UNIPROT_TR_URL,
};
use caduceus_core::error::{CaduceusError, CaduceusResult};
use tracing::{info, warn};

use crate::download::client::HttpClient;

/// Ratio between compressed archives and their decompressed size.
const DECOMPRESSION_COEFF: f64 = 1.96;
/// Database size relative to the downloaded data, without / with the
/// trigram index on the sequence column.
const DB_COEFF: f64 = 1.12;
const DB_TRGM_COEFF: f64 = 2.25;
/// Fallback estimate (GB) when the upstream sizes cannot be determined.
const FALLBACK_FILE_SIZE_GB: f64 = 96.0;
/// Slack so the host keeps working while archives are processed.
const SYSTEM_SLACK_BYTES: f64 = 1e10;

const BYTES_IN_GB: f64 = 1_073_741_824.0;

#[derive(Debug, Clone, Copy)]
pub struct SystemPreparerConfig {
    pub download_is_required: bool,
    pub trgm_required: bool,
    pub accept_setup_automatically: bool,
}

/// Prepares the host for a setup run and cleans it afterwards.
pub struct SystemPreparer {
    config: SystemPreparerConfig,
    client: HttpClient,
    source_folder: PathBuf,
    stamp_path: PathBuf,
}

impl SystemPreparer {
    pub fn new(
        config: SystemPreparerConfig,
        client: HttpClient,
        source_folder: impl Into<PathBuf>,
        stamp_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            client,
            source_folder: source_folder.into(),
            stamp_path: stamp_path.into(),
        }
    }

    pub async fn prepare_environment(&self) -> CaduceusResult<()> {
        let file_size_bytes = self.required_space_for_files().await?;
        let file_size_gb = file_size_bytes / BYTES_IN_GB;

        if !self.config.accept_setup_automatically {
            let database_size_gb = self.estimate_database_size(file_size_gb);
            self.confirm_disk_usage(file_size_gb, database_size_gb)?;
        }

        if self.config.download_is_required {
            self.create_required_folders()?;
        }

        Ok(())
    }

    /// Remove everything in the source folder (after a successful copy, or
    /// while cleaning up a failed run).
    pub async fn delete_unnecessary_files(&self) -> CaduceusResult<()> {
        let entries = match std::fs::read_dir(&self.source_folder) {
            Ok(entries) => entries,
            Err(_) => return Ok(()),
        };

        for entry in entries.flatten() {
            info!(file = %entry.path().display(), "removing file");
            if let Err(err) = std::fs::remove_file(entry.path()) {
                warn!(file = %entry.path().display(), error = %err, "unable to remove file");
            }
        }

        Ok(())
    }

    async fn required_space_for_files(&self) -> CaduceusResult<f64> {
        if !self.config.download_is_required {
            return Ok(0.0);
        }

        let total = self.total_upstream_size().await? as f64;
        let required = total * DECOMPRESSION_COEFF + SYSTEM_SLACK_BYTES;

        self.verify_disk_space(required)?;
        Ok(required)
    }

    async fn total_upstream_size(&self) -> CaduceusResult<u64> {
        let sizes = futures::future::try_join_all(
            [
                UNIPROT_TR_URL,
                UNIPROT_SP_URL,
                NCBI_TAXDUMP_URL,
                UNIPROT_SP_ISOFORMS_URL,
            ]
            .into_iter()
            .map(|url| self.client.content_length(url, HEAD_REQUEST_TIMEOUT)),
        )
        .await?;

        Ok(sizes.into_iter().sum())
    }

    fn estimate_database_size(&self, file_size_gb: f64) -> f64 {
        let coeff = if self.config.trgm_required {
            DB_TRGM_COEFF
        } else {
            DB_COEFF
        };

        let file_size_gb = if file_size_gb == 0.0 {
            FALLBACK_FILE_SIZE_GB
        } else {
            file_size_gb
        };

        coeff * file_size_gb
    }

    fn confirm_disk_usage(&self, file_size_gb: f64, database_size_gb: f64) -> CaduceusResult<()> {
        let setup_size_gb = file_size_gb + file_size_gb / DECOMPRESSION_COEFF;

        loop {
            print!(
                "The files to download will take approximately {file_size_gb:.2} GB.\n\
                 The setup process will take approximately {setup_size_gb:.2} GB.\n\
                 The resulting database will take approximately {database_size_gb:.2} GB. \
                 Proceed (y/n)? "
            );
            std::io::stdout().flush().ok();

            let mut answer = String::new();
            std::io::stdin()
                .read_line(&mut answer)
                .map_err(CaduceusError::Io)?;

            match answer.trim().to_lowercase().as_str() {
                "y" | "" => return Ok(()),
                "n" => return Err(CaduceusError::Setup("setup cancelled by user".to_string())),
                _ => println!("Input must be 'y' or 'n'"),
            }
        }
    }

    fn verify_disk_space(&self, required_bytes: f64) -> CaduceusResult<()> {
        let Some(free_space) = available_disk_space() else {
            warn!("unable to determine free disk space, continuing without the check");
            return Ok(());
        };

        if (free_space as f64) < required_bytes {
            return Err(CaduceusError::NotEnoughSpace);
        }

        Ok(())
    }

    fn create_required_folders(&self) -> CaduceusResult<()> {
        info!(folder = %self.source_folder.display(), "creating source folder");
        std::fs::create_dir_all(&self.source_folder)?;

        info!(stamp = %self.stamp_path.display(), "creating update stamp");
        if !self.stamp_path.exists() {
            std::fs::write(&self.stamp_path, "")?;
        }

        Ok(())
    }
}

/// Free bytes on the disk holding the working directory.
fn available_disk_space() -> Option<u64> {
    let current_dir = std::env::current_dir().ok()?;
    let disks = sysinfo::Disks::new_with_refreshed_list();

    disks
        .list()
        .iter()
        .filter(|disk| current_dir.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| disk.available_space())
}
