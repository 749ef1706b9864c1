//! End-to-end setup orchestration: reset → prepare → copy → finalize

use std::path::PathBuf;

use caduceus_bio::fasta::FastaChunker;
use caduceus_bio::streams::{streams_for_source_folder, trembl_splitter_count, trembl_streams};
use caduceus_core::config::{self, UniprotFile};
use caduceus_core::error::CaduceusResult;
use caduceus_core::shutdown::ShutdownSignal;
use caduceus_db::adapter::{CopyAdapter, PostgresAdapter};
use caduceus_db::config::{ConnectionConfig, ConnectionPoolConfig, QueueConfig};
use caduceus_db::copier::CopyDriver;
use caduceus_db::lifecycle::UniprotLifecycle;
use caduceus_db::sizing;
use caduceus_fetch::download::{Downloader, HttpClient};
use caduceus_fetch::prepare::{FilePreparer, SystemPreparer, SystemPreparerConfig};
use caduceus_fetch::UpdateChecker;
use tracing::{info, warn};

use crate::cli::Cli;

/// How the source data reaches the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceMode {
    /// Download archives, then prepare them.
    Download,
    /// Archives were supplied by the user; prepare them.
    Archives,
    /// Flat files were supplied by the user; use them as-is.
    PreparedFiles,
}

pub struct Setup {
    mode: SourceMode,
    clean_up_on_failure: bool,
    source_folder: PathBuf,
    workers: usize,
    adapter: PostgresAdapter,
    lifecycle: UniprotLifecycle<PostgresAdapter>,
    pool_config: ConnectionPoolConfig,
    queue_config: QueueConfig,
    update_checker: UpdateChecker,
    downloader: Downloader,
    file_preparer: FilePreparer,
    system_preparer: SystemPreparer,
}

impl Setup {
    /// Wire the whole run from the parsed CLI: probe the connection
    /// headroom, size the worker fleet, and build every collaborator.
    pub async fn compose(cli: &Cli) -> CaduceusResult<Self> {
        let (mode, source_folder) = source_mode(cli);
        let download_is_required = mode == SourceMode::Download;
        let preparation_is_required = mode != SourceMode::PreparedFiles;

        let connection = ConnectionConfig {
            host: cli.host.clone(),
            port: cli.port,
            database: cli.dbname.clone(),
            user: cli.dbuser.clone(),
            password: cli.password.clone(),
        };

        let available = sizing::available_connections_amount(&connection).await?;
        let workers = sizing::effective_workers(cli.processes as usize, available);
        info!(available, workers, "sized the worker fleet");

        let pool_config = sizing::setup_connection_pool_config(connection, workers, available);
        let queue_config = sizing::setup_queue_config(workers, available);

        let client = HttpClient::new()?;
        let stamp_path = config::last_modified_stamp_path();

        let adapter = PostgresAdapter::new();

        Ok(Self {
            mode,
            clean_up_on_failure: !cli.no_clean_up_on_failure,
            workers,
            adapter: adapter.clone(),
            lifecycle: UniprotLifecycle::new(adapter, cli.trgm),
            pool_config,
            queue_config,
            update_checker: UpdateChecker::new(client.clone(), &stamp_path),
            downloader: Downloader::new(client.clone(), &source_folder),
            file_preparer: FilePreparer::new(&source_folder, preparation_is_required),
            system_preparer: SystemPreparer::new(
                SystemPreparerConfig {
                    download_is_required,
                    trgm_required: cli.trgm,
                    accept_setup_automatically: cli.yes,
                },
                client,
                &source_folder,
                &stamp_path,
            ),
            source_folder,
        })
    }

    /// The whole run. On failure the caller decides whether
    /// [`Setup::remove_on_failure`] runs.
    pub async fn run(&mut self) -> CaduceusResult<()> {
        self.prepare().await?;
        self.copy_data().await?;
        self.finalize().await?;
        self.update_checker.save_database_update_time()?;

        info!("UniProt database setup finished");
        Ok(())
    }

    /// Remove the database and the downloaded files after a failed run.
    pub async fn remove_on_failure(&self) {
        if !self.clean_up_on_failure {
            return;
        }

        warn!("cleaning up after a failed setup");

        let removed = self
            .with_pool(|pool| async move { self.lifecycle.remove_database(&pool).await })
            .await;
        if let Err(err) = removed {
            warn!(error = %err, "failed to remove the database");
        }

        // Files the user supplied are not ours to delete.
        if self.mode == SourceMode::Download {
            if let Err(err) = self.system_preparer.delete_unnecessary_files().await {
                warn!(error = %err, "failed to delete source files");
            }
        }
    }

    async fn prepare(&mut self) -> CaduceusResult<()> {
        if self.mode == SourceMode::Download {
            // NoUpdateRequired propagates out as the normal no-op exit.
            self.update_checker.need_update().await?;
        }

        // Best-effort reset; the database may not exist yet.
        let lifecycle = &self.lifecycle;
        let reset = self
            .with_pool(|pool| async move {
                lifecycle.reset_database(&pool).await;
                Ok(())
            })
            .await;
        if let Err(err) = reset {
            warn!(error = %err, "skipping reset, database not reachable");
        }

        self.system_preparer.prepare_environment().await?;

        if self.mode == SourceMode::Download {
            self.downloader.download_files().await?;
        }

        let lifecycle = &self.lifecycle;
        self.with_pool(|pool| async move { lifecycle.prepare_before_copy(&pool).await })
            .await
    }

    async fn copy_data(&self) -> CaduceusResult<()> {
        let shutdown = ShutdownSignal::new();

        self.file_preparer
            .prepare_required_files(&shutdown)
            .await?;

        let streams = self.build_streams()?;

        CopyDriver::new(
            self.adapter.clone(),
            self.pool_config.clone(),
            self.queue_config,
            shutdown,
        )
        .copy(streams)
        .await?;

        if self.mode == SourceMode::Download {
            self.system_preparer.delete_unnecessary_files().await?;
        }

        Ok(())
    }

    /// The TrEMBL streams can only be built here: the decompressed file
    /// exists only after preparation, and its chunk ranges come from the
    /// actual file size.
    fn build_streams(&self) -> CaduceusResult<Vec<caduceus_bio::streams::StreamToTable>> {
        let mut streams = streams_for_source_folder(&self.source_folder);

        let trembl_path = self.source_folder.join(UniprotFile::Trembl.file_name());
        let splitters = trembl_splitter_count(self.workers);
        let ranges = FastaChunker::new(&trembl_path, splitters).chunk_ranges()?;
        streams.extend(trembl_streams(&self.source_folder, ranges));

        Ok(streams)
    }

    async fn finalize(&self) -> CaduceusResult<()> {
        self.with_pool(|pool| async move { self.lifecycle.finalize_after_copy(&pool).await })
            .await
    }

    /// Scoped pool: opened, handed to `operation`, closed on every path.
    async fn with_pool<F, Fut>(&self, operation: F) -> CaduceusResult<()>
    where
        F: FnOnce(<PostgresAdapter as CopyAdapter>::Pool) -> Fut,
        Fut: std::future::Future<Output = CaduceusResult<()>>,
    {
        let pool = self.adapter.open_pool(&self.pool_config).await?;
        let result = operation(pool.clone()).await;
        self.adapter.close_pool(&pool).await;
        result
    }
}

fn source_mode(cli: &Cli) -> (SourceMode, PathBuf) {
    if let Some(path) = &cli.path_to_source_files {
        (SourceMode::PreparedFiles, path.clone())
    } else if let Some(path) = &cli.path_to_source_archives {
        (SourceMode::Archives, path.clone())
    } else {
        (SourceMode::Download, config::default_source_folder())
    }
}
