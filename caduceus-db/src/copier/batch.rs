//! Per-stream batching and enqueueing of copy tasks
//!
//! One batch copier runs on one dedicated OS thread with its own
//! single-threaded runtime and its own connection pool; copiers share
//! nothing but the shutdown signal.

use std::time::Duration;

use caduceus_bio::streams::StreamToTable;
use caduceus_core::error::{CaduceusError, CaduceusResult};
use caduceus_core::shutdown::ShutdownSignal;
use tracing::debug;

use crate::adapter::{CopyAdapter, CopyRow};
use crate::config::{ConnectionPoolConfig, QueueConfig};
use crate::copier::queue::AsyncQueueManager;

const COPY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BatchCopier<A: CopyAdapter + Clone> {
    adapter: A,
    batch_size: usize,
    pool_config: ConnectionPoolConfig,
    queue_config: QueueConfig,
    stream: StreamToTable,
    shutdown: ShutdownSignal,
}

impl<A: CopyAdapter + Clone> BatchCopier<A> {
    pub fn new(
        adapter: A,
        batch_size: usize,
        pool_config: ConnectionPoolConfig,
        queue_config: QueueConfig,
        stream: StreamToTable,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            adapter,
            batch_size,
            pool_config,
            queue_config,
            stream,
            shutdown,
        }
    }

    /// Entry point for the worker thread: builds the thread's own runtime
    /// and drives the whole stream through it.
    pub fn run(self) -> CaduceusResult<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| CaduceusError::CopyToDb(format!("failed to build runtime: {err}")))?;

        let result = runtime.block_on(self.copy_stream());

        if let Err(err) = &result {
            if !matches!(err, CaduceusError::NeighbouringProcess) {
                self.shutdown.set();
            }
        }

        result
    }

    async fn copy_stream(&self) -> CaduceusResult<()> {
        debug!(stream = %self.stream.stream.describe(), table = %self.stream.table, "starting copy stream");

        let pool = self.adapter.open_pool(&self.pool_config).await?;
        let manager = AsyncQueueManager::start(self.queue_config, self.shutdown.clone());

        let produced = self.enqueue_record_batches(&pool, &manager).await;
        let drained = manager.finish().await;

        self.adapter.close_pool(&pool).await;

        match produced {
            Err(err) => Err(err),
            Ok(()) => drained,
        }
    }

    async fn enqueue_record_batches(
        &self,
        pool: &A::Pool,
        manager: &AsyncQueueManager,
    ) -> CaduceusResult<()> {
        let records = self.stream.stream.open()?;
        let mut rows: Vec<CopyRow> = Vec::with_capacity(self.batch_size);

        for record in records {
            let record = record?;
            rows.push(self.adapter.prepare_record_for_copy(&record));

            if rows.len() >= self.batch_size {
                self.enqueue_batch(pool, manager, &mut rows).await?;
            }
        }

        // Flush the partial tail batch.
        self.enqueue_batch(pool, manager, &mut rows).await
    }

    async fn enqueue_batch(
        &self,
        pool: &A::Pool,
        manager: &AsyncQueueManager,
        rows: &mut Vec<CopyRow>,
    ) -> CaduceusResult<()> {
        if self.shutdown.is_set() {
            return Err(CaduceusError::NeighbouringProcess);
        }

        if rows.is_empty() {
            return Ok(());
        }

        debug!(rows = rows.len(), table = %self.stream.table, "enqueueing copy batch");

        let batch = std::mem::take(rows);
        let adapter = self.adapter.clone();
        let pool = pool.clone();
        let table = self.stream.table;
        let shutdown = self.shutdown.clone();

        let task = tokio::spawn(async move {
            adapter
                .copy(&pool, table, &batch, COPY_TIMEOUT)
                .await
                .map_err(|err| {
                    shutdown.set();
                    err
                })
        });

        manager.enqueue_task(task).await.map_err(|err| {
            self.shutdown.set();
            err
        })
    }
}
