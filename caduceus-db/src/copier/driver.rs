//! Parent-side orchestration of the copy worker fleet

use caduceus_bio::streams::StreamToTable;
use caduceus_core::config::COPY_BATCH_SIZE;
use caduceus_core::error::{CaduceusError, CaduceusResult};
use caduceus_core::shutdown::ShutdownSignal;
use caduceus_core::tasks::process_tasks_with_shutdown;
use tracing::info;

use crate::adapter::CopyAdapter;
use crate::config::{ConnectionPoolConfig, QueueConfig};
use crate::copier::batch::BatchCopier;

/// Spawns one [`BatchCopier`] per `(stream, table)` pairing on its own OS
/// thread and awaits the fleet with first-error semantics: the first failure
/// sets the shutdown signal and cancels workers that have not started.
pub struct CopyDriver<A: CopyAdapter + Clone> {
    adapter: A,
    pool_config: ConnectionPoolConfig,
    queue_config: QueueConfig,
    shutdown: ShutdownSignal,
    batch_size: usize,
}

impl<A: CopyAdapter + Clone> CopyDriver<A> {
    pub fn new(
        adapter: A,
        pool_config: ConnectionPoolConfig,
        queue_config: QueueConfig,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            adapter,
            pool_config,
            queue_config,
            shutdown,
            batch_size: COPY_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub async fn copy(&self, streams: Vec<StreamToTable>) -> CaduceusResult<()> {
        info!(workers = streams.len(), "starting parallel copy");

        let handles = streams
            .into_iter()
            .map(|stream| {
                let copier = BatchCopier::new(
                    self.adapter.clone(),
                    self.batch_size,
                    self.pool_config.clone(),
                    self.queue_config,
                    stream,
                    self.shutdown.clone(),
                );
                tokio::task::spawn_blocking(move || copier.run())
            })
            .collect();

        process_tasks_with_shutdown(handles, &self.shutdown, || {
            CaduceusError::CopyToDb(
                "a copy worker signalled failure without surfacing an error".to_string(),
            )
        })
        .await?;

        info!("parallel copy finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::CopyRow;
    use crate::config::ConnectionConfig;
    use crate::queries::Queries;
    use async_trait::async_trait;
    use caduceus_bio::record::Record;
    use caduceus_bio::streams::RecordStream;
    use caduceus_core::types::Table;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct CountingAdapter {
        rows_copied: Arc<AtomicUsize>,
        fail_table: Option<Table>,
    }

    #[async_trait]
    impl CopyAdapter for CountingAdapter {
        type Pool = ();

        async fn open_pool(&self, _config: &ConnectionPoolConfig) -> CaduceusResult<()> {
            Ok(())
        }

        async fn close_pool(&self, _pool: &()) {}

        fn prepare_record_for_copy(&self, _record: &Record) -> CopyRow {
            CopyRow("row\n".to_string())
        }

        async fn copy(
            &self,
            _pool: &(),
            table: Table,
            rows: &[CopyRow],
            _timeout: Duration,
        ) -> CaduceusResult<()> {
            if self.fail_table == Some(table) {
                return Err(CaduceusError::CopyToDb("wire copy rejected".to_string()));
            }
            self.rows_copied.fetch_add(rows.len(), Ordering::SeqCst);
            Ok(())
        }

        async fn execute_queries_async(&self, _pool: &(), _queries: &Queries) -> CaduceusResult<()> {
            Ok(())
        }

        async fn execute_queries_sync(&self, _pool: &(), _queries: &Queries) -> CaduceusResult<()> {
            Ok(())
        }
    }

    fn fasta_stream(dir: &TempDir, name: &str, records: usize, table: Table) -> StreamToTable {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for index in 0..records {
            writeln!(file, ">sp|{name}{index:04}|E_X Test OS=Homo sapiens OX=9606 SV=1").unwrap();
            writeln!(file, "MALWMRLLPLLALLALWGPD").unwrap();
        }

        StreamToTable {
            stream: RecordStream::Fasta { path, range: None },
            table,
        }
    }

    fn driver(adapter: CountingAdapter, shutdown: ShutdownSignal) -> CopyDriver<CountingAdapter> {
        let pool_config = ConnectionPoolConfig {
            connection: ConnectionConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "uniprot".to_string(),
                user: "postgres".to_string(),
                password: "password".to_string(),
            },
            min_size: 1,
            max_size: 2,
        };

        CopyDriver::new(adapter, pool_config, QueueConfig::new(4, 2), shutdown)
            .with_batch_size(3)
    }

    #[tokio::test]
    async fn every_stream_is_copied() {
        let dir = TempDir::new().unwrap();
        let adapter = CountingAdapter::default();
        let rows_copied = adapter.rows_copied.clone();

        driver(adapter, ShutdownSignal::new())
            .copy(vec![
                fasta_stream(&dir, "A", 7, Table::UniprotKb),
                fasta_stream(&dir, "B", 5, Table::UniprotKb),
            ])
            .await
            .unwrap();

        assert_eq!(rows_copied.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn one_failing_stream_fails_the_fleet_and_sets_shutdown() {
        let dir = TempDir::new().unwrap();
        let adapter = CountingAdapter {
            fail_table: Some(Table::Taxonomy),
            ..Default::default()
        };
        let shutdown = ShutdownSignal::new();

        let result = driver(adapter, shutdown.clone())
            .copy(vec![
                fasta_stream(&dir, "A", 7, Table::UniprotKb),
                fasta_stream(&dir, "B", 5, Table::Taxonomy),
            ])
            .await;

        assert!(matches!(result, Err(CaduceusError::CopyToDb(_))));
        assert!(shutdown.is_set());
    }
}
