//! Bulk-copy adapter: the target-database-agnostic surface plus its
//! PostgreSQL implementation

use std::time::Duration;

use async_trait::async_trait;
use caduceus_bio::record::Record;
use caduceus_core::error::{CaduceusError, CaduceusResult};
use caduceus_core::types::Table;
use sqlx::postgres::{PgConnectOptions, PgPoolCopyExt, PgPoolOptions};
use sqlx::PgPool;
use tracing::{debug, error};

use crate::config::ConnectionPoolConfig;
use crate::queries::Queries;

/// One record marshalled into the adapter's wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRow(pub String);

/// What the lifecycle and the copier need from a database driver.
#[async_trait]
pub trait CopyAdapter: Send + Sync + 'static {
    type Pool: Clone + Send + Sync + 'static;

    /// Open a connection pool. Callers own the scope and must call
    /// [`CopyAdapter::close_pool`] on every exit path.
    async fn open_pool(&self, config: &ConnectionPoolConfig) -> CaduceusResult<Self::Pool>;

    async fn close_pool(&self, pool: &Self::Pool);

    /// Marshal a record into the positional form [`CopyAdapter::copy`]
    /// expects for its table.
    fn prepare_record_for_copy(&self, record: &Record) -> CopyRow;

    /// Bulk-copy already-marshalled rows into `table`.
    async fn copy(
        &self,
        pool: &Self::Pool,
        table: Table,
        rows: &[CopyRow],
        timeout: Duration,
    ) -> CaduceusResult<()>;

    /// Run independent queries concurrently, one connection per query.
    async fn execute_queries_async(
        &self,
        pool: &Self::Pool,
        queries: &Queries,
    ) -> CaduceusResult<()>;

    /// Run queries sequentially to preserve their order.
    async fn execute_queries_sync(&self, pool: &Self::Pool, queries: &Queries)
        -> CaduceusResult<()>;
}

/// PostgreSQL adapter on top of sqlx. Bulk load goes through the text-format
/// `COPY ... FROM STDIN` fast path.
#[derive(Debug, Default, Clone)]
pub struct PostgresAdapter;

impl PostgresAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CopyAdapter for PostgresAdapter {
    type Pool = PgPool;

    async fn open_pool(&self, config: &ConnectionPoolConfig) -> CaduceusResult<Self::Pool> {
        let options = PgConnectOptions::new()
            .host(&config.connection.host)
            .port(config.connection.port)
            .database(&config.connection.database)
            .username(&config.connection.user)
            .password(&config.connection.password);

        PgPoolOptions::new()
            .min_connections(config.min_size)
            .max_connections(config.max_size)
            .connect_with(options)
            .await
            .map_err(|err| {
                error!(error = %err, "failed to initialize pool");
                CaduceusError::ConnectionDatabase(err.to_string())
            })
    }

    async fn close_pool(&self, pool: &Self::Pool) {
        pool.close().await;
    }

    fn prepare_record_for_copy(&self, record: &Record) -> CopyRow {
        let mut row = RowBuilder::new();

        match record {
            Record::Sequence(sequence) => {
                row.push_text(sequence.source.as_str());
                row.push_bool(sequence.is_reviewed);
                row.push_text(&sequence.accession);
                row.push_text(&sequence.entry_name);
                row.push_text(&sequence.peptide_name);
                row.push_i32(sequence.ncbi_id);
                row.push_text(&sequence.organism_name);
                row.push_text(&sequence.sequence);
            }
            Record::Taxonomy(taxonomy) => {
                row.push_text(&taxonomy.rank);
                row.push_i32(taxonomy.ncbi_id);
                row.push_text(&taxonomy.tax_name);
            }
            Record::Lineage(pair) => {
                row.push_i32(pair.main_taxid);
                row.push_i32(pair.parent_taxid);
            }
            Record::Merged(pair) => {
                row.push_i32(pair.deprecated_id);
                row.push_i32(pair.current_id);
            }
        }

        row.finish()
    }

    async fn copy(
        &self,
        pool: &Self::Pool,
        table: Table,
        rows: &[CopyRow],
        timeout: Duration,
    ) -> CaduceusResult<()> {
        let transfer = async {
            let mut sink = pool
                .copy_in_raw(&format!("COPY {table} FROM STDIN"))
                .await?;

            let mut buffer = String::with_capacity(rows.iter().map(|row| row.0.len()).sum());
            for row in rows {
                buffer.push_str(&row.0);
            }

            sink.send(buffer.as_bytes()).await?;
            sink.finish().await?;
            Ok::<(), sqlx::Error>(())
        };

        match tokio::time::timeout(timeout, transfer).await {
            Ok(Ok(())) => {
                debug!(table = %table, rows = rows.len(), "copied batch");
                Ok(())
            }
            Ok(Err(err)) => {
                error!(table = %table, error = %err, "failed to copy to table");
                Err(CaduceusError::CopyToDb(format!(
                    "failed to copy {} rows to table {table}: {err}",
                    rows.len()
                )))
            }
            Err(_) => Err(CaduceusError::CopyToDb(format!(
                "copy of {} rows to table {table} timed out",
                rows.len()
            ))),
        }
    }

    async fn execute_queries_async(
        &self,
        pool: &Self::Pool,
        queries: &Queries,
    ) -> CaduceusResult<()> {
        futures::future::try_join_all(
            queries
                .flatten()
                .into_iter()
                .map(|query| execute_query(pool, query)),
        )
        .await?;

        Ok(())
    }

    async fn execute_queries_sync(
        &self,
        pool: &Self::Pool,
        queries: &Queries,
    ) -> CaduceusResult<()> {
        for query in queries.flatten() {
            execute_query(pool, query).await?;
        }

        Ok(())
    }
}

async fn execute_query(pool: &PgPool, query: &str) -> CaduceusResult<()> {
    debug!(query, "executing");

    sqlx::query(query).execute(pool).await.map_err(|err| {
        error!(query, error = %err, "failed to execute query");
        CaduceusError::QueryExecution(format!("failed to execute query {query:?}: {err}"))
    })?;

    Ok(())
}

/// Builds one text-format COPY line: tab-separated fields, `\n` terminated,
/// with backslash escaping for the delimiter characters.
struct RowBuilder {
    line: String,
    has_fields: bool,
}

impl RowBuilder {
    fn new() -> Self {
        Self {
            line: String::new(),
            has_fields: false,
        }
    }

    fn push_text(&mut self, value: &str) {
        self.start_field();
        for ch in value.chars() {
            match ch {
                '\\' => self.line.push_str("\\\\"),
                '\t' => self.line.push_str("\\t"),
                '\n' => self.line.push_str("\\n"),
                '\r' => self.line.push_str("\\r"),
                other => self.line.push(other),
            }
        }
    }

    fn push_i32(&mut self, value: i32) {
        self.start_field();
        self.line.push_str(&value.to_string());
    }

    fn push_bool(&mut self, value: bool) {
        self.start_field();
        self.line.push(if value { 't' } else { 'f' });
    }

    fn start_field(&mut self) {
        if self.has_fields {
            self.line.push('\t');
        }
        self.has_fields = true;
    }

    fn finish(mut self) -> CopyRow {
        self.line.push('\n');
        CopyRow(self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caduceus_bio::record::{LineagePair, MergedPair, SequenceRecord, SequenceSource, Taxonomy};
    use pretty_assertions::assert_eq;

    #[test]
    fn sequence_row_matches_the_uniprot_kb_column_order() {
        let record = Record::Sequence(SequenceRecord {
            source: SequenceSource::Sp,
            is_reviewed: true,
            accession: "P01308".to_string(),
            entry_name: "INS_HUMAN".to_string(),
            peptide_name: "Insulin".to_string(),
            ncbi_id: 9606,
            organism_name: "Homo sapiens".to_string(),
            sequence: "MALWMRLLPLLALLALWGPD".to_string(),
        });

        let row = PostgresAdapter::new().prepare_record_for_copy(&record);

        assert_eq!(
            row.0,
            "sp\tt\tP01308\tINS_HUMAN\tInsulin\t9606\tHomo sapiens\tMALWMRLLPLLALLALWGPD\n"
        );
    }

    #[test]
    fn taxonomy_lineage_and_merged_rows_are_positional() {
        let adapter = PostgresAdapter::new();

        let taxonomy = adapter.prepare_record_for_copy(&Record::Taxonomy(Taxonomy {
            rank: "species".to_string(),
            ncbi_id: 9606,
            tax_name: "Homo sapiens[9606]".to_string(),
        }));
        assert_eq!(taxonomy.0, "species\t9606\tHomo sapiens[9606]\n");

        let lineage = adapter.prepare_record_for_copy(&Record::Lineage(LineagePair {
            main_taxid: 9606,
            parent_taxid: 131567,
        }));
        assert_eq!(lineage.0, "9606\t131567\n");

        let merged = adapter.prepare_record_for_copy(&Record::Merged(MergedPair {
            deprecated_id: 272461,
            current_id: 9913,
        }));
        assert_eq!(merged.0, "272461\t9913\n");
    }

    #[test]
    fn delimiter_characters_are_escaped() {
        let record = Record::Taxonomy(Taxonomy {
            rank: "no rank".to_string(),
            ncbi_id: 1,
            tax_name: "odd\tname\\with\ndelimiters".to_string(),
        });

        let row = PostgresAdapter::new().prepare_record_for_copy(&record);

        assert_eq!(row.0, "no rank\t1\todd\\tname\\\\with\\ndelimiters\n");
    }

    #[test]
    fn unreviewed_rows_encode_a_false_flag() {
        let record = Record::Sequence(SequenceRecord {
            source: SequenceSource::Tr,
            is_reviewed: false,
            accession: "I7CLV3".to_string(),
            entry_name: "I7CLV3_BOVIN".to_string(),
            peptide_name: "Insulin (Fragment)".to_string(),
            ncbi_id: 9913,
            organism_name: "Bos taurus".to_string(),
            sequence: "FVNQHLCGSHLVEALYLVCG".to_string(),
        });

        let row = PostgresAdapter::new().prepare_record_for_copy(&record);

        assert!(row.0.starts_with("tr\tf\t"));
    }
}
