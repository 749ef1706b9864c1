//! Phase sequencing of the target schema

use caduceus_core::error::CaduceusResult;
use tracing::{info, warn};

use crate::adapter::CopyAdapter;
use crate::queries;

/// Database operations that together constitute the UniProt schema
/// lifecycle: reset, prepare, and finalize around the bulk copy.
pub struct UniprotLifecycle<A: CopyAdapter> {
    adapter: A,
    trgm_required: bool,
}

impl<A: CopyAdapter> UniprotLifecycle<A> {
    pub fn new(adapter: A, trgm_required: bool) -> Self {
        Self {
            adapter,
            trgm_required,
        }
    }

    /// Truncate and drop whatever a previous run left behind. Errors are
    /// swallowed: the database may be absent or only partially present.
    pub async fn reset_database(&self, pool: &A::Pool) {
        match self
            .adapter
            .execute_queries_sync(pool, &queries::RESET_DATABASE)
            .await
        {
            Ok(()) => info!("cleared existing tables"),
            Err(err) => warn!(error = %err, "failed to clear existing tables, continuing"),
        }
    }

    /// Drop every object this tool creates.
    pub async fn remove_database(&self, pool: &A::Pool) -> CaduceusResult<()> {
        self.adapter
            .execute_queries_async(pool, &queries::REMOVE_DATABASE)
            .await
    }

    /// Everything that must exist before copy: extension, source enum,
    /// bare tables, comments, and the metadata attribution rows.
    pub async fn prepare_before_copy(&self, pool: &A::Pool) -> CaduceusResult<()> {
        info!("preparing database environment for copy");

        self.remove_database(pool).await?;
        self.adapter
            .execute_queries_async(pool, &queries::PREPARATION)
            .await?;
        self.adapter
            .execute_queries_async(pool, &queries::TABLE_CREATION)
            .await?;
        self.adapter
            .execute_queries_async(pool, &queries::COMMENTS)
            .await?;

        Ok(())
    }

    /// Constraints, indexes and foreign keys, in the mandatory order:
    /// taxonomy and lineage first, then the merged-id rewrite and the
    /// sequence-table constraints, then the optional trigram index.
    pub async fn finalize_after_copy(&self, pool: &A::Pool) -> CaduceusResult<()> {
        info!("creating constraints and indexes");

        self.adapter
            .execute_queries_sync(pool, &queries::TAXONOMY_AND_LINEAGE_CONSTRAINTS)
            .await?;
        self.adapter
            .execute_queries_sync(pool, &queries::UNIPROT_KB_AND_TAXONOMY_VALIDATION)
            .await?;

        if self.trgm_required {
            info!("building trigram index on the sequence column, this will take a while");
            self.adapter
                .execute_queries_sync(pool, &queries::CREATE_TRGM_IDX_ON_UNIPROT_KB)
                .await?;
        }

        Ok(())
    }
}
