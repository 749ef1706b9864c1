//! Upstream update detection via the Swiss-Prot `Last-Modified` header

use std::path::PathBuf;

use caduceus_core::config::{HEAD_REQUEST_TIMEOUT, UNIPROT_SP_URL};
use caduceus_core::error::{CaduceusError, CaduceusResult};
use tracing::{debug, info};

use crate::download::client::HttpClient;

/// Compares the upstream `Last-Modified` stamp with the locally stored one
/// and short-circuits the run when nothing changed.
pub struct UpdateChecker {
    client: HttpClient,
    url: String,
    stamp_path: PathBuf,
    current_modification_date: Option<String>,
}

impl UpdateChecker {
    pub fn new(client: HttpClient, stamp_path: impl Into<PathBuf>) -> Self {
        Self::with_url(client, UNIPROT_SP_URL, stamp_path)
    }

    pub fn with_url(
        client: HttpClient,
        url: impl Into<String>,
        stamp_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            stamp_path: stamp_path.into(),
            current_modification_date: None,
        }
    }

    /// Returns `Ok(())` when a new upstream release is available and
    /// `Err(NoUpdateRequired)` when the stored stamp still matches.
    pub async fn need_update(&mut self) -> CaduceusResult<()> {
        info!("checking for upstream updates");

        let current = self
            .client
            .last_modified(&self.url, HEAD_REQUEST_TIMEOUT)
            .await?;
        debug!(last_modified = %current, "upstream modification date");
        self.current_modification_date = Some(current.clone());

        match self.previous_modification_date() {
            Some(previous) if previous == current => {
                info!("UniProt database is up to date");
                Err(CaduceusError::NoUpdateRequired)
            }
            _ => {
                info!(version = %current, "new upstream version available");
                Ok(())
            }
        }
    }

    /// Persist the stamp observed by [`need_update`]; called only after a
    /// fully successful setup.
    pub fn save_database_update_time(&self) -> CaduceusResult<()> {
        if let Some(stamp) = &self.current_modification_date {
            std::fs::write(&self.stamp_path, stamp)?;
        }

        Ok(())
    }

    fn previous_modification_date(&self) -> Option<String> {
        let stored = std::fs::read_to_string(&self.stamp_path).ok()?;
        let line = stored.lines().next()?.to_string();
        (!line.is_empty()).then_some(line)
    }
}
