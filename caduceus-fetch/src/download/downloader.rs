//! Concurrent download of all four source archives

use std::path::PathBuf;

use caduceus_core::config::{
    HEAD_REQUEST_TIMEOUT, LARGE_FILE_TIMEOUT, NCBI_TAXDUMP_URL, SMALL_FILE_TIMEOUT,
    UNIPROT_LARGE_FILE_CONNECTIONS, UNIPROT_SP_ISOFORMS_URL, UNIPROT_SP_URL, UNIPROT_TR_URL,
};
use caduceus_core::error::{CaduceusError, CaduceusResult};
use caduceus_core::tasks::process_tasks;
use tracing::info;

use crate::download::chunker::FileChunkCalculator;
use crate::download::client::HttpClient;

/// Downloads the Swiss-Prot, isoform and taxdump archives whole, and the
/// multi-gigabyte TrEMBL archive in [`UNIPROT_LARGE_FILE_CONNECTIONS`]
/// `Range` slices written to `<name>.<k>` part files.
pub struct Downloader {
    client: HttpClient,
    source_folder: PathBuf,
}

impl Downloader {
    pub fn new(client: HttpClient, source_folder: impl Into<PathBuf>) -> Self {
        Self {
            client,
            source_folder: source_folder.into(),
        }
    }

    pub async fn download_files(&self) -> CaduceusResult<()> {
        let mut handles = Vec::new();

        for url in [UNIPROT_SP_URL, UNIPROT_SP_ISOFORMS_URL, NCBI_TAXDUMP_URL] {
            let client = self.client.clone();
            let path = self.target_path(url)?;
            handles.push(tokio::spawn(async move {
                info!(url, "downloading");
                client
                    .download_to_file(url, &path, SMALL_FILE_TIMEOUT, None)
                    .await
                    .map_err(|err| download_error(url, err))
            }));
        }

        handles.extend(self.trembl_part_tasks().await?);

        process_tasks(handles).await
    }

    /// One task per TrEMBL byte range; parts are reassembled by the file
    /// preparer once every slice has arrived.
    async fn trembl_part_tasks(
        &self,
    ) -> CaduceusResult<Vec<tokio::task::JoinHandle<CaduceusResult<()>>>> {
        let file_size = self
            .client
            .content_length(UNIPROT_TR_URL, HEAD_REQUEST_TIMEOUT)
            .await
            .map_err(|err| download_error(UNIPROT_TR_URL, err))?;

        let calculator = FileChunkCalculator::new(file_size, UNIPROT_LARGE_FILE_CONNECTIONS);
        let base_path = self.target_path(UNIPROT_TR_URL)?;

        let mut handles = Vec::new();
        for part in 0..UNIPROT_LARGE_FILE_CONNECTIONS {
            let client = self.client.clone();
            let range = calculator.chunk_range(part);
            let path = PathBuf::from(format!("{}.{part}", base_path.display()));

            handles.push(tokio::spawn(async move {
                info!(part, start = range.start, end = range.end, "downloading TrEMBL slice");
                client
                    .download_to_file(UNIPROT_TR_URL, &path, LARGE_FILE_TIMEOUT, Some(range))
                    .await
                    .map_err(|err| download_error(UNIPROT_TR_URL, err))
            }));
        }

        Ok(handles)
    }

    fn target_path(&self, url: &str) -> CaduceusResult<PathBuf> {
        Ok(self.source_folder.join(file_name_from_url(url)?))
    }
}

fn download_error(url: &str, err: CaduceusError) -> CaduceusError {
    match err {
        CaduceusError::Network(reason) => {
            CaduceusError::Download(format!("unable to download {url}: {reason}"))
        }
        other => other,
    }
}

/// Last path segment of a URL.
pub fn file_name_from_url(url: &str) -> CaduceusResult<&str> {
    url.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CaduceusError::Download(format!("no file name in url {url}")))
}
