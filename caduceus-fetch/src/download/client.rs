//! Semaphore-capped HTTP client with a fixed-backoff retry loop

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use caduceus_core::config::{
    DOWNLOAD_CHUNK_SIZE, HTTP_RETRY_ATTEMPTS, HTTP_RETRY_WAIT, MAX_CONNECTIONS,
};
use caduceus_core::error::{CaduceusError, CaduceusResult};
use caduceus_core::types::ChunkRange;
use futures_util::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Outcome of one download attempt. Network failures (including bad status
/// codes) are retried; local IO failures are not.
enum AttemptError {
    Network(reqwest::Error),
    Io(std::io::Error),
}

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl HttpClient {
    pub fn new() -> CaduceusResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("caduceus/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| CaduceusError::Network(format!("failed to build client: {err}")))?;

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(MAX_CONNECTIONS)),
        })
    }

    /// GET `url` and stream the body to `path`. A `range` turns the request
    /// into a partial download via the `Range` header.
    pub async fn download_to_file(
        &self,
        url: &str,
        path: &Path,
        timeout: Duration,
        range: Option<ChunkRange>,
    ) -> CaduceusResult<()> {
        self.with_retry(url, || self.try_download_to_file(url, path, timeout, range))
            .await
    }

    /// File size in bytes from a HEAD request's `Content-Length`.
    pub async fn content_length(&self, url: &str, timeout: Duration) -> CaduceusResult<u64> {
        let response = self
            .with_retry(url, || self.try_head(url, timeout))
            .await?;

        response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| {
                CaduceusError::Network(format!("no Content-Length header available for {url}"))
            })
    }

    /// Upstream `Last-Modified` stamp from a HEAD request.
    pub async fn last_modified(&self, url: &str, timeout: Duration) -> CaduceusResult<String> {
        let response = self
            .with_retry(url, || self.try_head(url, timeout))
            .await?;

        response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                CaduceusError::Network(format!("no Last-Modified header available for {url}"))
            })
    }

    async fn try_head(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, AttemptError> {
        let _permit = self.semaphore.acquire().await.expect("semaphore closed");

        self.client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(AttemptError::Network)
    }

    async fn try_download_to_file(
        &self,
        url: &str,
        path: &Path,
        timeout: Duration,
        range: Option<ChunkRange>,
    ) -> Result<(), AttemptError> {
        let _permit = self.semaphore.acquire().await.expect("semaphore closed");

        let mut request = self.client.get(url).timeout(timeout);
        if let Some(range) = range {
            request = request.header(
                reqwest::header::RANGE,
                format!("bytes={}-{}", range.start, range.end),
            );
        }

        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(AttemptError::Network)?;

        let file = tokio::fs::File::create(path).await.map_err(AttemptError::Io)?;
        let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(AttemptError::Network)?;
            writer.write_all(&chunk).await.map_err(AttemptError::Io)?;
        }
        writer.flush().await.map_err(AttemptError::Io)?;

        debug!(url, path = %path.display(), "download finished");
        Ok(())
    }

    /// Explicit retry loop: at most [`HTTP_RETRY_ATTEMPTS`] tries with a
    /// fixed [`HTTP_RETRY_WAIT`] between them, network errors only.
    async fn with_retry<T, F, Fut>(&self, url: &str, mut attempt: F) -> CaduceusResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, AttemptError>>,
    {
        let mut tries = 0;

        loop {
            tries += 1;

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Io(err)) => return Err(CaduceusError::Io(err)),
                Err(AttemptError::Network(err)) => {
                    if tries >= HTTP_RETRY_ATTEMPTS {
                        return Err(CaduceusError::Network(format!(
                            "request to {url} failed after {tries} attempts: {err}"
                        )));
                    }

                    warn!(url, attempt = tries, error = %err, "request failed, retrying");
                    tokio::time::sleep(HTTP_RETRY_WAIT).await;
                }
            }
        }
    }
}
