use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{Result, anyhow, bail};

const MAX_RETRY: u32 = 10;

/// Remote archive read through HTTP Range requests
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    /// Create a reader for a remote archive.
    ///
    /// Sends a HEAD request to check Range support and learn the archive size.
    ///
    /// # Arguments
    ///
    /// * `url` - HTTP or HTTPS URL of the archive
    ///
    /// # Errors
    ///
    /// Fails when the request fails, the server does not advertise
    /// `Accept-Ranges: bytes`, or no `Content-Length` is returned.
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Self::with_client(client, url).await
    }

    /// Same as [`new`](Self::new), with a caller-configured client.
    pub async fn with_client(client: Client, url: String) -> Result<Self> {
        let resp = client.head(&url).send().await?;
        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        if !header_value(&resp, header::ACCEPT_RANGES).is_some_and(|v| v.contains("bytes")) {
            bail!("Remote server does not support Range requests");
        }

        let size = header_value(&resp, header::CONTENT_LENGTH)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))?;

        log::debug!("{} supports ranges, {} bytes", url, size);

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Fetch an inclusive byte range, retrying on timeouts and connect errors
    async fn fetch_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            let result = self
                .client
                .get(&self.url)
                .header(header::RANGE, format!("bytes={}-{}", start, end))
                .send()
                .await;

            match result {
                Ok(resp) if resp.status() == StatusCode::PARTIAL_CONTENT => {
                    return Ok(resp.bytes().await?.to_vec());
                }
                Ok(resp) => bail!("HTTP request failed with status: {}", resp.status()),
                Err(e) if e.is_timeout() || e.is_connect() => {
                    attempt += 1;
                    if attempt >= MAX_RETRY {
                        bail!("Max retries exceeded: {}", e);
                    }
                    log::warn!("Connection error, retry {}/{}: {}", attempt, MAX_RETRY, e);
                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn header_value(resp: &Response, name: header::HeaderName) -> Option<&str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let expected = (end - offset + 1) as usize;
        let mut received = 0;

        while received < expected {
            let chunk = self.fetch_range(offset + received as u64, end).await?;
            if chunk.is_empty() {
                break;
            }
            let len = chunk.len().min(expected - received);
            buf[received..received + len].copy_from_slice(&chunk[..len]);
            received += len;

            self.transferred_bytes
                .fetch_add(len as u64, Ordering::Relaxed);
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
