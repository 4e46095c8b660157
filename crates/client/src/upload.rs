//! Direct-to-storage uploads through presigned URLs.
//!
//! The backend hands out a presigned write URL and object key; the file
//! bytes then go straight to object storage with a `PUT`, never through
//! the application server. No checksum is verified after the upload.

use std::sync::Arc;
use std::time::Duration;

use adminboard_core::import::csv_file::SelectedFile;
use adminboard_core::import::payloads::{PresignRequest, UploadSlot};
use adminboard_core::import::policy::STORAGE_PUT_TIMEOUT;
use bytes::Bytes;
use tokio::sync::watch;

use crate::error::ClientResult;
use crate::http::{self, ApiClient};

/// Size of the chunks handed to the transport; progress is reported once
/// per chunk.
pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Publishes upload progress (0–100) to any number of observers.
#[derive(Debug, Clone)]
pub struct UploadProgress {
    tx: Arc<watch::Sender<u8>>,
}

impl Default for UploadProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadProgress {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> u8 {
        *self.tx.borrow()
    }

    /// Report `sent` of `total` bytes.
    pub fn report(&self, sent: u64, total: u64) {
        self.tx.send_replace(percent(sent, total));
    }

    pub fn reset(&self) {
        self.tx.send_replace(0);
    }
}

/// Integer percentage, floored, with an empty body counting as done.
pub fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) * 100) / total) as u8
}

// ---------------------------------------------------------------------------
// Stager
// ---------------------------------------------------------------------------

/// Moves a file from memory to object storage for one backend collection
/// (e.g. `/api/tarifarios`).
#[derive(Debug, Clone)]
pub struct UploadStager {
    api: ApiClient,
    base_path: String,
    public_base_url: String,
    put_timeout: Duration,
}

impl UploadStager {
    /// * `base_path`       - collection path, e.g. `/api/tarifarios`.
    /// * `public_base_url` - storage base URL object keys are appended to.
    pub fn new(api: ApiClient, base_path: &str, public_base_url: &str) -> Self {
        Self {
            api,
            base_path: base_path.trim_end_matches('/').to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            put_timeout: STORAGE_PUT_TIMEOUT,
        }
    }

    /// Ceiling on the storage `PUT`. Replaces the client's general request
    /// timeout for that one request.
    pub fn with_put_timeout(mut self, limit: Duration) -> Self {
        self.put_timeout = limit;
        self
    }

    pub fn put_timeout(&self) -> Duration {
        self.put_timeout
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Ask the backend for a presigned write URL for `file`.
    pub async fn request_upload_slot(&self, file: &SelectedFile) -> ClientResult<UploadSlot> {
        let body = PresignRequest {
            filename: file.name.clone(),
            filetype: file.mime.clone(),
        };
        let slot: UploadSlot = self
            .api
            .post_json(&format!("{}/presigned-url", self.base_path), &body)
            .await?;
        tracing::debug!(key = %slot.key, "Obtained presigned upload URL");
        Ok(slot)
    }

    /// `PUT` the raw bytes to the presigned URL, reporting progress as
    /// chunks are handed to the transport.
    ///
    /// The request carries no backend credentials: the URL itself is the
    /// credential.
    pub async fn stream_to_storage(
        &self,
        slot: &UploadSlot,
        file: &SelectedFile,
        bytes: Bytes,
        progress: &UploadProgress,
    ) -> ClientResult<()> {
        let total = bytes.len() as u64;
        progress.reset();

        let chunks: Vec<Bytes> = (0..bytes.len())
            .step_by(UPLOAD_CHUNK_BYTES)
            .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_BYTES).min(bytes.len())))
            .collect();

        let reporter = progress.clone();
        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            reporter.report(sent, total);
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let response = self
            .api
            .http()
            .put(&slot.url)
            .header(reqwest::header::CONTENT_TYPE, file.mime.as_str())
            .header(reqwest::header::CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream))
            .timeout(self.put_timeout)
            .send()
            .await?;
        http::check_status(response).await?;

        progress.report(total, total);
        tracing::info!(key = %slot.key, bytes = total, "Upload to storage complete");
        Ok(())
    }

    /// Public URL of an uploaded object.
    pub fn public_url(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        if self.public_base_url.is_empty() {
            key.to_string()
        } else {
            format!("{}/{key}", self.public_base_url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn stager(public_base_url: &str) -> UploadStager {
        let api = ApiClient::with_client(reqwest::Client::new(), &ClientConfig::default());
        UploadStager::new(api, "/api/tarifarios/", public_base_url)
    }

    #[test]
    fn percent_floors_and_caps() {
        assert_eq!(percent(0, 200), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(200, 200), 100);
        assert_eq!(percent(500, 200), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn progress_is_observable() {
        let progress = UploadProgress::new();
        let rx = progress.subscribe();
        progress.report(50, 100);
        assert_eq!(*rx.borrow(), 50);
        progress.reset();
        assert_eq!(progress.current(), 0);
    }

    #[test]
    fn public_url_appends_key_to_base() {
        let stager = stager("https://cdn.example.com/bucket/");
        assert_eq!(
            stager.public_url("/tarifarios/a.csv"),
            "https://cdn.example.com/bucket/tarifarios/a.csv"
        );
        assert_eq!(stager.base_path(), "/api/tarifarios");
    }

    #[test]
    fn put_timeout_defaults_to_storage_ceiling() {
        let stager = stager("");
        assert_eq!(stager.put_timeout(), STORAGE_PUT_TIMEOUT);
        let stager = stager.with_put_timeout(Duration::from_secs(5));
        assert_eq!(stager.put_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn public_url_without_base_is_the_key() {
        assert_eq!(stager("").public_url("k.csv"), "k.csv");
    }
}
