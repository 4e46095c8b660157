//! The endpoints the import pipeline talks to.
//!
//! [`ImportBackend`] is the seam between the orchestration in
//! [`CsvImporter`](super::importer::CsvImporter) and the network.
//! [`HttpImportBackend`] is the production implementation.

use std::time::Duration;

use adminboard_core::import::csv_file::SelectedFile;
use adminboard_core::import::payloads::{
    ConfirmReplaceRequest, PreviewSample, ProcessRequest, ReplaceOutcome, UploadSlot,
    ValidationResult,
};
use adminboard_core::import::policy::{is_ambiguous_status, ImportPolicy, PROCESSING_TIMEOUT};
use adminboard_core::records::EntityKind;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;

use super::error::ImportError;
use crate::error::ClientError;
use crate::http::{self, ApiClient};
use crate::upload::{UploadProgress, UploadStager};

/// Operations of a server collection that supports CSV bulk replace.
#[async_trait]
pub trait ImportBackend: Send + Sync {
    /// `POST <base>/presigned-url`.
    async fn request_upload_slot(&self, file: &SelectedFile) -> Result<UploadSlot, ImportError>;

    /// `PUT <presigned url>` with the raw file bytes.
    async fn put_object(
        &self,
        slot: &UploadSlot,
        file: &SelectedFile,
        bytes: Bytes,
        progress: &UploadProgress,
    ) -> Result<(), ImportError>;

    /// `POST <base>/process-csv-from-s3`. Mutating: not safe to repeat
    /// blindly.
    async fn process(&self, s3_key: &str) -> Result<(), ImportError>;

    /// `POST <base>/validate-temp`.
    async fn validate_temp(&self) -> Result<ValidationResult, ImportError>;

    /// `GET <base>/preview-temp`.
    async fn preview_temp(&self) -> Result<PreviewSample, ImportError>;

    /// `POST <base>/confirm-replace`.
    async fn confirm_replace(&self, operator: &str) -> Result<ReplaceOutcome, ImportError>;

    /// `POST <base>/cancel-upload`.
    async fn cancel_upload(&self) -> Result<(), ImportError>;
}

/// [`ImportBackend`] over the real REST API and object storage.
///
/// The processing call and the storage `PUT` carry their own request
/// timeouts from [`ImportPolicy`], so the client's general request timeout
/// never cuts them short.
#[derive(Debug, Clone)]
pub struct HttpImportBackend {
    api: ApiClient,
    stager: UploadStager,
    processing_timeout: Duration,
}

impl HttpImportBackend {
    /// Backend for the collection of `kind` (tariffs: `/api/tarifarios`).
    pub fn new(api: ApiClient, kind: EntityKind, public_base_url: &str) -> Self {
        let base_path = format!("/api/{}", kind.collection());
        let stager = UploadStager::new(api.clone(), &base_path, public_base_url);
        Self {
            api,
            stager,
            processing_timeout: PROCESSING_TIMEOUT,
        }
    }

    /// Take the processing and storage ceilings from `policy`.
    pub fn with_policy(mut self, policy: &ImportPolicy) -> Self {
        self.processing_timeout = policy.processing_timeout;
        self.stager = self.stager.with_put_timeout(policy.storage_timeout);
        self
    }

    pub fn stager(&self) -> &UploadStager {
        &self.stager
    }

    fn path(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.stager.base_path())
    }

    async fn send_process(&self, body: &ProcessRequest) -> Result<(), ClientError> {
        let response = self
            .api
            .request(Method::POST, &self.path("process-csv-from-s3"))
            .json(body)
            .timeout(self.processing_timeout)
            .send()
            .await?;
        http::check_status(response).await
    }
}

#[async_trait]
impl ImportBackend for HttpImportBackend {
    async fn request_upload_slot(&self, file: &SelectedFile) -> Result<UploadSlot, ImportError> {
        self.stager
            .request_upload_slot(file)
            .await
            .map_err(|e| ImportError::Presign(describe(&e)))
    }

    async fn put_object(
        &self,
        slot: &UploadSlot,
        file: &SelectedFile,
        bytes: Bytes,
        progress: &UploadProgress,
    ) -> Result<(), ImportError> {
        self.stager
            .stream_to_storage(slot, file, bytes, progress)
            .await
            .map_err(|e| ImportError::Transport(describe(&e)))
    }

    async fn process(&self, s3_key: &str) -> Result<(), ImportError> {
        let body = ProcessRequest {
            s3_key: s3_key.to_string(),
        };
        self.send_process(&body).await.map_err(|e| match e {
            // A lost answer may still have filled the staging table.
            ClientError::Request(ref err) if err.is_timeout() => {
                ImportError::ProcessingTimeout(self.processing_timeout)
            }
            e => match e.status() {
                Some(status) if is_ambiguous_status(status) => ImportError::ProcessingUnavailable,
                status => ImportError::Processing {
                    status,
                    message: describe(&e),
                },
            },
        })
    }

    async fn validate_temp(&self) -> Result<ValidationResult, ImportError> {
        self.api
            .post_json(&self.path("validate-temp"), &serde_json::json!({}))
            .await
            .map_err(|e| ImportError::Staging(describe(&e)))
    }

    async fn preview_temp(&self) -> Result<PreviewSample, ImportError> {
        self.api
            .get_json(&self.path("preview-temp"))
            .await
            .map_err(|e| ImportError::Staging(describe(&e)))
    }

    async fn confirm_replace(&self, operator: &str) -> Result<ReplaceOutcome, ImportError> {
        let body = ConfirmReplaceRequest {
            usuario: operator.to_string(),
        };
        self.api
            .post_json(&self.path("confirm-replace"), &body)
            .await
            .map_err(|e| ImportError::Confirm(describe(&e)))
    }

    async fn cancel_upload(&self) -> Result<(), ImportError> {
        self.api
            .post_unit(&self.path("cancel-upload"), &serde_json::json!({}))
            .await
            .map_err(|e| ImportError::Staging(describe(&e)))
    }
}

/// Server message for API errors, transport description otherwise.
fn describe(err: &ClientError) -> String {
    match err {
        ClientError::Api { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
