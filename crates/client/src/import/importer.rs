//! Drives one import session against an [`ImportBackend`].
//!
//! Every method takes `&mut self`: a [`CsvImporter`] runs at most one
//! upload at a time, and the session it owns only moves through
//! [`ImportSession::apply`].

use adminboard_core::error::CoreError;
use adminboard_core::import::csv_file::SelectedFile;
use adminboard_core::import::payloads::{ReplaceOutcome, UploadSlot, ValidationResult};
use adminboard_core::import::{
    ImportEvent, ImportPolicy, ImportSession, ImportStage, ReplaceAcknowledgement,
};
use bytes::Bytes;
use tokio::sync::watch;

use super::backend::ImportBackend;
use super::error::ImportError;
use crate::upload::UploadProgress;

/// Bulk-replace workflow for one collection.
pub struct CsvImporter<B> {
    backend: B,
    policy: ImportPolicy,
    operator: String,
    session: ImportSession,
    progress: UploadProgress,
}

impl<B: ImportBackend> CsvImporter<B> {
    /// * `operator` - user name recorded by `confirm-replace`.
    pub fn new(backend: B, operator: impl Into<String>) -> Self {
        Self {
            backend,
            policy: ImportPolicy::default(),
            operator: operator.into(),
            session: ImportSession::new(),
            progress: UploadProgress::new(),
        }
    }

    pub fn with_policy(mut self, policy: ImportPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn session(&self) -> &ImportSession {
        &self.session
    }

    pub fn policy(&self) -> &ImportPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Live storage-upload progress (0–100).
    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), ImportError> {
        self.session.apply(ImportEvent::FileSelected(file))?;
        self.progress.reset();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Upload
    // -----------------------------------------------------------------------

    /// Upload the selected file and stage it server-side.
    ///
    /// On success the session is in the validate stage (or back in select
    /// if the staged data failed validation). On failure the session is
    /// back in select with an error notice, and the error is returned.
    pub async fn upload(&mut self, bytes: Bytes) -> Result<(), ImportError> {
        let file = self
            .session
            .file()
            .cloned()
            .ok_or_else(|| CoreError::Validation("Select a CSV file before uploading".into()))?;
        self.session.apply(ImportEvent::UploadStarted)?;

        tracing::info!(
            session_id = %self.session.id(),
            file = %file.name,
            size_bytes = file.size_bytes,
            "Starting CSV upload",
        );

        let staged = self.stage_with_retries(&file, bytes).await;
        self.session
            .apply(ImportEvent::UploadProgressed(self.progress.current()))?;

        let (s3_key, recovered) = match staged {
            Ok(staged) => staged,
            Err(err) => {
                tracing::error!(
                    session_id = %self.session.id(),
                    error = %err,
                    "CSV upload failed",
                );
                self.session
                    .apply(ImportEvent::UploadFailed(err.user_message()))?;
                return Err(err);
            }
        };

        self.session.apply(ImportEvent::Staged {
            s3_key: s3_key.clone(),
        })?;

        let validation = match recovered {
            Some(validation) => validation,
            None => match self.backend.validate_temp().await {
                Ok(validation) => validation,
                Err(err) => {
                    // Staged but unreadable: stay in validate so "Verify
                    // Data" can pick it up.
                    tracing::warn!(
                        session_id = %self.session.id(),
                        s3_key = %s3_key,
                        error = %err,
                        "Validation of staged data failed",
                    );
                    self.session
                        .apply(ImportEvent::ValidationUnavailable(err.user_message()))?;
                    return Err(err);
                }
            },
        };

        tracing::info!(
            session_id = %self.session.id(),
            s3_key = %s3_key,
            is_valid = validation.is_valid,
            total_rows = validation.total_rows,
            "Staged data validated",
        );
        self.session.apply(ImportEvent::Validated(validation))?;
        Ok(())
    }

    /// Outer loop: presign, `PUT` and process as one unit, each attempt
    /// with a fresh upload slot.
    ///
    /// Returns the object key and, when an ambiguous processing failure was
    /// recovered by verification, the validation that proved it.
    async fn stage_with_retries(
        &self,
        file: &SelectedFile,
        bytes: Bytes,
    ) -> Result<(String, Option<ValidationResult>), ImportError> {
        let retry = self.policy.upload;
        let mut attempt = 1;

        loop {
            match self.stage_once(file, bytes.clone()).await {
                Ok(staged) => return Ok(staged),
                Err(err) if retry.has_attempts_after(attempt) => {
                    let delay = retry.delay_after(attempt);
                    tracing::warn!(
                        session_id = %self.session.id(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Upload attempt failed, retrying",
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn stage_once(
        &self,
        file: &SelectedFile,
        bytes: Bytes,
    ) -> Result<(String, Option<ValidationResult>), ImportError> {
        let slot = self.backend.request_upload_slot(file).await?;
        self.put_with_timeout(&slot, file, bytes).await?;
        let recovered = self.process_with_retries(&slot.key).await?;
        Ok((slot.key, recovered))
    }

    async fn put_with_timeout(
        &self,
        slot: &UploadSlot,
        file: &SelectedFile,
        bytes: Bytes,
    ) -> Result<(), ImportError> {
        let limit = self.policy.storage_timeout;
        tokio::time::timeout(
            limit,
            self.backend.put_object(slot, file, bytes, &self.progress),
        )
        .await
        .map_err(|_| ImportError::Transport(format!("no response within {}s", limit.as_secs())))?
    }

    /// Inner loop around the mutating processing call.
    ///
    /// A 503 or a timeout is never retried blindly: after the grace delay
    /// the staged data is checked, and if present the call counts as
    /// succeeded.
    async fn process_with_retries(
        &self,
        s3_key: &str,
    ) -> Result<Option<ValidationResult>, ImportError> {
        let retry = self.policy.processing;
        let mut attempt = 1;

        loop {
            let err = match self.process_with_timeout(s3_key).await {
                Ok(()) => return Ok(None),
                Err(err) => err,
            };

            if err.is_ambiguous() {
                tracing::warn!(
                    session_id = %self.session.id(),
                    s3_key,
                    attempt,
                    error = %err,
                    "Processing outcome unknown, verifying staged data",
                );
                if let Some(validation) = self.verify_staged().await {
                    tracing::info!(
                        session_id = %self.session.id(),
                        s3_key,
                        attempt,
                        total_rows = validation.total_rows,
                        "Staged data found, processing had succeeded",
                    );
                    return Ok(Some(validation));
                }
            }

            if !retry.has_attempts_after(attempt) {
                return Err(if err.is_ambiguous() {
                    ImportError::Unconfirmed { attempts: attempt }
                } else {
                    err
                });
            }

            let delay = retry.delay_after(attempt);
            tracing::warn!(
                session_id = %self.session.id(),
                s3_key,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Processing attempt failed, retrying",
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn process_with_timeout(&self, s3_key: &str) -> Result<(), ImportError> {
        let limit = self.policy.processing_timeout;
        tokio::time::timeout(limit, self.backend.process(s3_key))
            .await
            .map_err(|_| ImportError::ProcessingTimeout(limit))?
    }

    /// One `validate-temp` poll after the grace delay. An error counts as
    /// nothing staged.
    async fn verify_staged(&self) -> Option<ValidationResult> {
        tokio::time::sleep(self.policy.verification_grace).await;
        match self.backend.validate_temp().await {
            Ok(validation) if validation.has_staged_data() => Some(validation),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(
                    session_id = %self.session.id(),
                    error = %err,
                    "Verification poll failed",
                );
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Verify / preview / confirm / cancel
    // -----------------------------------------------------------------------

    /// Manual "Verify Data": look for staged data outside the upload flow.
    ///
    /// Returns whether data was found. When nothing is staged the session
    /// stage is left unchanged and an info notice is set.
    pub async fn verify_data(&mut self) -> Result<bool, ImportError> {
        if self.session.is_uploading() {
            return Err(CoreError::Conflict("An upload is already in progress".into()).into());
        }
        let validation = self.backend.validate_temp().await?;

        if validation.has_staged_data() {
            tracing::info!(
                session_id = %self.session.id(),
                total_rows = validation.total_rows,
                is_valid = validation.is_valid,
                "Manual verification found staged data",
            );
            self.session.apply(ImportEvent::DataVerified(validation))?;
            Ok(true)
        } else {
            tracing::info!(session_id = %self.session.id(), "Manual verification found no data");
            self.session.apply(ImportEvent::VerificationEmpty)?;
            Ok(false)
        }
    }

    /// Fetch a sample of the staged rows. Only allowed once validation
    /// passed.
    pub async fn load_preview(&mut self) -> Result<(), ImportError> {
        match self.session.stage() {
            ImportStage::Validate {
                validation: Some(validation),
            } if validation.is_valid => {}
            ImportStage::Validate { .. } => {
                return Err(CoreError::Validation(
                    "The staged data has not passed validation".into(),
                )
                .into())
            }
            other => {
                return Err(CoreError::Validation(format!(
                    "Cannot load a preview while the import is in the '{}' stage",
                    other.name()
                ))
                .into())
            }
        }

        let preview = self.backend.preview_temp().await?;
        tracing::debug!(
            session_id = %self.session.id(),
            rows = preview.preview.len(),
            "Preview loaded",
        );
        self.session.apply(ImportEvent::PreviewLoaded(preview))?;
        Ok(())
    }

    /// Replace production data with the staged rows.
    ///
    /// On rejection the session returns to the preview stage with the
    /// server's message, which is also returned.
    pub async fn confirm_replace(
        &mut self,
        acknowledgement: ReplaceAcknowledgement,
    ) -> Result<ReplaceOutcome, ImportError> {
        self.session
            .apply(ImportEvent::ReplaceAcknowledged(acknowledgement))?;

        match self.backend.confirm_replace(&self.operator).await {
            Ok(outcome) => {
                tracing::info!(
                    session_id = %self.session.id(),
                    operator = %self.operator,
                    total_rows = outcome.total_rows,
                    "Production data replaced",
                );
                self.session
                    .apply(ImportEvent::ReplaceCommitted(outcome.clone()))?;
                Ok(outcome)
            }
            Err(err) => {
                tracing::error!(
                    session_id = %self.session.id(),
                    error = %err,
                    "Replace rejected",
                );
                self.session
                    .apply(ImportEvent::ReplaceFailed(err.user_message()))?;
                Err(err)
            }
        }
    }

    /// Abandon the import from any stage. The server-side cleanup is
    /// best-effort: its failure is logged and the session resets anyway.
    pub async fn cancel(&mut self) {
        if let Err(err) = self.backend.cancel_upload().await {
            tracing::warn!(
                session_id = %self.session.id(),
                error = %err,
                "Cancel-upload cleanup failed",
            );
        }
        self.progress.reset();
        if let Err(err) = self.session.apply(ImportEvent::Cancelled) {
            tracing::warn!(session_id = %self.session.id(), error = %err, "Cancel rejected");
        }
        tracing::info!(session_id = %self.session.id(), "Import cancelled");
    }
}
