//! Import session state machine.
//!
//! ```text
//! Select --Staged--> Validate --Validated(valid)--> Validate(result) --PreviewLoaded--> Preview
//! Preview --ReplaceAcknowledged--> Confirm --ReplaceCommitted--> Committed
//! Confirm --ReplaceFailed--> Preview
//! Validate --Validated(invalid)--> Select
//! Validate --ValidationUnavailable--> Validate (error notice)
//! any --Cancelled--> Select
//! ```
//!
//! Session fields are private: the only way to change a session is
//! [`transition`] (or [`ImportSession::apply`], which wraps it), so a
//! stage can never be reached without passing through its predecessors.

use serde::Serialize;
use uuid::Uuid;

use super::csv_file::SelectedFile;
use super::payloads::{PreviewSample, ReplaceOutcome, ValidationResult, DISPLAY_LIMIT};
use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Where the operator is in the bulk-replace workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportStage {
    /// Picking a file, or uploading it.
    Select,
    /// The upload is staged server-side. `validation` is filled once
    /// `validate-temp` reports a valid result.
    Validate { validation: Option<ValidationResult> },
    /// A sample of the staged rows is on screen.
    Preview {
        validation: ValidationResult,
        preview: PreviewSample,
    },
    /// The operator acknowledged the replacement; `confirm-replace` is in
    /// flight.
    Confirm {
        validation: ValidationResult,
        preview: PreviewSample,
    },
    /// The server replaced the production data.
    Committed(ReplaceOutcome),
}

impl ImportStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Validate { .. } => "validate",
            Self::Preview { .. } => "preview",
            Self::Confirm { .. } => "confirm",
            Self::Committed(_) => "committed",
        }
    }
}

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// The message shown to the operator after the last event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Message shown when a manual verification finds nothing staged.
pub const NO_STAGED_DATA_MESSAGE: &str =
    "No staged data found. Upload the CSV file again to start a new import.";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Proof that the operator accepted that the replacement cannot be undone.
///
/// Only obtainable through [`ReplaceAcknowledgement::irreversible`], which
/// the front end calls from its confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceAcknowledgement {
    _confirmed: (),
}

impl ReplaceAcknowledgement {
    pub fn irreversible() -> Self {
        Self { _confirmed: () }
    }
}

/// Everything that can happen to an import session.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportEvent {
    FileSelected(SelectedFile),
    UploadStarted,
    UploadProgressed(u8),
    UploadFailed(String),
    Staged { s3_key: String },
    Validated(ValidationResult),
    /// `validate-temp` could not be read after the upload was staged.
    ValidationUnavailable(String),
    /// Manual "Verify Data" found staged rows.
    DataVerified(ValidationResult),
    /// Manual "Verify Data" found nothing.
    VerificationEmpty,
    PreviewLoaded(PreviewSample),
    ReplaceAcknowledged(ReplaceAcknowledgement),
    ReplaceFailed(String),
    ReplaceCommitted(ReplaceOutcome),
    Cancelled,
}

impl ImportEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FileSelected(_) => "file_selected",
            Self::UploadStarted => "upload_started",
            Self::UploadProgressed(_) => "upload_progressed",
            Self::UploadFailed(_) => "upload_failed",
            Self::Staged { .. } => "staged",
            Self::Validated(_) => "validated",
            Self::ValidationUnavailable(_) => "validation_unavailable",
            Self::DataVerified(_) => "data_verified",
            Self::VerificationEmpty => "verification_empty",
            Self::PreviewLoaded(_) => "preview_loaded",
            Self::ReplaceAcknowledged(_) => "replace_acknowledged",
            Self::ReplaceFailed(_) => "replace_failed",
            Self::ReplaceCommitted(_) => "replace_committed",
            Self::Cancelled => "cancelled",
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Client-side view of one bulk-replace import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSession {
    id: Uuid,
    started_at: Timestamp,
    file: Option<SelectedFile>,
    s3_key: Option<String>,
    upload_progress: u8,
    uploading: bool,
    stage: ImportStage,
    last_validation: Option<ValidationResult>,
    notice: Option<Notice>,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            started_at: chrono::Utc::now(),
            file: None,
            s3_key: None,
            upload_progress: 0,
            uploading: false,
            stage: ImportStage::Select,
            last_validation: None,
            notice: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn s3_key(&self) -> Option<&str> {
        self.s3_key.as_deref()
    }

    /// Upload progress, 0–100.
    pub fn upload_progress(&self) -> u8 {
        self.upload_progress
    }

    /// True while the file is travelling to storage or being processed.
    /// The submit control stays disabled while this is set.
    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn stage(&self) -> &ImportStage {
        &self.stage
    }

    /// The most recent validation result, including invalid ones that sent
    /// the session back to `Select`.
    pub fn last_validation(&self) -> Option<&ValidationResult> {
        self.last_validation.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Apply `event` in place. On error the session is left untouched.
    pub fn apply(&mut self, event: ImportEvent) -> Result<(), CoreError> {
        *self = transition(self, event)?;
        Ok(())
    }
}

/// Compute the session that results from `event`.
pub fn transition(session: &ImportSession, event: ImportEvent) -> Result<ImportSession, CoreError> {
    let mut next = session.clone();
    let stage_name = session.stage.name();
    let event_name = event.name();
    let rejected = || {
        CoreError::Validation(format!(
            "Cannot apply '{event_name}' while the import is in the '{stage_name}' stage"
        ))
    };

    match event {
        ImportEvent::FileSelected(file) => {
            if session.uploading {
                return Err(upload_in_progress());
            }
            if session.stage != ImportStage::Select {
                return Err(rejected());
            }
            next.file = Some(file);
            next.s3_key = None;
            next.upload_progress = 0;
            next.notice = None;
        }

        ImportEvent::UploadStarted => {
            if session.uploading {
                return Err(upload_in_progress());
            }
            if session.stage != ImportStage::Select {
                return Err(rejected());
            }
            if session.file.is_none() {
                return Err(CoreError::Validation(
                    "Select a CSV file before uploading".into(),
                ));
            }
            next.uploading = true;
            next.upload_progress = 0;
            next.notice = None;
        }

        ImportEvent::UploadProgressed(percent) => {
            if !session.uploading {
                return Err(rejected());
            }
            next.upload_progress = session.upload_progress.max(percent.min(100));
        }

        ImportEvent::UploadFailed(message) => {
            if !session.uploading {
                return Err(rejected());
            }
            next.uploading = false;
            next.upload_progress = 0;
            next.stage = ImportStage::Select;
            next.notice = Some(Notice::error(message));
        }

        ImportEvent::Staged { s3_key } => {
            if !session.uploading {
                return Err(rejected());
            }
            next.uploading = false;
            next.upload_progress = 100;
            next.s3_key = Some(s3_key);
            next.stage = ImportStage::Validate { validation: None };
            next.notice = Some(Notice::info("File uploaded. Validating staged data."));
        }

        ImportEvent::Validated(validation) => {
            if !matches!(session.stage, ImportStage::Validate { .. }) {
                return Err(rejected());
            }
            apply_validation(&mut next, validation);
        }

        ImportEvent::ValidationUnavailable(message) => {
            if !matches!(session.stage, ImportStage::Validate { .. }) {
                return Err(rejected());
            }
            next.notice = Some(Notice::error(message));
        }

        ImportEvent::DataVerified(validation) => {
            if session.uploading {
                return Err(upload_in_progress());
            }
            if !matches!(
                session.stage,
                ImportStage::Select | ImportStage::Validate { .. }
            ) {
                return Err(rejected());
            }
            if validation.has_staged_data() {
                apply_validation(&mut next, validation);
            } else {
                next.notice = Some(Notice::info(NO_STAGED_DATA_MESSAGE));
            }
        }

        ImportEvent::VerificationEmpty => {
            if session.uploading {
                return Err(upload_in_progress());
            }
            next.notice = Some(Notice::info(NO_STAGED_DATA_MESSAGE));
        }

        ImportEvent::PreviewLoaded(preview) => match &session.stage {
            ImportStage::Validate {
                validation: Some(validation),
            } if validation.is_valid => {
                next.stage = ImportStage::Preview {
                    validation: validation.clone(),
                    preview,
                };
                next.notice = None;
            }
            ImportStage::Validate { .. } => {
                return Err(CoreError::Validation(
                    "The staged data has not passed validation".into(),
                ));
            }
            _ => return Err(rejected()),
        },

        ImportEvent::ReplaceAcknowledged(_) => match &session.stage {
            ImportStage::Preview {
                validation,
                preview,
            } => {
                next.stage = ImportStage::Confirm {
                    validation: validation.clone(),
                    preview: preview.clone(),
                };
                next.notice = None;
            }
            _ => return Err(rejected()),
        },

        ImportEvent::ReplaceFailed(message) => match &session.stage {
            ImportStage::Confirm {
                validation,
                preview,
            } => {
                next.stage = ImportStage::Preview {
                    validation: validation.clone(),
                    preview: preview.clone(),
                };
                next.notice = Some(Notice::error(message));
            }
            _ => return Err(rejected()),
        },

        ImportEvent::ReplaceCommitted(outcome) => {
            if !matches!(session.stage, ImportStage::Confirm { .. }) {
                return Err(rejected());
            }
            next.notice = Some(Notice::success(format!(
                "{} ({} rows)",
                if outcome.message.is_empty() {
                    "Data replaced"
                } else {
                    outcome.message.as_str()
                },
                outcome.total_rows
            )));
            next.stage = ImportStage::Committed(outcome);
        }

        ImportEvent::Cancelled => {
            next.file = None;
            next.s3_key = None;
            next.upload_progress = 0;
            next.uploading = false;
            next.stage = ImportStage::Select;
            next.last_validation = None;
            next.notice = Some(Notice::info("Import cancelled"));
        }
    }

    Ok(next)
}

fn upload_in_progress() -> CoreError {
    CoreError::Conflict("An upload is already in progress for this import".into())
}

/// Valid results stay in `Validate`; invalid ones send the operator back to
/// `Select` with the errors listed and the file cleared.
fn apply_validation(next: &mut ImportSession, validation: ValidationResult) {
    if validation.is_valid {
        next.notice = Some(Notice::success(format!(
            "Validation passed: {} rows staged",
            validation.total_rows
        )));
        next.stage = ImportStage::Validate {
            validation: Some(validation.clone()),
        };
    } else {
        next.notice = Some(Notice::error(invalid_message(&validation)));
        next.stage = ImportStage::Select;
        next.file = None;
        next.s3_key = None;
        next.upload_progress = 0;
    }
    next.last_validation = Some(validation);
}

fn invalid_message(validation: &ValidationResult) -> String {
    let summary = validation.display_errors(DISPLAY_LIMIT);
    let mut message = format!(
        "Validation failed for {} rows. Fix the file and upload it again.",
        validation.total_rows
    );
    for error in summary.shown {
        message.push_str("\n- ");
        message.push_str(error);
    }
    if let Some(more) = summary.more {
        message.push('\n');
        message.push_str(&more);
    }
    message
}
