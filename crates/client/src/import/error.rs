use std::time::Duration;

use adminboard_core::error::CoreError;

/// Failures of the bulk-replace import pipeline.
///
/// A validation result with `isValid: false` is not an error: it sends the
/// session back to the select stage with the errors listed.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The backend refused to issue a presigned URL.
    #[error("Could not obtain upload credentials: {0}")]
    Presign(String),

    /// The `PUT` to object storage failed, was rejected or timed out.
    #[error("Upload to storage failed: {0}")]
    Transport(String),

    /// The processing endpoint answered 503.
    #[error("Processing service unavailable (503)")]
    ProcessingUnavailable,

    /// The processing endpoint did not answer in time.
    #[error("Processing did not answer within {}s", .0.as_secs())]
    ProcessingTimeout(Duration),

    /// The processing endpoint failed with a definite error.
    #[error("Processing failed: {message}")]
    Processing {
        status: Option<u16>,
        message: String,
    },

    /// Every processing attempt was ambiguous and verification found no
    /// staged data.
    #[error("Processing could not be confirmed after {attempts} attempts")]
    Unconfirmed { attempts: u32 },

    /// `validate-temp`, `preview-temp` or `cancel-upload` failed.
    #[error("Could not read staged data: {0}")]
    Staging(String),

    /// The server rejected `confirm-replace`; carries its message verbatim.
    #[error("{0}")]
    Confirm(String),

    /// The session refused the requested step.
    #[error(transparent)]
    Session(#[from] CoreError),
}

impl ImportError {
    /// 503s and timeouts may hide a processing run that actually succeeded.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::ProcessingUnavailable | Self::ProcessingTimeout(_))
    }

    /// Actionable text for a blocking alert.
    pub fn user_message(&self) -> String {
        match self {
            Self::Presign(msg) => format!(
                "The server did not authorise the upload ({msg}). Try again in a few minutes."
            ),
            Self::Transport(msg) => format!(
                "The file could not be sent to storage ({msg}). Check your connection and select the file again."
            ),
            Self::ProcessingUnavailable | Self::ProcessingTimeout(_) | Self::Unconfirmed { .. } => {
                "The server did not confirm that the file was processed. It may still have \
                 succeeded: you may retry verification manually with \"Verify Data\"."
                    .to_string()
            }
            Self::Processing { message, .. } => format!(
                "The server could not process the file: {message}. Fix the file and upload it again."
            ),
            Self::Staging(msg) => format!(
                "The staged data could not be read ({msg}). Use \"Verify Data\" to try again."
            ),
            Self::Confirm(msg) => msg.clone(),
            Self::Session(err) => err.to_string(),
        }
    }
}
