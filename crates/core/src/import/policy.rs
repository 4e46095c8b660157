//! Retry, timeout and verification constants for the import pipeline.
//!
//! The processing endpoint sometimes answers 503 or never answers even
//! though the staging table was filled. An ambiguous failure is therefore
//! checked against `validate-temp` before the mutating call is repeated.

use std::time::Duration;

/// Attempts of the whole presign → PUT → process sequence.
pub const UPLOAD_MAX_ATTEMPTS: u32 = 3;

/// Linear backoff step between upload sequence attempts.
pub const UPLOAD_BACKOFF_STEP: Duration = Duration::from_millis(1000);

/// Attempts of the processing call within one upload sequence.
pub const PROCESSING_MAX_ATTEMPTS: u32 = 2;

/// Linear backoff step between processing attempts.
pub const PROCESSING_BACKOFF_STEP: Duration = Duration::from_millis(5000);

/// Client-side ceiling on the processing call.
pub const PROCESSING_TIMEOUT: Duration = Duration::from_secs(45);

/// Client-side ceiling on the direct-to-storage PUT.
pub const STORAGE_PUT_TIMEOUT: Duration = Duration::from_secs(120);

/// Delay before asking `validate-temp` whether an ambiguous call succeeded.
pub const VERIFICATION_GRACE: Duration = Duration::from_secs(3);

/// HTTP status the processing endpoint returns when its acknowledgement
/// may have been lost.
pub const AMBIGUOUS_STATUS: u16 = 503;

/// A bounded retry loop with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts,
            backoff_step,
        }
    }

    /// Delay to wait after the 1-based `attempt` failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }

    /// Whether another attempt may follow the 1-based `attempt`.
    pub fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Every tunable of the import pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportPolicy {
    pub upload: RetryPolicy,
    pub processing: RetryPolicy,
    pub processing_timeout: Duration,
    pub storage_timeout: Duration,
    pub verification_grace: Duration,
}

impl Default for ImportPolicy {
    fn default() -> Self {
        Self {
            upload: RetryPolicy::new(UPLOAD_MAX_ATTEMPTS, UPLOAD_BACKOFF_STEP),
            processing: RetryPolicy::new(PROCESSING_MAX_ATTEMPTS, PROCESSING_BACKOFF_STEP),
            processing_timeout: PROCESSING_TIMEOUT,
            storage_timeout: STORAGE_PUT_TIMEOUT,
            verification_grace: VERIFICATION_GRACE,
        }
    }
}

/// Whether a processing response status leaves the outcome unknown.
pub fn is_ambiguous_status(status: u16) -> bool {
    status == AMBIGUOUS_STATUS
}
