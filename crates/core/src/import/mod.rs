//! CSV bulk-replace import: file checks, wire payloads, retry policy and
//! the session state machine.
//!
//! The session is driven by `adminboard_client::import::CsvImporter`;
//! nothing here performs I/O, so every transition can be exercised in a
//! plain unit test.

pub mod csv_file;
pub mod payloads;
pub mod policy;
pub mod session;

pub use csv_file::SelectedFile;
pub use payloads::{PreviewSample, ReplaceOutcome, UploadSlot, ValidationResult};
pub use policy::{ImportPolicy, RetryPolicy};
pub use session::{ImportEvent, ImportSession, ImportStage, Notice, ReplaceAcknowledgement};
