//! Request and response bodies of the bulk-replace endpoints.

use serde::{Deserialize, Serialize};

/// How many validation errors or preview rows a screen shows before
/// collapsing the rest into a summary.
pub const DISPLAY_LIMIT: usize = 10;

/// A parsed CSV row as returned by `preview-temp`.
pub type PreviewRow = serde_json::Map<String, serde_json::Value>;

/// Body of `POST <base>/presigned-url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignRequest {
    pub filename: String,
    pub filetype: String,
}

/// Presigned write URL and the object key it writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSlot {
    pub url: String,
    pub key: String,
}

/// Body of `POST <base>/process-csv-from-s3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub s3_key: String,
}

/// Body of `POST <base>/confirm-replace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmReplaceRequest {
    pub usuario: String,
}

/// Result of `validate-temp`: structural checks over the staging table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// The first errors of a validation result plus a "+N more" line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSummary<'a> {
    pub shown: &'a [String],
    pub more: Option<String>,
}

impl ValidationResult {
    /// Whether the staging table holds anything at all.
    pub fn has_staged_data(&self) -> bool {
        self.total_rows > 0
    }

    /// Errors truncated for display. The result itself is not altered.
    pub fn display_errors(&self, limit: usize) -> ErrorSummary<'_> {
        let shown = &self.errors[..self.errors.len().min(limit)];
        let hidden = self.errors.len() - shown.len();
        ErrorSummary {
            shown,
            more: (hidden > 0).then(|| format!("+{hidden} more")),
        }
    }
}

/// Result of `preview-temp`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSample {
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub preview: Vec<PreviewRow>,
}

impl PreviewSample {
    /// Rows shown in the preview table.
    pub fn display_rows(&self, limit: usize) -> &[PreviewRow] {
        &self.preview[..self.preview.len().min(limit)]
    }
}

/// Result of `confirm-replace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub total_rows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_result_reads_camel_case() {
        let result: ValidationResult = serde_json::from_value(json!({
            "isValid": false,
            "totalRows": 12,
            "errors": ["Fila 3: precio vacío"]
        }))
        .unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.total_rows, 12);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn validation_result_tolerates_missing_errors() {
        let result: ValidationResult =
            serde_json::from_value(json!({ "isValid": true, "totalRows": 3 })).unwrap();
        assert!(result.errors.is_empty());
        assert!(result.has_staged_data());
    }

    #[test]
    fn validation_result_with_only_row_count() {
        let result: ValidationResult =
            serde_json::from_value(json!({ "totalRows": 1200 })).unwrap();
        assert_eq!(result.total_rows, 1200);
        assert!(result.has_staged_data());
        assert!(!result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn display_errors_truncates_with_summary() {
        let result = ValidationResult {
            is_valid: false,
            total_rows: 40,
            errors: (1..=13).map(|n| format!("error {n}")).collect(),
        };
        let summary = result.display_errors(DISPLAY_LIMIT);
        assert_eq!(summary.shown.len(), 10);
        assert_eq!(summary.more.as_deref(), Some("+3 more"));
        assert_eq!(result.errors.len(), 13);
    }

    #[test]
    fn display_errors_without_overflow_has_no_summary() {
        let result = ValidationResult {
            is_valid: false,
            total_rows: 1,
            errors: vec!["only".into()],
        };
        assert_eq!(result.display_errors(DISPLAY_LIMIT).more, None);
    }

    #[test]
    fn preview_display_rows_is_bounded() {
        let sample = PreviewSample {
            total_rows: 50,
            preview: (0..25)
                .map(|n| json!({ "row": n }).as_object().cloned().unwrap())
                .collect(),
        };
        assert_eq!(sample.display_rows(DISPLAY_LIMIT).len(), 10);
        assert_eq!(sample.preview.len(), 25);
    }

    #[test]
    fn process_request_uses_s3_key_wire_name() {
        let body = serde_json::to_value(ProcessRequest {
            s3_key: "imports/a.csv".into(),
        })
        .unwrap();
        assert_eq!(body, json!({ "s3Key": "imports/a.csv" }));
    }
}
