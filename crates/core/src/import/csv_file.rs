//! Checks applied to the file the operator picks before anything is
//! uploaded.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// MIME type sent when the picker reports none.
pub const DEFAULT_CSV_MIME: &str = "text/csv";

/// MIME types browsers and desktop pickers report for `.csv` files.
pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "text/csv",
    "application/csv",
    "text/plain",
    "application/vnd.ms-excel",
    "application/octet-stream",
];

/// A CSV file selected for import (metadata only; the bytes travel
/// separately).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub size_bytes: u64,
}

impl SelectedFile {
    /// Validate the extension, MIME type and size of a picked file.
    ///
    /// An empty `mime` is replaced by [`DEFAULT_CSV_MIME`].
    pub fn new(name: &str, mime: &str, size_bytes: u64) -> Result<Self, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("File name must not be empty".into()));
        }

        let is_csv = name
            .rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(CoreError::Validation(format!(
                "'{name}' is not a CSV file. Select a file with the .csv extension"
            )));
        }

        let mime = mime.trim().to_ascii_lowercase();
        let mime = if mime.is_empty() {
            DEFAULT_CSV_MIME.to_string()
        } else if ACCEPTED_MIME_TYPES.contains(&mime.as_str()) {
            mime
        } else {
            return Err(CoreError::Validation(format!(
                "Unsupported file type '{mime}'. Must be one of: {ACCEPTED_MIME_TYPES:?}"
            )));
        };

        if size_bytes == 0 {
            return Err(CoreError::Validation(format!("'{name}' is empty")));
        }

        Ok(Self {
            name: name.to_string(),
            mime,
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn accepts_csv_with_known_mime() {
        let file = SelectedFile::new("tarifas.csv", "text/csv", 120).unwrap();
        assert_eq!(file.name, "tarifas.csv");
        assert_eq!(file.mime, "text/csv");
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert!(SelectedFile::new("TARIFAS.CSV", "application/vnd.ms-excel", 1).is_ok());
    }

    #[test]
    fn missing_mime_defaults_to_text_csv() {
        let file = SelectedFile::new("a.csv", "", 1).unwrap();
        assert_eq!(file.mime, DEFAULT_CSV_MIME);
    }

    #[test]
    fn rejects_other_extensions() {
        assert_matches!(
            SelectedFile::new("tarifas.xlsx", "text/csv", 1),
            Err(CoreError::Validation(_))
        );
        assert_matches!(SelectedFile::new(".csv", "text/csv", 1), Err(CoreError::Validation(_)));
        assert_matches!(SelectedFile::new("csv", "text/csv", 1), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_unknown_mime() {
        assert_matches!(
            SelectedFile::new("a.csv", "image/png", 1),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rejects_empty_file() {
        assert_matches!(SelectedFile::new("a.csv", "text/csv", 0), Err(CoreError::Validation(_)));
    }
}
