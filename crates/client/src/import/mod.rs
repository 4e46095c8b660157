//! CSV bulk replace: upload to object storage, server-side processing with
//! verification on ambiguous failures, then validate, preview and confirm.

pub mod backend;
pub mod error;
pub mod importer;

pub use backend::{HttpImportBackend, ImportBackend};
pub use error::ImportError;
pub use importer::CsvImporter;

use adminboard_core::import::policy::ImportPolicy;
use adminboard_core::records::EntityKind;

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::ApiClient;

/// Importer for the tariff collection (`/api/tarifarios`), wired from
/// `config`.
pub fn tariff_importer(config: &ClientConfig) -> ClientResult<CsvImporter<HttpImportBackend>> {
    let policy = ImportPolicy::default();
    let api = ApiClient::new(config)?;
    let backend = HttpImportBackend::new(api, EntityKind::Tariff, &config.storage_public_base_url)
        .with_policy(&policy);
    Ok(CsvImporter::new(backend, config.operator.clone()).with_policy(policy))
}
