//! Generic CRUD client shared by every entity kind.
//!
//! One [`ResourceClient`] per [`EntityKind`] covers the whole lifecycle of
//! a list page: fetch the collection, filter it locally with a
//! [`TableQuery`], create, read, full-record update, the status switch
//! and hard delete.

use adminboard_core::error::CoreError;
use adminboard_core::records::{EntityKind, NewRecord, Record};
use adminboard_core::resource_table::{TablePage, TableQuery};
use adminboard_core::types::DbId;
use serde::Deserialize;

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

/// No query string.
const NO_QUERY: &[(&str, &str)] = &[];

/// Collections and items come back either bare or inside a `data`
/// envelope depending on the endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(inner) => inner,
        }
    }
}

/// CRUD client for one entity collection.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    api: ApiClient,
    kind: EntityKind,
}

impl ResourceClient {
    pub fn new(api: ApiClient, kind: EntityKind) -> Self {
        Self { api, kind }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    fn collection_path(&self) -> String {
        format!("/api/{}", self.kind.collection())
    }

    fn item_path(&self, id: DbId) -> String {
        format!("/api/{}/{id}", self.kind.collection())
    }

    /// Fetch the whole collection.
    pub async fn list(&self) -> ClientResult<Vec<Record>> {
        let records: Envelope<Vec<Record>> = self.api.get_json(&self.collection_path()).await?;
        let records = records.into_inner();
        tracing::debug!(
            entity = self.kind.collection(),
            count = records.len(),
            "Fetched collection",
        );
        Ok(records)
    }

    /// Fetch the collection and apply search, sort and pagination locally.
    pub async fn list_page(&self, query: &TableQuery) -> ClientResult<TablePage<Record>> {
        let records = self.list().await?;
        Ok(query.apply(&records))
    }

    pub async fn get(&self, id: DbId) -> ClientResult<Record> {
        match self.api.get_json::<Envelope<Record>>(&self.item_path(id)).await {
            Ok(record) => Ok(record.into_inner()),
            Err(ClientError::Api { status: 404, .. }) => Err(self.not_found(id)),
            Err(e) => Err(e),
        }
    }

    /// Create a record and return it as stored by the server.
    pub async fn create(&self, record: &NewRecord) -> ClientResult<Record> {
        let created: Envelope<Record> = self.api.post_json(&self.collection_path(), record).await?;
        let created = created.into_inner();
        tracing::info!(
            entity = self.kind.collection(),
            id = created.id,
            "Record created",
        );
        Ok(created)
    }

    /// Replace a record with a full `PUT`. Concurrent edits are not
    /// detected: the last write wins.
    pub async fn update(&self, record: &Record) -> ClientResult<()> {
        match self.api.put_unit(&self.item_path(record.id), record).await {
            Ok(()) => {
                tracing::info!(
                    entity = self.kind.collection(),
                    id = record.id,
                    "Record updated",
                );
                Ok(())
            }
            Err(ClientError::Api { status: 404, .. }) => Err(self.not_found(record.id)),
            Err(e) => Err(e),
        }
    }

    /// Soft delete / restore: flip `status` and `PUT` the full record.
    /// Returns the record as it now stands on the server.
    pub async fn toggle_status(&self, record: &Record) -> ClientResult<Record> {
        let toggled = record.with_toggled_status();
        self.update(&toggled).await?;
        Ok(toggled)
    }

    /// Hard delete.
    pub async fn delete(&self, id: DbId) -> ClientResult<()> {
        match self.api.delete(&self.item_path(id), NO_QUERY).await {
            Ok(()) => {
                tracing::info!(entity = self.kind.collection(), id, "Record deleted");
                Ok(())
            }
            Err(ClientError::Api { status: 404, .. }) => Err(self.not_found(id)),
            Err(e) => Err(e),
        }
    }

    fn not_found(&self, id: DbId) -> ClientError {
        ClientError::Core(CoreError::NotFound {
            entity: self.kind.label(),
            id,
        })
    }
}
