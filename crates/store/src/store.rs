//! Persistence trait over JSON record collections.

use {async_trait::async_trait, serde_json::Value};

use crate::{Result, types::Query};

/// Persistence backend for record collections.
///
/// Implementations sit in front of whatever actually stores the data (a
/// hosted backend, a local database, memory). Records are JSON objects and
/// are expected to carry a string `id` field.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read records from `collection` matching the query.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Value>>;

    /// Insert a record, returning it as stored.
    async fn insert(&self, collection: &str, record: Value) -> Result<Value>;

    /// Shallow-merge `patch` into the record with the given id, returning the
    /// updated record.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value>;

    /// Delete the record with the given id.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}
