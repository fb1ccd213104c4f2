use async_trait::async_trait;
use shared::{
    domain::{PersonRecord, RecordFields, RecordId},
    error::StoreFailure,
};

/// Read/write access to the remote record collection.
///
/// Implementations hold no client-side view state. Every failure comes back as a
/// [`StoreFailure`] so callers decide whether to keep their stale view or retry.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records, ordered ascending by display id by the store itself.
    async fn fetch_all(&self) -> Result<Vec<PersonRecord>, StoreFailure>;

    /// Inserts a record; the store assigns id, display id and creation time.
    async fn create(&self, fields: &RecordFields) -> Result<PersonRecord, StoreFailure>;

    async fn update(&self, id: &RecordId, fields: &RecordFields) -> Result<(), StoreFailure>;

    async fn delete(&self, id: &RecordId) -> Result<(), StoreFailure>;
}
