use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{DisplayId, PersonRecord, RecordFields, RecordId},
    error::{StoreFailure, StoreOperation},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::store::RecordStore;

/// In-process [`RecordStore`] with the same id and ordering rules as the remote table.
pub struct MemoryRecordStore {
    inner: Mutex<MemoryState>,
}

struct MemoryState {
    rows: BTreeMap<DisplayId, PersonRecord>,
    next_display_id: i64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<PersonRecord>) -> Self {
        let next_display_id = records
            .iter()
            .map(|record| record.display_id.0)
            .max()
            .unwrap_or(0)
            + 1;
        let rows = records
            .into_iter()
            .map(|record| (record.display_id, record))
            .collect();
        Self {
            inner: Mutex::new(MemoryState {
                rows,
                next_display_id,
            }),
        }
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryState {
    fn find_mut(&mut self, id: &RecordId) -> Option<&mut PersonRecord> {
        self.rows.values_mut().find(|record| &record.id == id)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_all(&self) -> Result<Vec<PersonRecord>, StoreFailure> {
        let guard = self.inner.lock().await;
        Ok(guard.rows.values().cloned().collect())
    }

    async fn create(&self, fields: &RecordFields) -> Result<PersonRecord, StoreFailure> {
        let mut guard = self.inner.lock().await;
        let display_id = DisplayId(guard.next_display_id);
        guard.next_display_id += 1;

        let record = PersonRecord {
            id: RecordId(Uuid::new_v4().to_string()),
            display_id,
            name: fields.name.clone(),
            id_number: fields.id_number.clone(),
            email: fields.email.clone(),
            phone: fields.phone.clone(),
            created_at: Utc::now(),
        };
        guard.rows.insert(display_id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: &RecordId, fields: &RecordFields) -> Result<(), StoreFailure> {
        let mut guard = self.inner.lock().await;
        let record = guard.find_mut(id).ok_or_else(|| {
            StoreFailure::new(StoreOperation::Update, format!("no record with id {id}"))
        })?;
        record.name = fields.name.clone();
        record.id_number = fields.id_number.clone();
        record.email = fields.email.clone();
        record.phone = fields.phone.clone();
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreFailure> {
        let mut guard = self.inner.lock().await;
        guard.rows.retain(|_, record| &record.id != id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/memory_store_tests.rs"]
mod tests;
