use std::{
    collections::{HashSet, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use shared::{
    domain::{DisplayId, PersonRecord, RecordFields, RecordId},
    error::{StoreFailure, StoreOperation},
};
use tokio::sync::oneshot;

use crate::{memory_store::MemoryRecordStore, store::RecordStore};

pub(crate) fn record(display_id: i64, name: &str) -> PersonRecord {
    PersonRecord {
        id: RecordId(format!("rec-{display_id}")),
        display_id: DisplayId(display_id),
        name: name.to_string(),
        id_number: format!("ID-{display_id}"),
        email: format!("{}@example.com", name.to_ascii_lowercase()),
        phone: "555-0100".to_string(),
        created_at: "2024-01-01T00:00:00Z".parse().expect("timestamp"),
    }
}

pub(crate) fn fields(name: &str) -> RecordFields {
    RecordFields {
        name: name.to_string(),
        id_number: "ID-NEW".to_string(),
        email: format!("{}@example.com", name.to_ascii_lowercase()),
        phone: "555-0199".to_string(),
    }
}

pub(crate) fn display_ids(records: &[PersonRecord]) -> Vec<i64> {
    records.iter().map(|record| record.display_id.0).collect()
}

struct GatedFetch {
    release: oneshot::Receiver<()>,
    result: Result<Vec<PersonRecord>, StoreFailure>,
}

/// Memory-backed store that can fail chosen operations and hold fetches until released.
pub(crate) struct ScriptedStore {
    backing: MemoryRecordStore,
    failing: Mutex<HashSet<StoreOperation>>,
    gated_fetches: Mutex<VecDeque<GatedFetch>>,
    gated_updates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    fetch_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl ScriptedStore {
    pub(crate) fn with_records(records: Vec<PersonRecord>) -> Self {
        Self {
            backing: MemoryRecordStore::with_records(records),
            failing: Mutex::new(HashSet::new()),
            gated_fetches: Mutex::new(VecDeque::new()),
            gated_updates: Mutex::new(VecDeque::new()),
            fetch_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn fail(&self, operation: StoreOperation) {
        self.failing.lock().expect("failing set").insert(operation);
    }

    pub(crate) fn recover(&self, operation: StoreOperation) {
        self.failing.lock().expect("failing set").remove(&operation);
    }

    /// Queues a result for the next unclaimed `fetch_all`, delivered once the sender fires.
    pub(crate) fn gate_fetch(
        &self,
        result: Result<Vec<PersonRecord>, StoreFailure>,
    ) -> oneshot::Sender<()> {
        let (tx, release) = oneshot::channel();
        self.gated_fetches
            .lock()
            .expect("gated fetches")
            .push_back(GatedFetch { release, result });
        tx
    }

    /// Holds the next unclaimed `update` until the sender fires.
    pub(crate) fn gate_update(&self) -> oneshot::Sender<()> {
        let (tx, release) = oneshot::channel();
        self.gated_updates
            .lock()
            .expect("gated updates")
            .push_back(release);
        tx
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn check(&self, operation: StoreOperation) -> Result<(), StoreFailure> {
        if self.failing.lock().expect("failing set").contains(&operation) {
            return Err(StoreFailure::new(operation, "store unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for ScriptedStore {
    async fn fetch_all(&self) -> Result<Vec<PersonRecord>, StoreFailure> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let gated = self.gated_fetches.lock().expect("gated fetches").pop_front();
        if let Some(gated) = gated {
            let _ = gated.release.await;
            return gated.result;
        }
        self.check(StoreOperation::FetchAll)?;
        self.backing.fetch_all().await
    }

    async fn create(&self, fields: &RecordFields) -> Result<PersonRecord, StoreFailure> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check(StoreOperation::Create)?;
        self.backing.create(fields).await
    }

    async fn update(&self, id: &RecordId, fields: &RecordFields) -> Result<(), StoreFailure> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gated_updates.lock().expect("gated updates").pop_front();
        if let Some(release) = gate {
            let _ = release.await;
        }
        self.check(StoreOperation::Update)?;
        self.backing.update(id, fields).await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreFailure> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check(StoreOperation::Delete)?;
        self.backing.delete(id).await
    }
}
