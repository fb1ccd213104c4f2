use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{PersonRecord, RecordFields, RecordId},
    error::StoreFailure,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    collection::{CollectionSnapshot, CollectionViewModel, RefreshOutcome, RefreshPolicy},
    edit::{EditCoordinator, EditState},
    events::RecordsEvent,
    store::RecordStore,
};

/// What presentation components may ask of the core.
#[async_trait]
pub trait RecordsHandle: Send + Sync {
    async fn refresh(&self) -> RefreshOutcome;
    async fn snapshot(&self) -> CollectionSnapshot;
    async fn request_edit(&self, record: PersonRecord);
    async fn cancel_edit(&self);
    async fn edit_state(&self) -> EditState;
    async fn submit(&self, fields: &RecordFields) -> Result<(), StoreFailure>;
    async fn delete_record(&self, id: &RecordId) -> Result<(), StoreFailure>;
    fn subscribe_events(&self) -> broadcast::Receiver<RecordsEvent>;
}

/// Top-level owner of the collection and the edit slot.
pub struct RecordsCoordinator {
    store: Arc<dyn RecordStore>,
    collection: Arc<CollectionViewModel>,
    editor: EditCoordinator,
    events: broadcast::Sender<RecordsEvent>,
}

impl RecordsCoordinator {
    pub fn new(store: Arc<dyn RecordStore>, policy: RefreshPolicy) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let collection = Arc::new(CollectionViewModel::new(
            Arc::clone(&store),
            policy,
            events.clone(),
        ));
        let editor = EditCoordinator::new(Arc::clone(&store), Arc::clone(&collection), events.clone());
        Arc::new(Self {
            store,
            collection,
            editor,
            events,
        })
    }

    /// Initial fetch when the view opens.
    pub async fn load(&self) -> RefreshOutcome {
        info!(policy = %self.collection.policy(), "loading records");
        self.editor.refresh().await
    }
}

#[async_trait]
impl RecordsHandle for RecordsCoordinator {
    async fn refresh(&self) -> RefreshOutcome {
        self.editor.refresh().await
    }

    async fn snapshot(&self) -> CollectionSnapshot {
        self.collection.snapshot().await
    }

    async fn request_edit(&self, record: PersonRecord) {
        self.editor.start_edit(record).await;
    }

    async fn cancel_edit(&self) {
        self.editor.cancel_edit().await;
    }

    async fn edit_state(&self) -> EditState {
        self.editor.state().await
    }

    async fn submit(&self, fields: &RecordFields) -> Result<(), StoreFailure> {
        self.editor.submit(fields).await
    }

    async fn delete_record(&self, id: &RecordId) -> Result<(), StoreFailure> {
        if let Err(failure) = self.store.delete(id).await {
            warn!(%id, error = %failure, "delete failed");
            let _ = self.events.send(RecordsEvent::DeleteFailed {
                id: id.clone(),
                reason: failure.to_string(),
            });
            return Err(failure);
        }

        info!(%id, "record deleted");
        self.editor.invalidate(id).await;
        let _ = self.events.send(RecordsEvent::DeleteCompleted(id.clone()));
        self.editor.refresh().await;
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<RecordsEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
