use std::sync::Arc;

use shared::{
    domain::{PersonRecord, RecordFields, RecordId},
    error::StoreFailure,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    collection::{CollectionViewModel, RefreshOutcome},
    events::RecordsEvent,
    store::RecordStore,
};

/// The single edit slot of the form.
///
/// `Editing` holds a value copy of the record taken when the operator picked it,
/// not a live reference into the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Create,
    Editing(PersonRecord),
}

impl EditState {
    /// Last pick wins; returns the target it replaced, if any.
    pub fn start_edit(&mut self, record: PersonRecord) -> Option<PersonRecord> {
        match std::mem::replace(self, Self::Editing(record)) {
            Self::Editing(previous) => Some(previous),
            Self::Create => None,
        }
    }

    /// Returns `true` when there was a target to drop.
    pub fn cancel(&mut self) -> bool {
        matches!(std::mem::take(self), Self::Editing(_))
    }

    pub fn target(&self) -> Option<&PersonRecord> {
        match self {
            Self::Create => None,
            Self::Editing(record) => Some(record),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }

    /// Initial form values: the target's fields, or blanks in create mode.
    pub fn draft(&self) -> RecordFields {
        self.target().map(RecordFields::from).unwrap_or_default()
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Self::Create => "Dashboard",
            Self::Editing(_) => "Edit Record",
        }
    }

    pub fn clear_if_targets(&mut self, id: &RecordId) -> bool {
        if self.target().is_some_and(|record| &record.id == id) {
            *self = Self::Create;
            true
        } else {
            false
        }
    }

    /// Drops the target when it is missing from a freshly fetched collection.
    pub fn reconcile(&mut self, records: &[PersonRecord]) -> bool {
        let Some(target) = self.target() else {
            return false;
        };
        if records.iter().any(|record| record.id == target.id) {
            return false;
        }
        *self = Self::Create;
        true
    }
}

/// Owns the edit slot and performs the create-or-update write for the form.
pub struct EditCoordinator {
    store: Arc<dyn RecordStore>,
    collection: Arc<CollectionViewModel>,
    state: Mutex<EditState>,
    events: broadcast::Sender<RecordsEvent>,
}

impl EditCoordinator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        collection: Arc<CollectionViewModel>,
        events: broadcast::Sender<RecordsEvent>,
    ) -> Self {
        Self {
            store,
            collection,
            state: Mutex::new(EditState::Create),
            events,
        }
    }

    pub async fn state(&self) -> EditState {
        self.state.lock().await.clone()
    }

    pub async fn start_edit(&self, record: PersonRecord) {
        let id = record.id.clone();
        let replaced = self.state.lock().await.start_edit(record.clone());
        if let Some(previous) = replaced.filter(|previous| previous.id != id) {
            debug!(previous = %previous.id, next = %id, "switching edit target");
        }
        let _ = self.events.send(RecordsEvent::EditRequested(record));
    }

    pub async fn cancel_edit(&self) {
        if self.state.lock().await.cancel() {
            let _ = self.events.send(RecordsEvent::EditCleared);
        }
    }

    /// Creates in create mode, updates the target otherwise.
    ///
    /// On success the target is cleared and one refresh runs. On failure the
    /// state is left exactly as it was so the operator can retry.
    pub async fn submit(&self, fields: &RecordFields) -> Result<(), StoreFailure> {
        let target = self
            .state
            .lock()
            .await
            .target()
            .map(|record| record.id.clone());

        let written = match &target {
            None => self.store.create(fields).await.map(|created| {
                info!(id = %created.id, display_id = %created.display_id, "record created");
            }),
            Some(id) => self.store.update(id, fields).await.map(|()| {
                info!(%id, "record updated");
            }),
        };

        if let Err(failure) = written {
            warn!(error = %failure, editing = target.is_some(), "save failed");
            let _ = self.events.send(RecordsEvent::SaveFailed(failure.to_string()));
            return Err(failure);
        }

        // A different record picked while the write was in flight stays selected.
        if let Some(id) = &target {
            self.invalidate(id).await;
        }
        let _ = self.events.send(RecordsEvent::SaveCompleted);
        self.refresh().await;
        Ok(())
    }

    /// Returns to create mode if `id` is the current target.
    pub async fn invalidate(&self, id: &RecordId) -> bool {
        let cleared = self.state.lock().await.clear_if_targets(id);
        if cleared {
            let _ = self.events.send(RecordsEvent::EditCleared);
        }
        cleared
    }

    /// Refreshes the collection and drops a target that no longer exists.
    pub async fn refresh(&self) -> RefreshOutcome {
        let outcome = self.collection.refresh().await;
        if outcome.is_applied() {
            let snapshot = self.collection.snapshot().await;
            let cleared = self.state.lock().await.reconcile(&snapshot.records);
            if cleared {
                info!("edit target no longer in collection; back to create mode");
                let _ = self.events.send(RecordsEvent::EditCleared);
            }
        }
        outcome
    }
}

#[cfg(test)]
#[path = "tests/edit_tests.rs"]
mod tests;
