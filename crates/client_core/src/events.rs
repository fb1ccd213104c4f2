//! Events published by the core to presentation components.

use std::sync::Arc;

use shared::domain::{PersonRecord, RecordId};

#[derive(Debug, Clone)]
pub enum RecordsEvent {
    RecordsChanged {
        records: Arc<[PersonRecord]>,
        loading: bool,
    },
    EditRequested(PersonRecord),
    /// The edit target went back to none (create mode).
    EditCleared,
    SaveCompleted,
    SaveFailed(String),
    DeleteCompleted(RecordId),
    DeleteFailed {
        id: RecordId,
        reason: String,
    },
}
