//! Record synchronization and edit-state coordination for the personal details client.

pub mod collection;
pub mod coordinator;
pub mod edit;
pub mod events;
pub mod memory_store;
pub mod rest_store;
pub mod store;

pub use collection::{CollectionSnapshot, CollectionViewModel, RefreshOutcome, RefreshPolicy};
pub use coordinator::{RecordsCoordinator, RecordsHandle};
pub use edit::{EditCoordinator, EditState};
pub use events::RecordsEvent;
pub use memory_store::MemoryRecordStore;
pub use rest_store::{RestRecordStore, StoreConfig, StoreSetupError, DEFAULT_TABLE};
pub use store::RecordStore;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
