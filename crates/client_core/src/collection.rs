use std::{
    fmt,
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use shared::{
    domain::{PersonRecord, RecordId},
    error::StoreFailure,
};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::{events::RecordsEvent, store::RecordStore};

/// Which of several overlapping refreshes decides the displayed collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Whatever response resolves last is displayed, even if it was issued first.
    #[default]
    LastCompletedWins,
    /// Only the most recently issued refresh may replace the collection.
    LatestIssuedWins,
}

impl RefreshPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastCompletedWins => "last_completed_wins",
            Self::LatestIssuedWins => "latest_issued_wins",
        }
    }
}

impl fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefreshPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "last_completed_wins" => Ok(Self::LastCompletedWins),
            "latest_issued_wins" => Ok(Self::LatestIssuedWins),
            other => Err(format!("unknown refresh policy '{other}'")),
        }
    }
}

/// Immutable view of the collection. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSnapshot {
    pub records: Arc<[PersonRecord]>,
    pub loading: bool,
}

impl CollectionSnapshot {
    fn initial() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            loading: true,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, id: &RecordId) -> Option<&PersonRecord> {
        self.records.iter().find(|record| &record.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { count: usize },
    /// The fetch failed; the previous records were kept.
    Failed(StoreFailure),
    /// A newer refresh was issued while this one was in flight.
    Discarded { token: u64, latest: u64 },
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

pub struct CollectionViewModel {
    store: Arc<dyn RecordStore>,
    policy: RefreshPolicy,
    state: RwLock<CollectionSnapshot>,
    issued: AtomicU64,
    events: broadcast::Sender<RecordsEvent>,
}

impl CollectionViewModel {
    pub fn new(
        store: Arc<dyn RecordStore>,
        policy: RefreshPolicy,
        events: broadcast::Sender<RecordsEvent>,
    ) -> Self {
        Self {
            store,
            policy,
            state: RwLock::new(CollectionSnapshot::initial()),
            issued: AtomicU64::new(0),
            events,
        }
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub async fn snapshot(&self) -> CollectionSnapshot {
        self.state.read().await.clone()
    }

    /// Re-fetches every record and swaps the snapshot on success.
    ///
    /// Fetch failures are not surfaced as errors: the previous records stay in
    /// place and only the loading flag is cleared.
    pub async fn refresh(&self) -> RefreshOutcome {
        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            self.publish(&state);
        }
        debug!(token, "refreshing record collection");

        let fetched = self.store.fetch_all().await;

        let latest = self.issued.load(Ordering::SeqCst);
        let stale = self.policy == RefreshPolicy::LatestIssuedWins && token != latest;

        let mut state = self.state.write().await;
        let outcome = match fetched {
            Ok(_) if stale => {
                debug!(token, latest, "discarding superseded refresh result");
                RefreshOutcome::Discarded { token, latest }
            }
            Ok(records) => {
                let count = records.len();
                state.records = Arc::from(records);
                RefreshOutcome::Applied { count }
            }
            Err(failure) => {
                warn!(token, error = %failure, "refresh failed; keeping previous records");
                RefreshOutcome::Failed(failure)
            }
        };
        if !stale {
            state.loading = false;
        }
        self.publish(&state);
        outcome
    }

    fn publish(&self, state: &CollectionSnapshot) {
        let _ = self.events.send(RecordsEvent::RecordsChanged {
            records: Arc::clone(&state.records),
            loading: state.loading,
        });
    }
}

#[cfg(test)]
#[path = "tests/collection_tests.rs"]
mod tests;
