use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::merge::MergeReport;
use crate::model::SiteDefinition;

/// Immutable view of the merged definitions at one revision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefinitionSnapshot {
    pub rev: u64,
    pub definitions: Vec<SiteDefinition>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DefinitionSnapshot {
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Holder of the already-merged definition list.
///
/// Readers take a snapshot when a palette session opens; replacing the list
/// notifies subscribers but never touches snapshots already handed out.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    async fn snapshot(&self) -> Arc<DefinitionSnapshot>;
    async fn replace(&self, definitions: Vec<SiteDefinition>, last_updated: Option<DateTime<Utc>>) -> u64;
    fn subscribe(&self) -> watch::Receiver<Arc<DefinitionSnapshot>>;

    /// Install the result of a merge.
    async fn apply_merge(&self, report: MergeReport) -> u64 {
        self.replace(report.definitions, Some(report.last_updated)).await
    }
}

pub struct InMemoryDefinitionStore {
    state: Mutex<Arc<DefinitionSnapshot>>,
    watch_tx: watch::Sender<Arc<DefinitionSnapshot>>,
}

impl InMemoryDefinitionStore {
    pub fn new(definitions: Vec<SiteDefinition>) -> Self {
        let initial = Arc::new(DefinitionSnapshot {
            rev: 0,
            definitions,
            last_updated: None,
        });
        let (watch_tx, _watch_rx) = watch::channel(Arc::clone(&initial));
        Self {
            state: Mutex::new(initial),
            watch_tx,
        }
    }
}

impl Default for InMemoryDefinitionStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl DefinitionStore for InMemoryDefinitionStore {
    async fn snapshot(&self) -> Arc<DefinitionSnapshot> {
        Arc::clone(&*self.state.lock().await)
    }

    async fn replace(&self, definitions: Vec<SiteDefinition>, last_updated: Option<DateTime<Utc>>) -> u64 {
        let mut guard = self.state.lock().await;
        let next = Arc::new(DefinitionSnapshot {
            rev: guard.rev.saturating_add(1),
            definitions,
            last_updated,
        });
        *guard = Arc::clone(&next);
        drop(guard);

        let rev = next.rev;
        debug!(rev, count = next.len(), "definition store replaced");
        if self.watch_tx.send(next).is_err() {
            warn!("definition update broadcast had no listeners");
        }
        rev
    }

    fn subscribe(&self) -> watch::Receiver<Arc<DefinitionSnapshot>> {
        self.watch_tx.subscribe()
    }
}
