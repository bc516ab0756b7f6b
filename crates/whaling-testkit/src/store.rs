use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use whaling_ports::{SnapshotStore, StoreError};
use whaling_schemas::AccountSnapshot;

/// Snapshot store keeping live snapshots and baselines in separate maps.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    live: RwLock<BTreeMap<String, AccountSnapshot>>,
    baselines: RwLock<BTreeMap<String, AccountSnapshot>>,
    fail_on_save: RwLock<bool>,
    broken_locations: RwLock<BTreeSet<String>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, location: &str, snapshot: AccountSnapshot) {
        self.live
            .write()
            .await
            .insert(location.to_string(), snapshot);
    }

    pub async fn live(&self, location: &str) -> Option<AccountSnapshot> {
        self.live.read().await.get(location).cloned()
    }

    pub async fn baseline(&self, location: &str) -> Option<AccountSnapshot> {
        self.baselines.read().await.get(location).cloned()
    }

    pub async fn set_fail_on_save(&self, fail: bool) {
        *self.fail_on_save.write().await = fail;
    }

    /// Loads of `location` fail with an IO error.
    pub async fn break_location(&self, location: &str) {
        self.broken_locations
            .write()
            .await
            .insert(location.to_string());
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self, location: &str) -> Result<AccountSnapshot, StoreError> {
        if self.broken_locations.read().await.contains(location) {
            return Err(StoreError::Io(format!("injected load failure for {location}")));
        }
        self.live
            .read()
            .await
            .get(location)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                location: location.to_string(),
            })
    }

    async fn save(
        &self,
        location: &str,
        snapshot: &AccountSnapshot,
        baseline: bool,
    ) -> Result<(), StoreError> {
        if *self.fail_on_save.read().await {
            return Err(StoreError::Io("injected save failure".to_string()));
        }
        if baseline {
            self.baselines
                .write()
                .await
                .entry(location.to_string())
                .or_insert_with(|| snapshot.clone());
        }
        self.live
            .write()
            .await
            .insert(location.to_string(), snapshot.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<AccountSnapshot>, StoreError> {
        Ok(self.live.read().await.values().cloned().collect())
    }
}
