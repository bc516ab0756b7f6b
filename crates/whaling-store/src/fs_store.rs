use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, warn};
use whaling_ports::{SnapshotStore, StoreError};
use whaling_schemas::AccountSnapshot;

use crate::atomic::write_atomic;

const PUBLIC_DIR: &str = "public";
const PRIVATE_DIR: &str = "private";

/// Snapshot store rooted at one directory.
///
/// ```text
/// <root>/public/<location>    live snapshot, rewritten every refresh
/// <root>/private/<location>   starting baseline, written once
/// ```
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    root: PathBuf,
}

impl FsSnapshotStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn live_path(&self, location: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(PUBLIC_DIR).join(checked(location)?))
    }

    pub fn baseline_path(&self, location: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(PRIVATE_DIR).join(checked(location)?))
    }

    /// Baseline of an account, if one was written.
    pub async fn load_baseline(&self, location: &str) -> Result<AccountSnapshot, StoreError> {
        read_snapshot(&self.baseline_path(location)?, location).await
    }

    /// Write a report next to the snapshot trees, e.g. `statistics.json`.
    pub async fn write_report<T: Serialize>(
        &self,
        file_name: &str,
        value: &T,
    ) -> Result<PathBuf, StoreError> {
        let path = self.root.join(checked(file_name)?);
        let bytes =
            serde_json::to_vec_pretty(value).map_err(|e| StoreError::Decode(e.to_string()))?;
        write_atomic(&path, &bytes)
            .await
            .map_err(|e| StoreError::Io(format!("write {}: {e}", path.display())))?;
        Ok(path)
    }
}

/// Locations are relative paths made of plain components only.
fn checked(location: &str) -> Result<&Path, StoreError> {
    let path = Path::new(location);
    let plain = !location.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(path)
    } else {
        Err(StoreError::InvalidLocation {
            location: location.to_string(),
        })
    }
}

async fn read_snapshot(path: &Path, location: &str) -> Result<AccountSnapshot, StoreError> {
    let bytes = match fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StoreError::NotFound {
                location: location.to_string(),
            })
        }
        Err(e) => return Err(StoreError::Io(format!("read {}: {e}", path.display()))),
    };
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(format!("{location}: {e}")))
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn load(&self, location: &str) -> Result<AccountSnapshot, StoreError> {
        read_snapshot(&self.live_path(location)?, location).await
    }

    async fn save(
        &self,
        location: &str,
        snapshot: &AccountSnapshot,
        baseline: bool,
    ) -> Result<(), StoreError> {
        let live = self.live_path(location)?;
        let bytes =
            serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Decode(e.to_string()))?;

        if baseline {
            let private = self.baseline_path(location)?;
            let present = fs::try_exists(&private)
                .await
                .map_err(|e| StoreError::Io(format!("stat {}: {e}", private.display())))?;
            if present {
                debug!(location, "baseline already present, left untouched");
            } else {
                write_atomic(&private, &bytes)
                    .await
                    .map_err(|e| StoreError::Io(format!("write {}: {e}", private.display())))?;
            }
        }

        write_atomic(&live, &bytes)
            .await
            .map_err(|e| StoreError::Io(format!("write {}: {e}", live.display())))
    }

    async fn load_all(&self) -> Result<Vec<AccountSnapshot>, StoreError> {
        let public = self.root.join(PUBLIC_DIR);
        let mut pending = vec![public];
        let mut out = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::Io(format!("read_dir {}: {e}", dir.display()))),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::Io(format!("read_dir {}: {e}", dir.display())))?
            {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().into_owned();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StoreError::Io(format!("stat {}: {e}", path.display())))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if !name.starts_with('.') && name.ends_with(".json") {
                    match read_snapshot(&path, &name).await {
                        Ok(snap) => out.push(snap),
                        Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable snapshot"),
                    }
                }
            }
        }

        out.sort_by(|a, b| a.account_id.cmp(&b.account_id));
        Ok(out)
    }
}
