use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use whaling_ports::{DispatchTransport, TransportError};
use whaling_schemas::RefreshBatch;

use crate::atomic::write_atomic;

/// Dispatch transport backed by a directory: each batch becomes one JSON file
/// named after its creation time and id, so a directory listing is in
/// dispatch order.
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    dir: PathBuf,
}

impl OutboxTransport {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, batch: &RefreshBatch) -> PathBuf {
        self.dir.join(format!(
            "{}-{}.json",
            batch.created_at.format("%Y%m%dT%H%M%S%.3fZ"),
            batch.batch_id
        ))
    }

    /// Payload files not yet acknowledged, oldest first.
    pub async fn pending(&self) -> Result<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("read outbox {:?}", self.dir)),
        };
        let mut out = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("read outbox {:?}", self.dir))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') && name.ends_with(".json") {
                out.push(entry.path());
            }
        }
        out.sort();
        Ok(out)
    }

    /// Remove a consumed payload file.
    pub async fn acknowledge(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
            .await
            .with_context(|| format!("remove outbox payload {:?}", path))
    }
}

#[async_trait]
impl DispatchTransport for OutboxTransport {
    async fn send(&self, batch: &RefreshBatch) -> Result<(), TransportError> {
        let payload = batch
            .to_json()
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        let path = self.file_for(batch);
        write_atomic(&path, payload.as_bytes())
            .await
            .map_err(|e| TransportError::Send(format!("write {}: {e}", path.display())))?;
        debug!(path = %path.display(), batch_size = batch.len(), "batch written to outbox");
        Ok(())
    }
}
