use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;
use whaling_ports::{EventSink, SinkError};
use whaling_schemas::DomainEvent;

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLine {
    pub event_id: Uuid,
    pub ts_utc: DateTime<Utc>,
    pub event_type: String,
    pub payload: DomainEvent,
}

/// Append-only event sink. Writes JSON Lines (one event per line, keys
/// sorted) and serialises concurrent appends.
pub struct JsonlEventSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlEventSink {
    /// Creates the sink and ensures parent dirs exist.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create_dir_all {:?}", parent))?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_line(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock().await;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        f.write_all(&buf).await?;
        f.flush().await
    }
}

#[async_trait]
impl EventSink for JsonlEventSink {
    async fn emit(&self, event: &DomainEvent) -> Result<(), SinkError> {
        let line = EventLine {
            event_id: Uuid::new_v4(),
            ts_utc: Utc::now(),
            event_type: event.event_type().to_string(),
            payload: event.clone(),
        };
        let encoded = canonical_json_line(&line).map_err(|e| SinkError::Encode(e.to_string()))?;
        self.append_line(&encoded)
            .await
            .map_err(|e| SinkError::Unavailable(format!("append {:?}: {e}", self.path)))
    }
}

/// Read an event log back. Blank lines are ignored.
pub fn read_event_log(path: impl AsRef<Path>) -> Result<Vec<EventLine>> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read event log {:?}", path.as_ref()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            serde_json::from_str(l.trim()).with_context(|| format!("parse event at line {}", i + 1))
        })
        .collect()
}

/// Canonicalize by sorting keys recursively and emitting compact JSON.
fn canonical_json_line<T: Serialize>(v: &T) -> serde_json::Result<String> {
    let raw = serde_json::to_value(v)?;
    serde_json::to_string(&sort_keys(&raw))
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}
