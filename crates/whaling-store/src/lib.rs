//! whaling-store
//!
//! Filesystem adapters:
//! - `FsSnapshotStore`: live snapshots under `public/`, immutable baselines
//!   under `private/`, every write through temp file + rename
//! - `JsonlEventSink`: append-only JSON Lines event log
//! - `OutboxTransport`: one JSON payload file per dispatched batch

mod atomic;
mod fs_store;
mod jsonl;
mod outbox;

pub use fs_store::FsSnapshotStore;
pub use jsonl::{read_event_log, EventLine, JsonlEventSink};
pub use outbox::OutboxTransport;
