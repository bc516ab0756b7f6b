//! In-memory collaborators for runtime tests.
//!
//! Every fake records what it was asked to do and can be told to fail, so
//! tests can assert both outcomes and the exact registry writes.

mod clock;
mod fixtures;
mod game_api;
mod registry;
mod sinks;
mod store;

pub use clock::ManualClock;
pub use fixtures::{account, catalogue, played_stats, promotion_start};
pub use game_api::{ApiCall, FakeGameApi};
pub use registry::{InMemoryRegistry, RegistryWrite};
pub use sinks::{RecordingSink, RecordingTransport};
pub use store::InMemorySnapshotStore;
