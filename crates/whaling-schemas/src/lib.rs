//! whaling-schemas
//!
//! Data shapes shared by the engine, the runtime and every adapter: accounts,
//! live ship statistics, the persisted account snapshot, domain events and the
//! refresh batch wire format.

mod account;
mod events;
mod request;
mod snapshot;
mod stats;

pub use account::{Account, Realm, RealmParseError};
pub use events::{CreditReason, DomainEvent, RemovalReason};
pub use request::{BatchDecodeError, RefreshBatch, RefreshRequest};
pub use snapshot::{AccountSnapshot, ResourceTotal, RewardRecord, ShipEntry};
pub use stats::{GameMode, ModeCounters, ShipStatistics, NEVER_PLAYED};
