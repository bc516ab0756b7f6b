//! whaling-wows
//!
//! Game Statistics API adapter.
//!
//! - `wire`: raw response envelopes and normalisation into `ShipStatistics`
//! - `client`: reqwest client implementing `whaling_ports::GameApi`
//!
//! The application id is passed in by the caller; it is never logged.

mod client;
mod wire;

pub use client::WowsApiClient;
pub use wire::{
    normalize_ship, normalize_statistics, Envelope, RawApiError, RawCounters, RawShipPrivate,
    RawShipStatistics, WireError,
};
