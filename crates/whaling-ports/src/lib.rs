//! whaling-ports
//!
//! Collaborator interfaces of the refresh pipeline:
//! - `GameApi`: live ship statistics, port contents, credential renewal
//! - `AccountRegistry`: subscriber records with targeted field updates
//! - `SnapshotStore`: persisted account snapshots
//! - `DispatchTransport`: at-least-once delivery of refresh batches
//! - `EventSink`: best-effort domain event emission
//!
//! Implementations live in the adapter crates; in-memory fakes in
//! `whaling-testkit`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use whaling_schemas::{Account, AccountSnapshot, DomainEvent, Realm, RefreshBatch, ShipStatistics};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The credential was revoked or expired. Permanent until the owner logs
    /// in again.
    #[error("invalid access token")]
    InvalidAccessToken,
    #[error("api error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("http status {0}")]
    Http(u16),
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("account {account_id} not found")]
    NotFound { account_id: String },
    #[error("account {account_id} already exists")]
    AlreadyExists { account_id: String },
    #[error("registry backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("snapshot {location} not found")]
    NotFound { location: String },
    #[error("invalid snapshot location {location}")]
    InvalidLocation { location: String },
    #[error("snapshot io failed: {0}")]
    Io(String),
    #[error("snapshot decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("batch encode failed: {0}")]
    Encode(String),
    #[error("batch send failed: {0}")]
    Send(String),
    #[error("transport closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("event encode failed: {0}")]
    Encode(String),
    #[error("event sink unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Traits
// ============================================================================

/// Renewed access credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    /// Unix seconds.
    pub expires_at: i64,
}

/// Game Statistics API. Callers impose no retries; the next scheduled cycle
/// is the retry.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Statistics of every ship the account has ever played, keyed by ship id.
    async fn ship_statistics(
        &self,
        realm: Realm,
        access_token: &str,
        account_id: &str,
    ) -> Result<BTreeMap<i64, ShipStatistics>, ApiError>;

    /// Ship ids currently in the account's port.
    async fn port_ships(
        &self,
        realm: Realm,
        access_token: &str,
        account_id: &str,
    ) -> Result<Vec<i64>, ApiError>;

    async fn refresh_credential(
        &self,
        realm: Realm,
        access_token: &str,
        account_id: &str,
    ) -> Result<Credential, ApiError>;
}

/// Subscriber records.
///
/// Every setter touches exactly one field so that concurrent writers (login,
/// scheduler, worker) never clobber each other.
#[async_trait]
pub trait AccountRegistry: Send + Sync {
    async fn get(&self, account_id: &str) -> Result<Account, RegistryError>;

    async fn create(&self, account: &Account) -> Result<(), RegistryError>;

    async fn set_access_credential(
        &self,
        account_id: &str,
        access_token: &str,
        expires_at: i64,
    ) -> Result<(), RegistryError>;

    async fn set_active(&self, account_id: &str, active: bool) -> Result<(), RegistryError>;

    async fn set_last_updated(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RegistryError>;

    async fn set_last_scheduled(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RegistryError>;

    /// Active accounts with `last_scheduled` strictly before `watermark`, or
    /// every active account when `watermark` is `None`. Ordered by account id.
    async fn find_unscheduled(
        &self,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<Vec<Account>, RegistryError>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fails with [`StoreError::NotFound`] when nothing was saved yet.
    async fn load(&self, location: &str) -> Result<AccountSnapshot, StoreError>;

    /// Replace the live snapshot. With `baseline`, also keep an immutable copy
    /// of this first state.
    async fn save(
        &self,
        location: &str,
        snapshot: &AccountSnapshot,
        baseline: bool,
    ) -> Result<(), StoreError>;

    /// Every live snapshot in the store.
    async fn load_all(&self) -> Result<Vec<AccountSnapshot>, StoreError>;
}

#[async_trait]
pub trait DispatchTransport: Send + Sync {
    async fn send(&self, batch: &RefreshBatch) -> Result<(), TransportError>;
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &DomainEvent) -> Result<(), SinkError>;
}
