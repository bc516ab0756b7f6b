use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use whaling_ports::{
    AccountRegistry, DispatchTransport, EventSink, RegistryError, SnapshotStore, StoreError,
    TransportError,
};
use whaling_reconcile::{credit_manually, global_statistics, CreditError, GlobalStatistics};
use whaling_schemas::{DomainEvent, RefreshBatch};

#[derive(Debug, thiserror::Error)]
pub enum ManualRefreshError {
    #[error("account {account_id} is not registered")]
    UnknownAccount { account_id: String },
    #[error("account {account_id} was scheduled recently, retry after {retry_after}")]
    TooSoon {
        account_id: String,
        retry_after: DateTime<Utc>,
    },
    #[error(transparent)]
    Registry(RegistryError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Owner-requested refresh, outside the scheduler's cadence.
///
/// Refused while the account's last scheduling is younger than `cooldown`.
/// `last_scheduled` is stamped only after the batch was handed to the
/// transport; a failed send leaves the account free to retry. A failed stamp
/// after a successful send is logged and does not fail the request.
pub async fn request_refresh(
    registry: &dyn AccountRegistry,
    transport: &dyn DispatchTransport,
    account_id: &str,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> Result<RefreshBatch, ManualRefreshError> {
    let account = registry.get(account_id).await.map_err(|e| match e {
        RegistryError::NotFound { account_id } => ManualRefreshError::UnknownAccount { account_id },
        other => ManualRefreshError::Registry(other),
    })?;

    let retry_after = account.last_scheduled + cooldown;
    if now < retry_after {
        return Err(ManualRefreshError::TooSoon {
            account_id: account.account_id,
            retry_after,
        });
    }

    let batch = RefreshBatch::new(vec![account.refresh_request()], now);
    transport.send(&batch).await?;
    info!(account_id, batch_id = %batch.batch_id, "manual refresh dispatched");

    if let Err(e) = registry.set_last_scheduled(account_id, now).await {
        warn!(account_id, error = %e, "could not stamp last_scheduled after manual refresh");
    }
    Ok(batch)
}

#[derive(Debug, thiserror::Error)]
pub enum CreditServiceError {
    #[error("account {account_id} is not registered")]
    UnknownAccount { account_id: String },
    #[error("account {account_id} has no snapshot yet")]
    NoSnapshot { account_id: String },
    #[error(transparent)]
    Credit(#[from] CreditError),
    #[error(transparent)]
    Registry(RegistryError),
    #[error(transparent)]
    Store(StoreError),
}

/// "Mark as played": credit one tracked ship without a detected win.
///
/// The updated snapshot is saved as the live copy only; the baseline is
/// never touched. The event goes out best-effort after the save.
pub async fn credit_ship(
    registry: &dyn AccountRegistry,
    store: &dyn SnapshotStore,
    sink: &dyn EventSink,
    account_id: &str,
    ship_id: i64,
    now: DateTime<Utc>,
) -> Result<DomainEvent, CreditServiceError> {
    let account = registry.get(account_id).await.map_err(|e| match e {
        RegistryError::NotFound { account_id } => CreditServiceError::UnknownAccount { account_id },
        other => CreditServiceError::Registry(other),
    })?;

    let mut snapshot = store
        .load(&account.snapshot_location)
        .await
        .map_err(|e| match e {
            StoreError::NotFound { .. } => CreditServiceError::NoSnapshot {
                account_id: account.account_id.clone(),
            },
            other => CreditServiceError::Store(other),
        })?;

    let event = credit_manually(&mut snapshot, ship_id, now)?;
    store
        .save(&account.snapshot_location, &snapshot, false)
        .await
        .map_err(CreditServiceError::Store)?;
    info!(account_id, ship_id, "ship credited manually");

    if let Err(e) = sink.emit(&event).await {
        warn!(account_id, ship_id, error = %e, "event emission failed");
    }
    if let Err(e) = registry.set_last_updated(account_id, snapshot.last_updated).await {
        warn!(account_id, error = %e, "could not set last_updated");
    }
    Ok(event)
}

/// Promotion-wide totals over every stored live snapshot.
pub async fn collect_global_statistics(store: &dyn SnapshotStore) -> Result<GlobalStatistics> {
    let snapshots = store
        .load_all()
        .await
        .context("loading snapshots for global statistics failed")?;
    let stats = global_statistics(&snapshots);
    info!(accounts = stats.accounts, ships = stats.ships, "global statistics collected");
    Ok(stats)
}
