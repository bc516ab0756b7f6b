use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;
use whaling_ports::{AccountRegistry, DispatchTransport, RegistryError};
use whaling_schemas::{Account, Realm, RefreshBatch};

/// A successful login as handed over by the authentication front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollRequest {
    pub account_id: String,
    pub realm: Realm,
    pub access_token: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub account: Account,
    pub is_new: bool,
    /// Whether the first refresh was handed to the transport.
    pub dispatched: bool,
}

/// Register a new account or reactivate a known one.
///
/// A new account gets a fresh snapshot location and its first refresh is
/// dispatched right away; a dispatch failure is logged and left to the next
/// scheduler pass. A known account only sees targeted updates of its
/// credential and `active` flag.
pub async fn enroll(
    registry: &dyn AccountRegistry,
    transport: &dyn DispatchTransport,
    req: EnrollRequest,
    now: DateTime<Utc>,
) -> Result<Enrollment> {
    match registry.get(&req.account_id).await {
        Ok(existing) => reactivate(registry, existing, req).await,
        Err(RegistryError::NotFound { .. }) => create(registry, transport, req, now).await,
        Err(e) => Err(e).with_context(|| format!("account lookup failed for {}", req.account_id)),
    }
}

async fn reactivate(
    registry: &dyn AccountRegistry,
    mut account: Account,
    req: EnrollRequest,
) -> Result<Enrollment> {
    if account.access_token != req.access_token || account.access_token_expires_at != req.expires_at {
        registry
            .set_access_credential(&account.account_id, &req.access_token, req.expires_at)
            .await
            .context("credential update failed")?;
        account.access_token = req.access_token;
        account.access_token_expires_at = req.expires_at;
    }
    if !account.active {
        registry
            .set_active(&account.account_id, true)
            .await
            .context("reactivation failed")?;
        account.active = true;
    }
    info!(account_id = %account.account_id, realm = %account.realm, "known account logged in");
    Ok(Enrollment {
        account,
        is_new: false,
        dispatched: false,
    })
}

async fn create(
    registry: &dyn AccountRegistry,
    transport: &dyn DispatchTransport,
    req: EnrollRequest,
    now: DateTime<Utc>,
) -> Result<Enrollment> {
    let account = Account {
        snapshot_location: format!("data/{}/{}.json", req.account_id, Uuid::new_v4()),
        account_id: req.account_id,
        realm: req.realm.as_str().to_string(),
        access_token: req.access_token,
        access_token_expires_at: req.expires_at,
        last_updated: None,
        last_scheduled: now,
        active: true,
    };
    registry
        .create(&account)
        .await
        .with_context(|| format!("account creation failed for {}", account.account_id))?;
    info!(account_id = %account.account_id, realm = %account.realm, "account enrolled");

    let batch = RefreshBatch::new(vec![account.refresh_request()], now);
    let dispatched = match transport.send(&batch).await {
        Ok(()) => true,
        Err(e) => {
            warn!(account_id = %account.account_id, error = %e, "first refresh dispatch failed");
            false
        }
    };

    Ok(Enrollment {
        account,
        is_new: true,
        dispatched,
    })
}
