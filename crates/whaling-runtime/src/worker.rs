use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, info_span, warn, Instrument};
use whaling_ports::{AccountRegistry, ApiError, EventSink, GameApi, SnapshotStore, StoreError};
use whaling_reconcile::{LiveFetch, PromotionContext};
use whaling_schemas::{Realm, RefreshBatch, RefreshRequest};

/// How one refresh request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    Refreshed {
        account_id: String,
        is_new: bool,
        events: usize,
        credited: usize,
    },
    /// Realm unknown or without a configured promotion start.
    InvalidRealm { account_id: String, realm: String },
    LoadFailed { account_id: String, error: String },
    /// Credential rejected; the account was marked inactive.
    Deactivated { account_id: String },
    FetchFailed { account_id: String, error: String },
    /// Previous snapshot stays authoritative; `last_updated` not advanced.
    SaveFailed { account_id: String, error: String },
}

impl AccountOutcome {
    pub fn account_id(&self) -> &str {
        match self {
            AccountOutcome::Refreshed { account_id, .. }
            | AccountOutcome::InvalidRealm { account_id, .. }
            | AccountOutcome::LoadFailed { account_id, .. }
            | AccountOutcome::Deactivated { account_id }
            | AccountOutcome::FetchFailed { account_id, .. }
            | AccountOutcome::SaveFailed { account_id, .. } => account_id,
        }
    }

    pub fn is_refreshed(&self) -> bool {
        matches!(self, AccountOutcome::Refreshed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One per request, in batch order.
    pub outcomes: Vec<AccountOutcome>,
    pub tokens_refreshed: usize,
    pub token_refresh_failures: usize,
    pub emit_failures: usize,
    pub last_updated_failures: usize,
}

impl BatchReport {
    pub fn refreshed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_refreshed()).count()
    }
}

/// Source of the current time, read once per account.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Consumes refresh batches. Accounts within a batch are processed one after
/// another to stay inside the Game API's rate limits.
#[derive(Clone)]
pub struct RefreshWorker {
    ctx: PromotionContext,
    api: Arc<dyn GameApi>,
    registry: Arc<dyn AccountRegistry>,
    store: Arc<dyn SnapshotStore>,
    sink: Arc<dyn EventSink>,
    token_refresh_threshold: Duration,
    clock: Clock,
}

impl RefreshWorker {
    pub fn new(
        ctx: PromotionContext,
        api: Arc<dyn GameApi>,
        registry: Arc<dyn AccountRegistry>,
        store: Arc<dyn SnapshotStore>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            ctx,
            api,
            registry,
            store,
            sink,
            token_refresh_threshold: Duration::hours(3),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_token_refresh_threshold(mut self, threshold: Duration) -> Self {
        self.token_refresh_threshold = threshold;
        self
    }

    /// Replace the wall clock, e.g. with a controllable one in tests.
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Decode a transport payload and process it. A payload that does not
    /// decode aborts before any account is touched.
    pub async fn process_payload(&self, raw: &str) -> Result<BatchReport> {
        let batch = RefreshBatch::from_json(raw).context("refresh batch rejected")?;
        Ok(self.process_batch(&batch).await)
    }

    /// Each account reads the clock when its own refresh starts.
    pub async fn process_batch(&self, batch: &RefreshBatch) -> BatchReport {
        info!(batch_id = %batch.batch_id, batch_size = batch.len(), "processing batch");
        let mut report = BatchReport::default();

        for req in &batch.requests {
            let span = info_span!("refresh", account_id = %req.account_id, realm = %req.realm);
            let outcome = self.refresh_one(req, &mut report).instrument(span).await;
            report.outcomes.push(outcome);
        }

        info!(
            batch_id = %batch.batch_id,
            refreshed = report.refreshed(),
            total = report.outcomes.len(),
            "batch done"
        );
        report
    }

    async fn refresh_one(
        &self,
        req: &RefreshRequest,
        report: &mut BatchReport,
    ) -> AccountOutcome {
        let account_id = req.account_id.clone();
        let now = (self.clock)();

        // 1. Realm must be known and carry a promotion start.
        let Some((realm, engine)) = req
            .realm
            .parse::<Realm>()
            .ok()
            .and_then(|r| self.ctx.reconciler(r).map(|e| (r, e)))
        else {
            warn!("skipping account with invalid realm");
            return AccountOutcome::InvalidRealm {
                account_id,
                realm: req.realm.clone(),
            };
        };

        // 2. Previous snapshot; absent means a first refresh.
        let previous = match self.store.load(&req.snapshot_location).await {
            Ok(snap) => Some(snap),
            Err(StoreError::NotFound { .. }) => None,
            Err(e) => {
                error!(error = %e, "snapshot load failed");
                return AccountOutcome::LoadFailed {
                    account_id,
                    error: e.to_string(),
                };
            }
        };

        // 3. Renew a credential close to expiry; keep the old one on failure.
        let mut access_token = req.access_token.clone();
        if req.access_token_expires_at - now.timestamp() < self.token_refresh_threshold.num_seconds() {
            match self
                .api
                .refresh_credential(realm, &access_token, &account_id)
                .await
            {
                Ok(cred) => {
                    report.tokens_refreshed += 1;
                    if let Err(e) = self
                        .registry
                        .set_access_credential(&account_id, &cred.access_token, cred.expires_at)
                        .await
                    {
                        error!(error = %e, "could not persist renewed credential");
                    }
                    access_token = cred.access_token;
                }
                Err(e) => {
                    report.token_refresh_failures += 1;
                    warn!(error = %e, "credential renewal failed, continuing with current token");
                }
            }
        }

        // 4. Live fetch.
        let statistics = match self
            .api
            .ship_statistics(realm, &access_token, &account_id)
            .await
        {
            Ok(s) => s,
            Err(ApiError::InvalidAccessToken) => {
                warn!("access token rejected, deactivating account");
                if let Err(e) = self.registry.set_active(&account_id, false).await {
                    error!(error = %e, "could not deactivate account");
                }
                return AccountOutcome::Deactivated { account_id };
            }
            Err(e) => {
                error!(error = %e, "ship statistics fetch failed");
                return AccountOutcome::FetchFailed {
                    account_id,
                    error: e.to_string(),
                };
            }
        };
        let port = match self.api.port_ships(realm, &access_token, &account_id).await {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "port fetch failed");
                return AccountOutcome::FetchFailed {
                    account_id,
                    error: e.to_string(),
                };
            }
        };

        // 5. Reconcile.
        let outcome = engine.reconcile(&account_id, previous, LiveFetch { statistics, port }, now);

        // 6. Persist; a new account also gets its baseline.
        if let Err(e) = self
            .store
            .save(&req.snapshot_location, &outcome.snapshot, outcome.is_new)
            .await
        {
            error!(error = %e, "snapshot save failed");
            return AccountOutcome::SaveFailed {
                account_id,
                error: e.to_string(),
            };
        }

        // 7. Registry bookkeeping.
        if let Err(e) = self
            .registry
            .set_last_updated(&account_id, outcome.snapshot.last_updated)
            .await
        {
            report.last_updated_failures += 1;
            error!(error = %e, "could not set last_updated");
        }

        // 8. Best-effort events.
        for event in &outcome.events {
            if let Err(e) = self.sink.emit(event).await {
                report.emit_failures += 1;
                warn!(error = %e, event = event.event_type(), ship_id = event.ship_id(), "event emission failed");
            }
        }

        let credited = outcome.credited();
        info!(
            is_new = outcome.is_new,
            ships = outcome.snapshot.ships.len(),
            events = outcome.events.len(),
            credited,
            "account refreshed"
        );
        AccountOutcome::Refreshed {
            account_id,
            is_new: outcome.is_new,
            events: outcome.events.len(),
            credited,
        }
    }
}
