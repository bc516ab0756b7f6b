//! Command handler modules for the `whaling` binary.
//!
//! Shared wiring (config, adapters, worker) lives here.
//! Command-specific logic lives in the submodules.

pub mod accounts;
pub mod pipeline;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use whaling_config::WhalingConfig;
use whaling_db::{PgEventSink, PgRegistry};
use whaling_policy::PolicyRegistry;
use whaling_ports::EventSink;
use whaling_runtime::RefreshWorker;
use whaling_store::{FsSnapshotStore, JsonlEventSink};
use whaling_wows::WowsApiClient;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load, hash and validate the layered configuration.
pub fn load_config(config_paths: &[String]) -> Result<WhalingConfig> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = whaling_config::load_layered_yaml(&path_refs)?;
    let cfg = loaded.typed()?;
    cfg.validate(&PolicyRegistry::with_builtin())?;
    info!(config_hash = %loaded.config_hash, policy = %cfg.promotion.policy, "config loaded");
    Ok(cfg)
}

pub async fn connect_registry() -> Result<PgRegistry> {
    let pool = whaling_db::connect_from_env().await?;
    Ok(PgRegistry::new(pool))
}

pub fn snapshot_store(cfg: &WhalingConfig) -> FsSnapshotStore {
    FsSnapshotStore::new(&cfg.storage.snapshot_root)
}

/// Event sink of the run: the JSONL log by default, `domain_events` with
/// `--events db`.
pub async fn event_sink(
    cfg: &WhalingConfig,
    registry: &PgRegistry,
    db_events: bool,
) -> Result<Arc<dyn EventSink>> {
    if db_events {
        return Ok(Arc::new(PgEventSink::new(registry.pool().clone())));
    }
    let sink = JsonlEventSink::new(&cfg.storage.events_jsonl).await?;
    Ok(Arc::new(sink))
}

/// Wire a refresh worker: live Game API client, Postgres registry, file
/// snapshots.
pub async fn build_worker(
    cfg: &WhalingConfig,
    registry: Arc<PgRegistry>,
    db_events: bool,
) -> Result<RefreshWorker> {
    let catalogue = whaling_config::load_catalogue(&cfg.promotion.catalogue_path)?;
    let ctx = whaling_config::build_promotion_context(
        cfg,
        &PolicyRegistry::with_builtin(),
        catalogue,
    )?;
    let secrets = whaling_config::resolve_api_secrets(cfg)?;
    let api = WowsApiClient::new(
        secrets.application_id,
        std::time::Duration::from_secs(cfg.api.timeout_seconds),
    )
    .context("failed to build game api client")?;
    let sink = event_sink(cfg, &registry, db_events).await?;

    Ok(RefreshWorker::new(
        ctx,
        Arc::new(api),
        registry,
        Arc::new(snapshot_store(cfg)),
        sink,
    )
    .with_token_refresh_threshold(cfg.worker.token_refresh_threshold()))
}
