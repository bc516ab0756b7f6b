//! Account-facing commands: enrollment, manual refresh, manual credit and
//! global statistics.

use anyhow::{Context, Result};
use chrono::Utc;
use whaling_runtime::EnrollRequest;
use whaling_schemas::Realm;
use whaling_store::OutboxTransport;

use super::{connect_registry, event_sink, load_config, snapshot_store};

pub async fn enroll(
    config_paths: &[String],
    account_id: String,
    realm: &str,
    access_token: String,
    expires_at: i64,
) -> Result<()> {
    let realm: Realm = realm.parse().context("invalid --realm")?;
    let cfg = load_config(config_paths)?;
    let registry = connect_registry().await?;
    let outbox = OutboxTransport::new(&cfg.storage.outbox_dir);

    let enrollment = whaling_runtime::enroll(
        &registry,
        &outbox,
        EnrollRequest {
            account_id,
            realm,
            access_token,
            expires_at,
        },
        Utc::now(),
    )
    .await?;

    println!("account_id={}", enrollment.account.account_id);
    println!("is_new={}", enrollment.is_new);
    println!("active={}", enrollment.account.active);
    println!("snapshot_location={}", enrollment.account.snapshot_location);
    println!("dispatched={}", enrollment.dispatched);
    Ok(())
}

pub async fn request_refresh(config_paths: &[String], account_id: &str) -> Result<()> {
    let cfg = load_config(config_paths)?;
    let registry = connect_registry().await?;
    let outbox = OutboxTransport::new(&cfg.storage.outbox_dir);

    let batch = whaling_runtime::request_refresh(
        &registry,
        &outbox,
        account_id,
        cfg.worker.manual_refresh_cooldown(),
        Utc::now(),
    )
    .await?;
    println!("refresh_requested=true account_id={account_id} batch_id={}", batch.batch_id);
    Ok(())
}

pub async fn credit(config_paths: &[String], account_id: &str, ship_id: i64) -> Result<()> {
    let cfg = load_config(config_paths)?;
    let registry = connect_registry().await?;
    let store = snapshot_store(&cfg);
    let sink = event_sink(&cfg, &registry, false).await?;

    let event = whaling_runtime::credit_ship(
        &registry,
        &store,
        sink.as_ref(),
        account_id,
        ship_id,
        Utc::now(),
    )
    .await?;
    println!("credited=true account_id={account_id} ship_id={ship_id}");
    println!("{}", serde_json::to_string(&event)?);
    Ok(())
}

/// Needs only the snapshot tree, no database.
pub async fn global_stats(config_paths: &[String]) -> Result<()> {
    let cfg = load_config(config_paths)?;
    let store = snapshot_store(&cfg);

    let stats = whaling_runtime::collect_global_statistics(&store).await?;
    let path = store.write_report("statistics.json", &stats).await?;

    println!("accounts={}", stats.accounts);
    println!("ships={}", stats.ships);
    for r in &stats.resources {
        println!("resource={} awardable={} earned={}", r.kind, r.awardable, r.earned);
    }
    println!("report={}", path.display());
    Ok(())
}
