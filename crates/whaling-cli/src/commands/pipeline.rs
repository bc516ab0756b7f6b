//! Refresh pipeline commands: `schedule`, `refresh`, `serve`.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::{error, info};
use whaling_ports::DispatchTransport;
use whaling_runtime::{
    spawn_batch_consumer, spawn_scheduler_loop, watermark_for, BatchReport, ChannelTransport,
    ScheduleOptions,
};
use whaling_store::OutboxTransport;

use super::{build_worker, connect_registry, load_config};

/// Capacity of the in-process batch channel used by `serve`.
const SERVE_CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// schedule
// ---------------------------------------------------------------------------

pub async fn schedule(config_paths: &[String], all: bool) -> Result<()> {
    let cfg = load_config(config_paths)?;
    let registry = Arc::new(connect_registry().await?);
    let outbox = OutboxTransport::new(&cfg.storage.outbox_dir);

    let now = Utc::now();
    let watermark = watermark_for(now, cfg.scheduler.interval(), all);
    let report = whaling_runtime::schedule(
        registry,
        &outbox,
        watermark,
        now,
        ScheduleOptions {
            batch_size: cfg.scheduler.batch_size,
            stamp_concurrency: cfg.scheduler.stamp_concurrency,
        },
    )
    .await?;

    println!("selected={}", report.selected);
    println!("batches_sent={}", report.batches_sent);
    println!("batches_failed={}", report.batches_failed);
    println!("stamped={}", report.stamped);
    println!("stamp_failures={}", report.stamp_failures);
    println!("outbox={}", outbox.dir().display());
    Ok(())
}

// ---------------------------------------------------------------------------
// refresh
// ---------------------------------------------------------------------------

pub async fn refresh(
    config_paths: &[String],
    payload_file: Option<String>,
    outbox: bool,
    db_events: bool,
) -> Result<()> {
    if payload_file.is_none() && !outbox {
        bail!("must provide --payload-file or --outbox");
    }

    let cfg = load_config(config_paths)?;
    let registry = Arc::new(connect_registry().await?);
    let worker = build_worker(&cfg, registry, db_events).await?;

    if let Some(p) = payload_file {
        let raw = tokio::fs::read_to_string(&p)
            .await
            .with_context(|| format!("read payload-file failed: {p}"))?;
        let report = worker.process_payload(&raw).await?;
        print_batch_report(&p, &report);
        return Ok(());
    }

    let transport = OutboxTransport::new(&cfg.storage.outbox_dir);
    let pending = transport.pending().await?;
    let mut consumed = 0usize;
    let mut rejected = 0usize;
    for path in pending {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("read outbox payload failed: {}", path.display()))?;
        match worker.process_payload(&raw).await {
            Ok(report) => {
                print_batch_report(&path.display().to_string(), &report);
                transport.acknowledge(&path).await?;
                consumed += 1;
            }
            // Left in place for inspection.
            Err(e) => {
                error!(path = %path.display(), error = %format!("{e:#}"), "outbox payload rejected");
                rejected += 1;
            }
        }
    }
    println!("batches_consumed={consumed} batches_rejected={rejected}");
    Ok(())
}

fn print_batch_report(source: &str, report: &BatchReport) {
    println!(
        "batch={} accounts={} refreshed={} tokens_refreshed={} token_refresh_failures={} emit_failures={} last_updated_failures={}",
        source,
        report.outcomes.len(),
        report.refreshed(),
        report.tokens_refreshed,
        report.token_refresh_failures,
        report.emit_failures,
        report.last_updated_failures
    );
}

// ---------------------------------------------------------------------------
// serve
// ---------------------------------------------------------------------------

/// Scheduler loop and batch consumer in one process, joined by a channel.
/// Ctrl-C stops scheduling, then waits for in-flight batches.
pub async fn serve(config_paths: &[String], db_events: bool) -> Result<()> {
    let cfg = load_config(config_paths)?;
    let registry = Arc::new(connect_registry().await?);
    let worker = build_worker(&cfg, Arc::clone(&registry), db_events).await?;

    let every = cfg
        .scheduler
        .interval()
        .to_std()
        .context("scheduler.interval_minutes out of range")?;
    let (transport, rx) = ChannelTransport::new(SERVE_CHANNEL_CAPACITY);
    let transport: Arc<dyn DispatchTransport> = Arc::new(transport);

    let consumer = spawn_batch_consumer(worker, rx);
    let scheduler = spawn_scheduler_loop(
        registry,
        transport,
        every,
        cfg.scheduler.interval(),
        ScheduleOptions {
            batch_size: cfg.scheduler.batch_size,
            stamp_concurrency: cfg.scheduler.stamp_concurrency,
        },
    );
    info!(interval_minutes = cfg.scheduler.interval_minutes, "serving");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown requested");

    // Dropping the scheduler task drops the last sender and closes the channel.
    scheduler.abort();
    let _ = scheduler.await;
    consumer.await.context("batch consumer panicked")?;
    println!("serve_stopped=true");
    Ok(())
}
