use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use whaling_ports::{AccountRegistry, DispatchTransport};
use whaling_schemas::{RefreshBatch, RefreshRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOptions {
    /// Batch ceiling.
    pub batch_size: usize,
    /// Bound on concurrent `last_scheduled` updates.
    pub stamp_concurrency: usize,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            stamp_concurrency: 16,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub selected: usize,
    pub batches_sent: usize,
    pub batches_failed: usize,
    pub stamped: usize,
    pub stamp_failures: usize,
}

/// "Not scheduled since" cut-off: `now - interval`, or `None` to force every
/// active account.
pub fn watermark_for(now: DateTime<Utc>, interval: Duration, force_all: bool) -> Option<DateTime<Utc>> {
    if force_all {
        None
    } else {
        Some(now - interval)
    }
}

/// Select due accounts, dispatch them in batches and stamp each one's
/// `last_scheduled` to `now`.
///
/// Stamping runs alongside batch assembly and is joined before returning; it
/// is not ordered against dispatch. A failed dispatch is logged and counted,
/// the remaining batches are still sent.
///
/// # Errors
/// Only when the candidate scan itself fails.
pub async fn schedule(
    registry: Arc<dyn AccountRegistry>,
    transport: &dyn DispatchTransport,
    watermark: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    opts: ScheduleOptions,
) -> Result<ScheduleReport> {
    let candidates = registry
        .find_unscheduled(watermark)
        .await
        .context("scan for unscheduled accounts failed")?;

    let mut report = ScheduleReport {
        selected: candidates.len(),
        ..ScheduleReport::default()
    };
    info!(selected = report.selected, watermark = ?watermark, "scheduling refresh");

    let batch_size = opts.batch_size.max(1);
    let permits = Arc::new(Semaphore::new(opts.stamp_concurrency.max(1)));
    let mut stamps: JoinSet<std::result::Result<(), String>> = JoinSet::new();
    let mut batch: Vec<RefreshRequest> = Vec::with_capacity(batch_size);

    for account in candidates {
        batch.push(account.refresh_request());

        let registry = Arc::clone(&registry);
        let permits = Arc::clone(&permits);
        let account_id = account.account_id;
        stamps.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| format!("{account_id}: {e}"))?;
            registry
                .set_last_scheduled(&account_id, now)
                .await
                .map_err(|e| format!("{account_id}: {e}"))
        });

        if batch.len() >= batch_size {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
            dispatch(transport, full, now, &mut report).await;
        }
    }
    if !batch.is_empty() {
        dispatch(transport, batch, now, &mut report).await;
    }

    while let Some(joined) = stamps.join_next().await {
        match joined {
            Ok(Ok(())) => report.stamped += 1,
            Ok(Err(e)) => {
                warn!(error = %e, "last_scheduled update failed");
                report.stamp_failures += 1;
            }
            Err(e) => {
                error!(error = %e, "last_scheduled task aborted");
                report.stamp_failures += 1;
            }
        }
    }

    info!(
        selected = report.selected,
        batches_sent = report.batches_sent,
        batches_failed = report.batches_failed,
        stamp_failures = report.stamp_failures,
        "scheduling done"
    );
    Ok(report)
}

async fn dispatch(
    transport: &dyn DispatchTransport,
    requests: Vec<RefreshRequest>,
    now: DateTime<Utc>,
    report: &mut ScheduleReport,
) {
    let batch = RefreshBatch::new(requests, now);
    match transport.send(&batch).await {
        Ok(()) => {
            info!(batch_id = %batch.batch_id, batch_size = batch.len(), "batch dispatched");
            report.batches_sent += 1;
        }
        Err(e) => {
            error!(batch_id = %batch.batch_id, batch_size = batch.len(), error = %e, "batch dispatch failed");
            report.batches_failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermark_is_interval_before_now_unless_forced() {
        let now = whaling_testkit::promotion_start();
        assert_eq!(
            watermark_for(now, Duration::minutes(120), false),
            Some(now - Duration::hours(2))
        );
        assert_eq!(watermark_for(now, Duration::minutes(120), true), None);
    }
}
