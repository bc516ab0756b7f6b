use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};
use whaling_ports::{AccountRegistry, DispatchTransport, TransportError};
use whaling_schemas::RefreshBatch;

use crate::{schedule, watermark_for, RefreshWorker, ScheduleOptions};

/// In-process transport: batches travel as their JSON payload over an mpsc
/// channel, exactly as they would through an external queue.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<String>,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl DispatchTransport for ChannelTransport {
    async fn send(&self, batch: &RefreshBatch) -> Result<(), TransportError> {
        let payload = batch
            .to_json()
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        self.tx.send(payload).await.map_err(|_| TransportError::Closed)
    }
}

/// Spawn a background task that runs the scheduler every `every`, selecting
/// accounts not scheduled within `cutoff`.
pub fn spawn_scheduler_loop(
    registry: Arc<dyn AccountRegistry>,
    transport: Arc<dyn DispatchTransport>,
    every: std::time::Duration,
    cutoff: chrono::Duration,
    opts: ScheduleOptions,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let now = Utc::now();
            let watermark = watermark_for(now, cutoff, false);
            if let Err(e) = schedule(
                Arc::clone(&registry),
                transport.as_ref(),
                watermark,
                now,
                opts,
            )
            .await
            {
                error!(error = %e, "scheduler pass failed");
            }
        }
    })
}

/// Spawn the batch consumer: one worker invocation per received payload.
/// Batches run concurrently; accounts inside a batch stay sequential.
///
/// Finishes once the channel is closed and every in-flight batch is done.
pub fn spawn_batch_consumer(
    worker: RefreshWorker,
    mut rx: mpsc::Receiver<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut inflight = JoinSet::new();
        while let Some(payload) = rx.recv().await {
            let worker = worker.clone();
            inflight.spawn(async move {
                match worker.process_payload(&payload).await {
                    Ok(report) => info!(
                        refreshed = report.refreshed(),
                        total = report.outcomes.len(),
                        emit_failures = report.emit_failures,
                        "batch consumed"
                    ),
                    Err(e) => warn!(error = %format!("{e:#}"), "batch dropped"),
                }
            });
            while let Some(done) = inflight.try_join_next() {
                if let Err(e) = done {
                    error!(error = %e, "batch task aborted");
                }
            }
        }
        while let Some(done) = inflight.join_next().await {
            if let Err(e) = done {
                error!(error = %e, "batch task aborted");
            }
        }
    })
}
