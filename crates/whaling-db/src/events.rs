use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;
use whaling_ports::{EventSink, SinkError};
use whaling_schemas::DomainEvent;

/// Event sink appending to `domain_events` (append-only semantics enforced at
/// app layer).
#[derive(Debug, Clone)]
pub struct PgEventSink {
    pool: PgPool,
}

impl PgEventSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventSink for PgEventSink {
    async fn emit(&self, event: &DomainEvent) -> Result<(), SinkError> {
        let payload = serde_json::to_value(event).map_err(|e| SinkError::Encode(e.to_string()))?;
        let event_id = Uuid::new_v4();
        sqlx::query(
            r#"
            insert into domain_events (
              event_id, ts_utc, event_type, account_id, ship_id, payload
            ) values (
              $1, $2, $3, $4, $5, $6
            )
            "#,
        )
        .bind(event_id)
        .bind(Utc::now())
        .bind(event.event_type())
        .bind(event.account_id())
        .bind(event.ship_id())
        .bind(&payload)
        .execute(&self.pool)
        .await
        .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        debug!(%event_id, event_type = event.event_type(), "event stored");
        Ok(())
    }
}
