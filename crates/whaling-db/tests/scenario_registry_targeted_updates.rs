//! # Invariant under test
//!
//! Every registry setter rewrites exactly one field: a scheduler stamping
//! `last_scheduled` never clobbers a credential written by a concurrent login,
//! and the due-account scan honours the watermark and the `active` flag.
//!
//! DB-backed test, skipped if WHALING_DATABASE_URL is not set.

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;
use whaling_ports::{AccountRegistry, EventSink, RegistryError};
use whaling_schemas::{Account, DomainEvent};

fn fresh_account(last_scheduled: chrono::DateTime<Utc>) -> Account {
    let id = format!("test-{}", Uuid::new_v4());
    Account {
        snapshot_location: format!("data/{id}/{}.json", Uuid::new_v4()),
        account_id: id,
        realm: "eu".to_string(),
        access_token: "original".to_string(),
        access_token_expires_at: 1_700_000_000,
        last_updated: None,
        last_scheduled,
        active: true,
    }
}

#[tokio::test]
async fn setters_touch_one_field_and_scan_honours_watermark() -> anyhow::Result<()> {
    let url = match std::env::var(whaling_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: WHALING_DATABASE_URL not set");
            return Ok(());
        }
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await?;
    whaling_db::migrate(&pool).await?;
    let registry = whaling_db::PgRegistry::new(pool.clone());

    // Far in the past so no other test data sorts in between.
    let t = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
    let due = fresh_account(t);
    let mut dormant = fresh_account(t);
    dormant.active = false;
    registry.create(&due).await?;
    registry.create(&dormant).await?;

    assert!(matches!(
        registry.create(&due).await,
        Err(RegistryError::AlreadyExists { .. })
    ));

    registry
        .set_access_credential(&due.account_id, "renewed", 1_800_000_000)
        .await?;
    registry
        .set_last_scheduled(&due.account_id, t + Duration::minutes(1))
        .await?;

    let stored = registry.get(&due.account_id).await?;
    assert_eq!(stored.access_token, "renewed");
    assert_eq!(stored.access_token_expires_at, 1_800_000_000);
    assert_eq!(stored.last_scheduled, t + Duration::minutes(1));
    assert_eq!(stored.snapshot_location, due.snapshot_location);
    assert!(stored.active);

    let scanned = registry
        .find_unscheduled(Some(t + Duration::minutes(2)))
        .await?;
    let ids: Vec<&str> = scanned.iter().map(|a| a.account_id.as_str()).collect();
    assert!(ids.contains(&due.account_id.as_str()));
    assert!(!ids.contains(&dormant.account_id.as_str()));

    assert!(matches!(
        registry.set_active("test-missing", false).await,
        Err(RegistryError::NotFound { .. })
    ));

    let sink = whaling_db::PgEventSink::new(pool.clone());
    sink.emit(&DomainEvent::ShipAddition {
        account_id: due.account_id.clone(),
        ship_id: 10,
    })
    .await?;
    let (n,): (i64,) =
        sqlx::query_as("select count(*)::bigint from domain_events where account_id = $1")
            .bind(&due.account_id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(n, 1);

    Ok(())
}
