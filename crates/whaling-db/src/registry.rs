use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgQueryResult, PgRow};
use sqlx::{PgPool, Row};
use whaling_ports::{AccountRegistry, RegistryError};
use whaling_schemas::Account;

const ACCOUNT_COLUMNS: &str = "account_id, realm, access_token, access_token_expires_at, \
snapshot_location, last_updated, last_scheduled, active";

/// Account Registry on the `accounts` table.
#[derive(Debug, Clone)]
pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn backend(e: sqlx::Error) -> RegistryError {
    RegistryError::Backend(e.to_string())
}

fn account_from_row(row: &PgRow) -> Result<Account, sqlx::Error> {
    Ok(Account {
        account_id: row.try_get("account_id")?,
        realm: row.try_get("realm")?,
        access_token: row.try_get("access_token")?,
        access_token_expires_at: row.try_get("access_token_expires_at")?,
        snapshot_location: row.try_get("snapshot_location")?,
        last_updated: row.try_get("last_updated")?,
        last_scheduled: row.try_get("last_scheduled")?,
        active: row.try_get("active")?,
    })
}

/// A targeted update that matched no row means the account does not exist.
fn one_row(res: PgQueryResult, account_id: &str) -> Result<(), RegistryError> {
    if res.rows_affected() == 0 {
        return Err(RegistryError::NotFound {
            account_id: account_id.to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl AccountRegistry for PgRegistry {
    async fn get(&self, account_id: &str) -> Result<Account, RegistryError> {
        let sql = format!("select {ACCOUNT_COLUMNS} from accounts where account_id = $1");
        let row = sqlx::query(&sql)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        match row {
            Some(row) => account_from_row(&row).map_err(backend),
            None => Err(RegistryError::NotFound {
                account_id: account_id.to_string(),
            }),
        }
    }

    async fn create(&self, account: &Account) -> Result<(), RegistryError> {
        let res = sqlx::query(
            r#"
            insert into accounts (
              account_id, realm, access_token, access_token_expires_at,
              snapshot_location, last_updated, last_scheduled, active
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8
            )
            on conflict (account_id) do nothing
            "#,
        )
        .bind(&account.account_id)
        .bind(&account.realm)
        .bind(&account.access_token)
        .bind(account.access_token_expires_at)
        .bind(&account.snapshot_location)
        .bind(account.last_updated)
        .bind(account.last_scheduled)
        .bind(account.active)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if res.rows_affected() == 0 {
            return Err(RegistryError::AlreadyExists {
                account_id: account.account_id.clone(),
            });
        }
        Ok(())
    }

    async fn set_access_credential(
        &self,
        account_id: &str,
        access_token: &str,
        expires_at: i64,
    ) -> Result<(), RegistryError> {
        let res = sqlx::query(
            r#"
            update accounts
               set access_token = $2,
                   access_token_expires_at = $3
             where account_id = $1
            "#,
        )
        .bind(account_id)
        .bind(access_token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        one_row(res, account_id)
    }

    async fn set_active(&self, account_id: &str, active: bool) -> Result<(), RegistryError> {
        let res = sqlx::query("update accounts set active = $2 where account_id = $1")
            .bind(account_id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        one_row(res, account_id)
    }

    async fn set_last_updated(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let res = sqlx::query("update accounts set last_updated = $2 where account_id = $1")
            .bind(account_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        one_row(res, account_id)
    }

    async fn set_last_scheduled(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let res = sqlx::query("update accounts set last_scheduled = $2 where account_id = $1")
            .bind(account_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        one_row(res, account_id)
    }

    async fn find_unscheduled(
        &self,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<Vec<Account>, RegistryError> {
        let sql = format!(
            "select {ACCOUNT_COLUMNS} from accounts \
             where active and ($1::timestamptz is null or last_scheduled < $1) \
             order by account_id"
        );
        let rows = sqlx::query(&sql)
            .bind(watermark)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter()
            .map(|r| account_from_row(r).map_err(backend))
            .collect()
    }
}
