use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use whaling_ports::{AccountRegistry, RegistryError};
use whaling_schemas::Account;

/// One targeted field write, as the registry saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryWrite {
    Create { account_id: String },
    AccessCredential { account_id: String, access_token: String },
    Active { account_id: String, active: bool },
    LastUpdated { account_id: String },
    LastScheduled { account_id: String },
}

#[derive(Default)]
pub struct InMemoryRegistry {
    accounts: RwLock<BTreeMap<String, Account>>,
    writes: RwLock<Vec<RegistryWrite>>,
    fail_last_scheduled: RwLock<bool>,
    fail_last_updated: RwLock<bool>,
    fail_scan: RwLock<bool>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed accounts without recording writes.
    pub async fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let reg = Self::new();
        {
            let mut map = reg.accounts.write().await;
            for a in accounts {
                map.insert(a.account_id.clone(), a);
            }
        }
        reg
    }

    pub async fn snapshot(&self, account_id: &str) -> Option<Account> {
        self.accounts.read().await.get(account_id).cloned()
    }

    pub async fn writes(&self) -> Vec<RegistryWrite> {
        self.writes.read().await.clone()
    }

    pub async fn set_fail_last_scheduled(&self, fail: bool) {
        *self.fail_last_scheduled.write().await = fail;
    }

    pub async fn set_fail_last_updated(&self, fail: bool) {
        *self.fail_last_updated.write().await = fail;
    }

    pub async fn set_fail_scan(&self, fail: bool) {
        *self.fail_scan.write().await = fail;
    }

    async fn update<F>(&self, account_id: &str, write: RegistryWrite, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut Account),
    {
        let mut map = self.accounts.write().await;
        let account = map.get_mut(account_id).ok_or_else(|| RegistryError::NotFound {
            account_id: account_id.to_string(),
        })?;
        f(account);
        self.writes.write().await.push(write);
        Ok(())
    }
}

#[async_trait]
impl AccountRegistry for InMemoryRegistry {
    async fn get(&self, account_id: &str) -> Result<Account, RegistryError> {
        self.accounts
            .read()
            .await
            .get(account_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                account_id: account_id.to_string(),
            })
    }

    async fn create(&self, account: &Account) -> Result<(), RegistryError> {
        let mut map = self.accounts.write().await;
        if map.contains_key(&account.account_id) {
            return Err(RegistryError::AlreadyExists {
                account_id: account.account_id.clone(),
            });
        }
        map.insert(account.account_id.clone(), account.clone());
        self.writes.write().await.push(RegistryWrite::Create {
            account_id: account.account_id.clone(),
        });
        Ok(())
    }

    async fn set_access_credential(
        &self,
        account_id: &str,
        access_token: &str,
        expires_at: i64,
    ) -> Result<(), RegistryError> {
        let write = RegistryWrite::AccessCredential {
            account_id: account_id.to_string(),
            access_token: access_token.to_string(),
        };
        self.update(account_id, write, |a| {
            a.access_token = access_token.to_string();
            a.access_token_expires_at = expires_at;
        })
        .await
    }

    async fn set_active(&self, account_id: &str, active: bool) -> Result<(), RegistryError> {
        let write = RegistryWrite::Active {
            account_id: account_id.to_string(),
            active,
        };
        self.update(account_id, write, |a| a.active = active).await
    }

    async fn set_last_updated(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        if *self.fail_last_updated.read().await {
            return Err(RegistryError::Backend("injected last_updated failure".to_string()));
        }
        let write = RegistryWrite::LastUpdated {
            account_id: account_id.to_string(),
        };
        self.update(account_id, write, |a| a.last_updated = Some(at))
            .await
    }

    async fn set_last_scheduled(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        if *self.fail_last_scheduled.read().await {
            return Err(RegistryError::Backend("injected last_scheduled failure".to_string()));
        }
        let write = RegistryWrite::LastScheduled {
            account_id: account_id.to_string(),
        };
        self.update(account_id, write, |a| a.last_scheduled = at).await
    }

    async fn find_unscheduled(
        &self,
        watermark: Option<DateTime<Utc>>,
    ) -> Result<Vec<Account>, RegistryError> {
        if *self.fail_scan.read().await {
            return Err(RegistryError::Backend("injected scan failure".to_string()));
        }
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| a.active)
            .filter(|a| watermark.map_or(true, |w| a.last_scheduled < w))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{account, promotion_start};
    use chrono::Duration;

    #[tokio::test]
    async fn scan_respects_watermark_and_active_flag() {
        let t = promotion_start();
        let mut inactive = account("3", "eu", t - Duration::hours(5));
        inactive.active = false;
        let reg = InMemoryRegistry::with_accounts([
            account("1", "eu", t - Duration::hours(3)),
            account("2", "eu", t),
            inactive,
        ])
        .await;

        let due = reg.find_unscheduled(Some(t)).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].account_id, "1");

        let all = reg.find_unscheduled(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn setters_touch_one_field() {
        let t = promotion_start();
        let reg = InMemoryRegistry::with_accounts([account("1", "eu", t)]).await;
        reg.set_access_credential("1", "fresh", 99).await.unwrap();
        reg.set_last_scheduled("1", t + Duration::hours(1)).await.unwrap();

        let a = reg.snapshot("1").await.unwrap();
        assert_eq!(a.access_token, "fresh");
        assert_eq!(a.last_scheduled, t + Duration::hours(1));
        assert!(a.active);
        assert_eq!(reg.writes().await.len(), 2);
    }
}
