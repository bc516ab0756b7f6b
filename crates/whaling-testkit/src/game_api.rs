use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use whaling_ports::{ApiError, Credential, GameApi};
use whaling_schemas::{Realm, ShipStatistics};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ShipStatistics { account_id: String, access_token: String },
    PortShips { account_id: String, access_token: String },
    RefreshCredential { account_id: String, access_token: String },
}

/// Scripted Game API keyed by account id.
///
/// Accounts without scripted data get empty statistics and an empty port.
#[derive(Default)]
pub struct FakeGameApi {
    statistics: RwLock<BTreeMap<String, BTreeMap<i64, ShipStatistics>>>,
    ports: RwLock<BTreeMap<String, Vec<i64>>>,
    statistics_errors: RwLock<BTreeMap<String, ApiError>>,
    port_errors: RwLock<BTreeMap<String, ApiError>>,
    renewals: RwLock<BTreeMap<String, Result<Credential, ApiError>>>,
    calls: RwLock<Vec<ApiCall>>,
}

impl FakeGameApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_statistics(&self, account_id: &str, stats: Vec<ShipStatistics>) {
        self.statistics.write().await.insert(
            account_id.to_string(),
            stats.into_iter().map(|s| (s.ship_id, s)).collect(),
        );
    }

    pub async fn set_port(&self, account_id: &str, ships: Vec<i64>) {
        self.ports.write().await.insert(account_id.to_string(), ships);
    }

    pub async fn fail_statistics(&self, account_id: &str, err: ApiError) {
        self.statistics_errors
            .write()
            .await
            .insert(account_id.to_string(), err);
    }

    pub async fn fail_port(&self, account_id: &str, err: ApiError) {
        self.port_errors
            .write()
            .await
            .insert(account_id.to_string(), err);
    }

    pub async fn set_renewal(&self, account_id: &str, result: Result<Credential, ApiError>) {
        self.renewals
            .write()
            .await
            .insert(account_id.to_string(), result);
    }

    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl GameApi for FakeGameApi {
    async fn ship_statistics(
        &self,
        _realm: Realm,
        access_token: &str,
        account_id: &str,
    ) -> Result<BTreeMap<i64, ShipStatistics>, ApiError> {
        self.calls.write().await.push(ApiCall::ShipStatistics {
            account_id: account_id.to_string(),
            access_token: access_token.to_string(),
        });
        if let Some(err) = self.statistics_errors.read().await.get(account_id) {
            return Err(err.clone());
        }
        Ok(self
            .statistics
            .read()
            .await
            .get(account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn port_ships(
        &self,
        _realm: Realm,
        access_token: &str,
        account_id: &str,
    ) -> Result<Vec<i64>, ApiError> {
        self.calls.write().await.push(ApiCall::PortShips {
            account_id: account_id.to_string(),
            access_token: access_token.to_string(),
        });
        if let Some(err) = self.port_errors.read().await.get(account_id) {
            return Err(err.clone());
        }
        Ok(self
            .ports
            .read()
            .await
            .get(account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn refresh_credential(
        &self,
        _realm: Realm,
        access_token: &str,
        account_id: &str,
    ) -> Result<Credential, ApiError> {
        self.calls.write().await.push(ApiCall::RefreshCredential {
            account_id: account_id.to_string(),
            access_token: access_token.to_string(),
        });
        self.renewals
            .read()
            .await
            .get(account_id)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::Transport("no renewal scripted".to_string())))
    }
}
