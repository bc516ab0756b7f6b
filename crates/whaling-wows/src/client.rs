use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use whaling_ports::{ApiError, Credential, GameApi};
use whaling_schemas::{Realm, ShipStatistics};

use crate::wire::{normalize_statistics, Envelope, PerAccount, RawCredential, RawPortData, RawShipStatistics};

const STATS_EXTRA: &str = "pve,oper_solo,oper_div,rank_solo";
const STATS_FIELDS: &str = "ship_id,last_battle_time,battles,\
pvp.battles,pvp.wins,pve.battles,pve.wins,\
oper_solo.battles,oper_solo.wins,oper_div.battles,oper_div.wins,\
rank_solo.battles,rank_solo.wins,private.in_garage";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Host {
    Warships,
    /// Authentication lives on the shared platform host.
    Tanks,
}

/// Game Statistics API client.
///
/// The application id is passed in by the caller and only ever travels in
/// query strings and form bodies; errors are stripped of their URL.
#[derive(Debug, Clone)]
pub struct WowsApiClient {
    http: reqwest::Client,
    application_id: String,
    base_override: Option<Url>,
}

impl WowsApiClient {
    pub fn new(application_id: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            application_id,
            base_override: None,
        })
    }

    /// Send every request to `base` instead of the realm hosts.
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base_override = Some(base);
        self
    }

    fn endpoint(&self, realm: Realm, host: Host, path: &str) -> Result<Url, ApiError> {
        let base = match &self.base_override {
            Some(base) => base.clone(),
            None => {
                let name = match host {
                    Host::Warships => "worldofwarships",
                    Host::Tanks => "worldoftanks",
                };
                Url::parse(&format!("https://api.{name}.{}/", realm.as_str()))
                    .map_err(|e| ApiError::Transport(e.to_string()))?
            }
        };
        base.join(path).map_err(|e| ApiError::Transport(e.to_string()))
    }

    fn stats_url(&self, realm: Realm, access_token: &str, account_id: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(realm, Host::Warships, "wows/ships/stats/")?;
        url.query_pairs_mut()
            .append_pair("application_id", &self.application_id)
            .append_pair("account_id", account_id)
            .append_pair("access_token", access_token)
            .append_pair("extra", STATS_EXTRA)
            .append_pair("fields", STATS_FIELDS);
        Ok(url)
    }

    fn port_url(&self, realm: Realm, access_token: &str, account_id: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(realm, Host::Warships, "wows/account/info/")?;
        url.query_pairs_mut()
            .append_pair("application_id", &self.application_id)
            .append_pair("account_id", account_id)
            .append_pair("access_token", access_token)
            .append_pair("extra", "private.port")
            .append_pair("fields", "private.port");
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Http(status.as_u16()));
        }
        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.without_url().to_string()))?;
        envelope.into_data()
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.without_url().to_string()))?;
        Self::decode(resp).await
    }
}

#[async_trait]
impl GameApi for WowsApiClient {
    async fn ship_statistics(
        &self,
        realm: Realm,
        access_token: &str,
        account_id: &str,
    ) -> Result<BTreeMap<i64, ShipStatistics>, ApiError> {
        debug!(account_id, %realm, "fetching ship statistics");
        let url = self.stats_url(realm, access_token, account_id)?;
        let mut data: PerAccount<Vec<RawShipStatistics>> = self.get(url).await?;
        let raw = data.remove(account_id).flatten().unwrap_or_default();
        Ok(normalize_statistics(&raw))
    }

    async fn port_ships(
        &self,
        realm: Realm,
        access_token: &str,
        account_id: &str,
    ) -> Result<Vec<i64>, ApiError> {
        debug!(account_id, %realm, "fetching port");
        let url = self.port_url(realm, access_token, account_id)?;
        let mut data: PerAccount<RawPortData> = self.get(url).await?;
        Ok(data
            .remove(account_id)
            .flatten()
            .and_then(|d| d.private)
            .map(|p| p.port)
            .unwrap_or_default())
    }

    async fn refresh_credential(
        &self,
        realm: Realm,
        access_token: &str,
        account_id: &str,
    ) -> Result<Credential, ApiError> {
        debug!(account_id, %realm, "prolonging access token");
        let url = self.endpoint(realm, Host::Tanks, "wot/auth/prolongate/")?;
        let resp = self
            .http
            .post(url)
            .form(&[
                ("application_id", self.application_id.as_str()),
                ("access_token", access_token),
            ])
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.without_url().to_string()))?;
        let raw: RawCredential = Self::decode(resp).await?;
        Ok(Credential {
            access_token: raw.access_token,
            expires_at: raw.expires_at,
        })
    }
}
