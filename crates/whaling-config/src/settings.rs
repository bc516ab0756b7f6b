use std::collections::BTreeMap;

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use whaling_policy::PolicyRegistry;
use whaling_schemas::Realm;

/// Typed configuration. Every section except `promotion` has defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhalingConfig {
    pub promotion: PromotionSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromotionSettings {
    /// Policy registry key.
    pub policy: String,
    /// Promotion start per realm. A realm missing here is skipped by the worker.
    pub realms: BTreeMap<Realm, DateTime<Utc>>,
    #[serde(default = "default_catalogue_path")]
    pub catalogue_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerSettings {
    pub interval_minutes: u32,
    pub batch_size: usize,
    pub stamp_concurrency: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_minutes: 120,
            batch_size: 100,
            stamp_concurrency: 16,
        }
    }
}

impl SchedulerSettings {
    pub fn interval(&self) -> Duration {
        Duration::minutes(self.interval_minutes as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerSettings {
    pub token_refresh_threshold_minutes: u32,
    pub manual_refresh_cooldown_minutes: u32,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            token_refresh_threshold_minutes: 180,
            manual_refresh_cooldown_minutes: 10,
        }
    }
}

impl WorkerSettings {
    pub fn token_refresh_threshold(&self) -> Duration {
        Duration::minutes(self.token_refresh_threshold_minutes as i64)
    }

    pub fn manual_refresh_cooldown(&self) -> Duration {
        Duration::minutes(self.manual_refresh_cooldown_minutes as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSettings {
    /// Name of the env var holding the application id. Never the id itself.
    pub application_id_env: String,
    pub timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            application_id_env: "WOWS_APPLICATION_ID".to_string(),
            timeout_seconds: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSettings {
    pub snapshot_root: String,
    pub outbox_dir: String,
    pub events_jsonl: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            snapshot_root: "./data".to_string(),
            outbox_dir: "./outbox".to_string(),
            events_jsonl: "./data/events.jsonl".to_string(),
        }
    }
}

fn default_catalogue_path() -> String {
    "./data/ships.json".to_string()
}

impl WhalingConfig {
    /// Reject configurations the runtime cannot operate with.
    pub fn validate(&self, registry: &PolicyRegistry) -> Result<()> {
        if !registry.contains(&self.promotion.policy) {
            let known: Vec<&str> = registry.list().iter().map(|m| m.name.as_str()).collect();
            bail!(
                "CONFIG_INVALID promotion.policy='{}' is not a registered policy (known: {:?})",
                self.promotion.policy,
                known
            );
        }
        if self.promotion.realms.is_empty() {
            bail!("CONFIG_INVALID promotion.realms must name at least one realm");
        }
        if self.scheduler.batch_size == 0 {
            bail!("CONFIG_INVALID scheduler.batch_size must be > 0");
        }
        if self.scheduler.stamp_concurrency == 0 {
            bail!("CONFIG_INVALID scheduler.stamp_concurrency must be > 0");
        }
        if self.scheduler.interval_minutes == 0 {
            bail!("CONFIG_INVALID scheduler.interval_minutes must be > 0");
        }
        Ok(())
    }
}
