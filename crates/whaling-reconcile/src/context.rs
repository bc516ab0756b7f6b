use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use whaling_policy::{RewardPolicy, ShipCatalogue};
use whaling_schemas::Realm;

use crate::Reconciler;

/// Everything a promotion run fixes at startup: the active policy, the ship
/// catalogue and the start time per realm.
///
/// Built once from configuration and passed explicitly to the engine and the
/// worker. Cheap to clone.
#[derive(Clone)]
pub struct PromotionContext {
    policy: Arc<dyn RewardPolicy>,
    catalogue: Arc<ShipCatalogue>,
    starts: BTreeMap<Realm, DateTime<Utc>>,
}

impl PromotionContext {
    pub fn new(
        policy: Arc<dyn RewardPolicy>,
        catalogue: Arc<ShipCatalogue>,
        starts: BTreeMap<Realm, DateTime<Utc>>,
    ) -> Self {
        Self {
            policy,
            catalogue,
            starts,
        }
    }

    pub fn policy(&self) -> &dyn RewardPolicy {
        self.policy.as_ref()
    }

    pub fn catalogue(&self) -> &ShipCatalogue {
        &self.catalogue
    }

    pub fn promotion_start(&self, realm: Realm) -> Option<DateTime<Utc>> {
        self.starts.get(&realm).copied()
    }

    pub fn realms(&self) -> impl Iterator<Item = Realm> + '_ {
        self.starts.keys().copied()
    }

    /// Engine bound to one realm, or `None` when the realm has no configured
    /// promotion start.
    pub fn reconciler(&self, realm: Realm) -> Option<Reconciler<'_>> {
        let start = self.promotion_start(realm)?;
        Some(Reconciler::new(
            self.policy.as_ref(),
            self.catalogue.as_ref(),
            start,
        ))
    }
}

impl std::fmt::Debug for PromotionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromotionContext")
            .field("policy", &self.policy.name())
            .field("catalogue_len", &self.catalogue.len())
            .field("starts", &self.starts)
            .finish()
    }
}
