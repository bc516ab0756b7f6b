use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use whaling_policy::{RewardPolicy, ShipCatalogue};
use whaling_schemas::{
    AccountSnapshot, CreditReason, DomainEvent, RemovalReason, RewardRecord, ShipEntry,
    ShipStatistics,
};

use crate::{detect_win, detect_win_from_zero};

/// What the Game API returned for one account in this cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveFetch {
    /// Every ship the account has ever touched, keyed by ship id.
    pub statistics: BTreeMap<i64, ShipStatistics>,
    /// Ships currently sitting in the account's port.
    pub port: Vec<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub snapshot: AccountSnapshot,
    /// In emission order.
    pub events: Vec<DomainEvent>,
    /// No previous snapshot existed; the store keeps a baseline copy.
    pub is_new: bool,
}

impl ReconcileOutcome {
    pub fn credited(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DomainEvent::ResourceEarned { .. }))
            .count()
    }
}

/// Ships in port that neither the snapshot nor the statistics know about get
/// a zeroed placeholder record ("bought, not yet played").
///
/// Returns one unified map; the inputs are left untouched.
pub fn merge_port_placeholders(
    known: &BTreeMap<i64, ShipEntry>,
    statistics: &BTreeMap<i64, ShipStatistics>,
    port: &BTreeSet<i64>,
) -> BTreeMap<i64, ShipStatistics> {
    let mut merged = statistics.clone();
    for ship_id in port {
        if known.contains_key(ship_id) || statistics.contains_key(ship_id) {
            continue;
        }
        merged.insert(*ship_id, ShipStatistics::placeholder(*ship_id));
    }
    merged
}

/// Reconciliation engine bound to one promotion and realm.
#[derive(Clone, Copy)]
pub struct Reconciler<'a> {
    policy: &'a dyn RewardPolicy,
    catalogue: &'a ShipCatalogue,
    promotion_start: DateTime<Utc>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        policy: &'a dyn RewardPolicy,
        catalogue: &'a ShipCatalogue,
        promotion_start: DateTime<Utc>,
    ) -> Self {
        Self {
            policy,
            catalogue,
            promotion_start,
        }
    }

    /// Diff `previous` against `live` and produce the next snapshot.
    ///
    /// Running twice on the same inputs yields the same outcome; running again
    /// on its own output with the same live fetch credits nothing new.
    pub fn reconcile(
        &self,
        account_id: &str,
        previous: Option<AccountSnapshot>,
        live: LiveFetch,
        now: DateTime<Utc>,
    ) -> ReconcileOutcome {
        let is_new = previous.is_none();
        let mut snap = previous.unwrap_or_else(|| {
            AccountSnapshot::empty(account_id, self.policy.resource_kinds(), now)
        });
        let mut events = Vec::new();

        let port: BTreeSet<i64> = live.port.iter().copied().collect();
        let mut merged = merge_port_placeholders(&snap.ships, &live.statistics, &port);

        if !is_new {
            self.sweep_stored(&mut snap, &port, &mut merged, &mut events);
        }

        for (ship_id, stats) in merged {
            self.apply_live(&mut snap, ship_id, stats, is_new, &mut events);
        }

        snap.recompute_totals(self.policy.resource_kinds());
        if now > snap.last_updated {
            snap.last_updated = now;
        }

        ReconcileOutcome {
            snapshot: snap,
            events,
            is_new,
        }
    }

    /// Drop entries that became ineligible and clear the garage flag of ships
    /// that left port.
    fn sweep_stored(
        &self,
        snap: &mut AccountSnapshot,
        port: &BTreeSet<i64>,
        merged: &mut BTreeMap<i64, ShipStatistics>,
        events: &mut Vec<DomainEvent>,
    ) {
        let stored: Vec<i64> = snap.ships.keys().copied().collect();
        for ship_id in stored {
            let Some(ship) = self.catalogue.lookup(ship_id) else {
                continue;
            };

            if !self.policy.is_eligible(ship) {
                snap.ships.remove(&ship_id);
                events.push(DomainEvent::ShipRemoval {
                    account_id: snap.account_id.clone(),
                    ship_id,
                    reason: RemovalReason::Ineligible,
                });
                continue;
            }

            let Some(entry) = snap.ships.get_mut(&ship_id) else {
                continue;
            };
            if entry.statistics.in_garage && !port.contains(&ship_id) {
                // The entry stays: it may still be credited from statistics.
                entry.statistics.in_garage = false;
                if let Some(live) = merged.get_mut(&ship_id) {
                    live.in_garage = false;
                }
                events.push(DomainEvent::ShipRemoval {
                    account_id: snap.account_id.clone(),
                    ship_id,
                    reason: RemovalReason::LeftGarage,
                });
            }
        }
    }

    fn apply_live(
        &self,
        snap: &mut AccountSnapshot,
        ship_id: i64,
        live: ShipStatistics,
        is_new: bool,
        events: &mut Vec<DomainEvent>,
    ) {
        let Some(ship) = self.catalogue.lookup(ship_id) else {
            return;
        };
        let eligible = self.policy.is_eligible(ship);
        let start = self.promotion_start.timestamp();

        let Some(entry) = snap.ships.get_mut(&ship_id) else {
            if !eligible {
                return;
            }
            let reward = self.policy.reward(ship);
            let mut entry = ShipEntry {
                statistics: live,
                reward: RewardRecord::pending(reward.kind, reward.quantity),
            };
            if !is_new {
                events.push(DomainEvent::ShipAddition {
                    account_id: snap.account_id.clone(),
                    ship_id,
                });
            }
            if entry.statistics.last_battle_time > start {
                if let Some(mode) = detect_win_from_zero(&entry.statistics) {
                    entry.reward.credit();
                    events.push(earned(&snap.account_id, ship_id, &entry, CreditReason::LateJoin(mode)));
                }
            }
            snap.ships.insert(ship_id, entry);
            return;
        };

        if !eligible {
            snap.ships.remove(&ship_id);
            events.push(DomainEvent::ShipRemoval {
                account_id: snap.account_id.clone(),
                ship_id,
                reason: RemovalReason::Ineligible,
            });
            return;
        }

        if !entry.reward.is_credited()
            && !live.never_played()
            && live.last_battle_time != entry.statistics.last_battle_time
            && live.last_battle_time > start
        {
            if let Some(mode) = detect_win(&entry.statistics, &live) {
                entry.reward.credit();
                events.push(earned(&snap.account_id, ship_id, entry, CreditReason::BattleWin(mode)));
            }
        }

        entry.statistics = live;
    }
}

fn earned(account_id: &str, ship_id: i64, entry: &ShipEntry, credit: CreditReason) -> DomainEvent {
    DomainEvent::ResourceEarned {
        account_id: account_id.to_string(),
        ship_id,
        kind: entry.reward.kind,
        quantity: entry.reward.awardable,
        credit,
    }
}
