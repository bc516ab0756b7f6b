use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use whaling_policy::ResourceKind;

use crate::ShipStatistics;

/// Reward bookkeeping of one ship.
///
/// `awardable` is fixed when the entry is created. `earned` is either 0 or
/// equal to `awardable`; once equal it never changes again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub kind: ResourceKind,
    pub awardable: u32,
    pub earned: u32,
}

impl RewardRecord {
    pub fn pending(kind: ResourceKind, awardable: u32) -> Self {
        Self {
            kind,
            awardable,
            earned: 0,
        }
    }

    pub fn is_credited(&self) -> bool {
        self.earned == self.awardable
    }

    pub fn credit(&mut self) {
        self.earned = self.awardable;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipEntry {
    pub statistics: ShipStatistics,
    pub reward: RewardRecord,
}

/// Aggregate of one resource kind over every ship entry. Derived, never
/// trusted across writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTotal {
    pub kind: ResourceKind,
    pub awardable: u64,
    pub earned: u64,
}

/// Persisted per-account progress, rewritten wholesale on every refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub last_updated: DateTime<Utc>,
    pub resources: Vec<ResourceTotal>,
    pub ships: BTreeMap<i64, ShipEntry>,
}

impl AccountSnapshot {
    /// Empty snapshot with a zeroed total for every seeded kind.
    pub fn empty(account_id: impl Into<String>, kinds: &[ResourceKind], now: DateTime<Utc>) -> Self {
        let mut snap = Self {
            account_id: account_id.into(),
            last_updated: now,
            resources: Vec::new(),
            ships: BTreeMap::new(),
        };
        snap.recompute_totals(kinds);
        snap
    }

    /// Replace the resource totals with sums over the current ship entries.
    ///
    /// One total per seeded kind plus any kind still present on an entry,
    /// ordered by kind.
    pub fn recompute_totals(&mut self, seed: &[ResourceKind]) {
        let mut kinds: BTreeSet<ResourceKind> = seed.iter().copied().collect();
        kinds.extend(self.ships.values().map(|e| e.reward.kind));

        self.resources = kinds
            .into_iter()
            .map(|kind| {
                let (awardable, earned) = self
                    .ships
                    .values()
                    .filter(|e| e.reward.kind == kind)
                    .fold((0u64, 0u64), |(a, e), entry| {
                        (a + entry.reward.awardable as u64, e + entry.reward.earned as u64)
                    });
                ResourceTotal {
                    kind,
                    awardable,
                    earned,
                }
            })
            .collect();
    }

    pub fn total(&self, kind: ResourceKind) -> Option<&ResourceTotal> {
        self.resources.iter().find(|t| t.kind == kind)
    }

    /// `true` when every total equals the sum over the ship entries.
    pub fn totals_consistent(&self) -> bool {
        let mut check = self.clone();
        let seed: Vec<ResourceKind> = self.resources.iter().map(|t| t.kind).collect();
        check.recompute_totals(&seed);
        check.resources == self.resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(ship_id: i64, kind: ResourceKind, awardable: u32, credited: bool) -> ShipEntry {
        let mut reward = RewardRecord::pending(kind, awardable);
        if credited {
            reward.credit();
        }
        ShipEntry {
            statistics: ShipStatistics::placeholder(ship_id),
            reward,
        }
    }

    #[test]
    fn empty_snapshot_seeds_zero_totals() {
        let now = Utc.with_ymd_and_hms(2021, 12, 8, 0, 0, 0).unwrap();
        let snap = AccountSnapshot::empty("500", &[ResourceKind::Steel, ResourceKind::Coal], now);
        assert_eq!(snap.resources.len(), 2);
        assert_eq!(snap.resources[0].kind, ResourceKind::Coal);
        assert!(snap.resources.iter().all(|t| t.earned == 0 && t.awardable == 0));
    }

    #[test]
    fn recompute_sums_earned_and_awardable_per_kind() {
        let now = Utc.with_ymd_and_hms(2021, 12, 8, 0, 0, 0).unwrap();
        let mut snap = AccountSnapshot::empty("500", &[ResourceKind::Coal], now);
        snap.ships.insert(1, entry(1, ResourceKind::Coal, 750, true));
        snap.ships.insert(2, entry(2, ResourceKind::Coal, 750, false));
        snap.ships.insert(3, entry(3, ResourceKind::Steel, 75, true));
        snap.recompute_totals(&[ResourceKind::Coal]);

        let coal = snap.total(ResourceKind::Coal).unwrap();
        assert_eq!((coal.awardable, coal.earned), (1500, 750));
        let steel = snap.total(ResourceKind::Steel).unwrap();
        assert_eq!((steel.awardable, steel.earned), (75, 75));
        assert!(snap.totals_consistent());
    }

    #[test]
    fn stale_totals_are_detected() {
        let now = Utc.with_ymd_and_hms(2021, 12, 8, 0, 0, 0).unwrap();
        let mut snap = AccountSnapshot::empty("500", &[ResourceKind::Coal], now);
        snap.ships.insert(1, entry(1, ResourceKind::Coal, 750, true));
        assert!(!snap.totals_consistent());
    }

    #[test]
    fn ship_map_survives_json_with_integer_keys() {
        let now = Utc.with_ymd_and_hms(2021, 12, 8, 0, 0, 0).unwrap();
        let mut snap = AccountSnapshot::empty("500", &[ResourceKind::Coal], now);
        snap.ships
            .insert(4179571696, entry(4179571696, ResourceKind::Coal, 750, false));
        snap.recompute_totals(&[ResourceKind::Coal]);

        let raw = serde_json::to_string(&snap).unwrap();
        assert!(raw.contains("\"4179571696\""));
        let back: AccountSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, snap);
    }
}
