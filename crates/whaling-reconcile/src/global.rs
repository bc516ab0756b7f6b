use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use whaling_policy::ResourceKind;
use whaling_schemas::{AccountSnapshot, ResourceTotal};

/// Promotion-wide totals over every account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStatistics {
    pub accounts: usize,
    pub ships: usize,
    pub resources: Vec<ResourceTotal>,
}

/// Sum awardable and earned per resource kind across all snapshots, ordered
/// by kind. Reads the ship entries, not the cached per-account totals.
pub fn global_statistics<'a>(
    snapshots: impl IntoIterator<Item = &'a AccountSnapshot>,
) -> GlobalStatistics {
    let mut accounts = 0;
    let mut ships = 0;
    let mut sums: BTreeMap<ResourceKind, (u64, u64)> = BTreeMap::new();

    for snap in snapshots {
        accounts += 1;
        for entry in snap.ships.values() {
            ships += 1;
            let slot = sums.entry(entry.reward.kind).or_default();
            slot.0 += entry.reward.awardable as u64;
            slot.1 += entry.reward.earned as u64;
        }
    }

    GlobalStatistics {
        accounts,
        ships,
        resources: sums
            .into_iter()
            .map(|(kind, (awardable, earned))| ResourceTotal {
                kind,
                awardable,
                earned,
            })
            .collect(),
    }
}
