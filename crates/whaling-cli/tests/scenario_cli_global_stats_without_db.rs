//! # Invariant under test
//!
//! `whaling global-stats` needs only the snapshot tree: it sums every live
//! snapshot, prints the totals and writes `statistics.json` next to the tree,
//! with no database configured.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use whaling_policy::ResourceKind;
use whaling_ports::SnapshotStore;
use whaling_schemas::{AccountSnapshot, RewardRecord, ShipEntry};
use whaling_store::FsSnapshotStore;
use whaling_testkit::{played_stats, promotion_start};

fn snapshot(account_id: &str, ships: &[(i64, ResourceKind, u32, bool)]) -> AccountSnapshot {
    let mut snap = AccountSnapshot::empty(account_id, &[], promotion_start());
    for &(ship_id, kind, awardable, credited) in ships {
        let mut reward = RewardRecord::pending(kind, awardable);
        if credited {
            reward.credit();
        }
        snap.ships.insert(
            ship_id,
            ShipEntry {
                statistics: played_stats(ship_id, promotion_start(), 1),
                reward,
            },
        );
    }
    snap.recompute_totals(&[]);
    snap
}

#[tokio::test]
async fn global_stats_sums_snapshot_tree_and_writes_report() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let data = dir.path().join("data");
    let store = FsSnapshotStore::new(&data);

    store
        .save(
            "data/1/a.json",
            &snapshot(
                "1",
                &[
                    (10, ResourceKind::Coal, 750, true),
                    (20, ResourceKind::Coal, 750, false),
                ],
            ),
            false,
        )
        .await?;
    store
        .save(
            "data/2/b.json",
            &snapshot("2", &[(40, ResourceKind::Steel, 75, true)]),
            false,
        )
        .await?;

    let cfg_path = dir.path().join("whaling.yaml");
    std::fs::write(
        &cfg_path,
        format!(
            "promotion:\n  policy: snowflake_2021\n  realms:\n    eu: 2021-12-08T00:00:00Z\nstorage:\n  snapshot_root: {}\n",
            data.display()
        ),
    )?;

    let mut cmd = Command::cargo_bin("whaling")?;
    cmd.current_dir(dir.path())
        .arg("--config")
        .arg(&cfg_path)
        .arg("global-stats");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("accounts=2"))
        .stdout(predicate::str::contains("ships=3"))
        .stdout(predicate::str::contains("resource=coal awardable=1500 earned=750"))
        .stdout(predicate::str::contains("resource=steel awardable=75 earned=75"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(data.join("statistics.json"))?)?;
    assert_eq!(report["accounts"], 2);
    assert_eq!(report["ships"], 3);
    Ok(())
}
