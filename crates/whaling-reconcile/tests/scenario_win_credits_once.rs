//! # Invariant under test
//!
//! A stored, uncredited ship whose live win counter grew in one mode, with a
//! last battle after the promotion start, is credited exactly once with that
//! mode as the reason. Afterwards `earned == awardable` and further battles
//! never credit again.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use whaling_policy::{ResourceKind, ShipCatalogue, Snowflake2021, Warship};
use whaling_reconcile::{LiveFetch, Reconciler};
use whaling_schemas::{
    AccountSnapshot, CreditReason, DomainEvent, GameMode, RewardRecord, ShipEntry, ShipStatistics,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 12, 8, 0, 0, 0).unwrap()
}

fn catalogue() -> ShipCatalogue {
    ShipCatalogue::from_ships([Warship::new(20, "Amagi", 8), Warship::new(40, "Yamato", 10)])
}

fn stored_snapshot(ship_id: i64, stats: ShipStatistics, reward: RewardRecord) -> AccountSnapshot {
    let mut snap = AccountSnapshot::empty("500", SNOWFLAKE_2021_KINDS, start());
    snap.ships.insert(
        ship_id,
        ShipEntry {
            statistics: stats,
            reward,
        },
    );
    snap.recompute_totals(SNOWFLAKE_2021_KINDS);
    snap
}

const SNOWFLAKE_2021_KINDS: &[ResourceKind] = &[
    ResourceKind::Coal,
    ResourceKind::Steel,
    ResourceKind::NewYearCertificate,
];

fn played(ship_id: i64, at: i64, pvp_wins: u32, pvp_battles: u32) -> ShipStatistics {
    let mut s = ShipStatistics::placeholder(ship_id);
    s.in_garage = true;
    s.last_battle_time = at;
    s.battles = pvp_battles;
    s.pvp.wins = pvp_wins;
    s.pvp.battles = pvp_battles;
    s
}

#[test]
fn scenario_pvp_win_after_start_credits_with_pvp_reason() {
    let cat = catalogue();
    let engine = Reconciler::new(&Snowflake2021, &cat, start());
    let before = start().timestamp() - 600;
    let after = start().timestamp() + 600;

    let prev = stored_snapshot(
        20,
        played(20, before, 3, 7),
        RewardRecord::pending(ResourceKind::Steel, 75),
    );
    let live = LiveFetch {
        statistics: [(20, played(20, after, 4, 8))].into_iter().collect(),
        port: vec![20],
    };

    let out = engine.reconcile("500", Some(prev), live, start() + Duration::hours(1));

    assert!(!out.is_new);
    assert_eq!(
        out.events,
        vec![DomainEvent::ResourceEarned {
            account_id: "500".to_string(),
            ship_id: 20,
            kind: ResourceKind::Steel,
            quantity: 75,
            credit: CreditReason::BattleWin(GameMode::Pvp),
        }]
    );
    let entry = &out.snapshot.ships[&20];
    assert_eq!(entry.reward.earned, entry.reward.awardable);
    assert_eq!(entry.statistics.pvp.wins, 4);
    assert_eq!(out.snapshot.total(ResourceKind::Steel).map(|t| t.earned), Some(75));
}

#[test]
fn scenario_loss_after_start_credits_nothing_but_refreshes_stats() {
    let cat = catalogue();
    let engine = Reconciler::new(&Snowflake2021, &cat, start());
    let before = start().timestamp() - 600;
    let after = start().timestamp() + 600;

    let prev = stored_snapshot(
        20,
        played(20, before, 3, 7),
        RewardRecord::pending(ResourceKind::Steel, 75),
    );
    let live = LiveFetch {
        statistics: [(20, played(20, after, 3, 8))].into_iter().collect(),
        port: vec![20],
    };

    let out = engine.reconcile("500", Some(prev), live, start() + Duration::hours(1));

    assert!(out.events.is_empty());
    assert_eq!(out.snapshot.ships[&20].reward.earned, 0);
    assert_eq!(out.snapshot.ships[&20].statistics.battles, 8);
}

#[test]
fn scenario_win_before_start_is_not_credited() {
    let cat = catalogue();
    let engine = Reconciler::new(&Snowflake2021, &cat, start());
    let early = start().timestamp() - 7200;
    let less_early = start().timestamp() - 60;

    let prev = stored_snapshot(
        20,
        played(20, early, 3, 7),
        RewardRecord::pending(ResourceKind::Steel, 75),
    );
    let live = LiveFetch {
        statistics: [(20, played(20, less_early, 4, 8))].into_iter().collect(),
        port: vec![20],
    };

    let out = engine.reconcile("500", Some(prev), live, start());
    assert!(out.events.is_empty());
    assert_eq!(out.snapshot.ships[&20].reward.earned, 0);
}

#[test]
fn scenario_credited_ship_is_never_recredited() {
    let cat = catalogue();
    let engine = Reconciler::new(&Snowflake2021, &cat, start());
    let after = start().timestamp() + 600;

    let mut reward = RewardRecord::pending(ResourceKind::NewYearCertificate, 20);
    reward.credit();
    let prev = stored_snapshot(40, played(40, after, 10, 20), reward);

    let live = LiveFetch {
        statistics: [(40, played(40, after + 3600, 12, 23))]
            .into_iter()
            .collect(),
        port: vec![40],
    };

    let out = engine.reconcile("500", Some(prev), live, start() + Duration::hours(3));

    assert!(out.events.is_empty());
    let entry = &out.snapshot.ships[&40];
    assert_eq!(entry.reward.earned, 20);
    assert_eq!(entry.statistics.battles, 23);
    assert_eq!(entry.statistics.pvp.wins, 12);
}

#[test]
fn scenario_non_pvp_win_uses_priority_order() {
    let cat = catalogue();
    let engine = Reconciler::new(&Snowflake2021, &cat, start());
    let before = start().timestamp() - 600;
    let after = start().timestamp() + 600;

    let prev = stored_snapshot(
        20,
        played(20, before, 3, 7),
        RewardRecord::pending(ResourceKind::Steel, 75),
    );
    let mut live_stats = played(20, after, 3, 7);
    live_stats.rank_solo.wins = 1;
    live_stats.oper_solo.wins = 1;

    let live = LiveFetch {
        statistics: BTreeMap::from([(20, live_stats)]),
        port: vec![20],
    };
    let out = engine.reconcile("500", Some(prev), live, start() + Duration::hours(1));

    assert!(matches!(
        out.events.as_slice(),
        [DomainEvent::ResourceEarned {
            credit: CreditReason::BattleWin(GameMode::OperSolo),
            ..
        }]
    ));
}
