//! # Invariant under test
//!
//! Ship entries exist only for eligible, observed ships:
//! - a first run creates entries silently (no Ship Addition for new accounts)
//! - later runs announce new eligible ships with Ship Addition; one already
//!   won after the start is announced first, then credited as a late join
//! - a ship that became ineligible is removed with Ship Removal("ineligible"),
//!   credited or not
//! - a garage ship that left port loses its garage flag, is announced with
//!   Ship Removal("left_garage") and keeps its entry
//! - ships unknown to the catalogue are skipped, never fatal

use chrono::{DateTime, Duration, TimeZone, Utc};
use whaling_policy::{
    ResourceKind, Reward, RewardPolicy, ShipCatalogue, Snowflake2021, Warship,
};
use whaling_reconcile::{LiveFetch, Reconciler};
use whaling_schemas::{CreditReason, DomainEvent, GameMode, RemovalReason, ShipStatistics};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 12, 8, 0, 0, 0).unwrap()
}

fn catalogue() -> ShipCatalogue {
    ShipCatalogue::from_ships([
        Warship::new(10, "Cleveland", 6),
        Warship::new(20, "Amagi", 8),
        Warship::new(40, "Yamato", 10),
    ])
}

/// Later promotion run that only rewards T8 and above.
struct HighTierOnly;

impl RewardPolicy for HighTierOnly {
    fn name(&self) -> &'static str {
        "high_tier_only"
    }

    fn is_eligible(&self, ship: &Warship) -> bool {
        ship.tier >= 8
    }

    fn reward(&self, _ship: &Warship) -> Reward {
        Reward::new(ResourceKind::Steel, 75)
    }

    fn resource_kinds(&self) -> &'static [ResourceKind] {
        &[ResourceKind::Steel]
    }
}

fn played(ship_id: i64, at: i64, wins: u32) -> ShipStatistics {
    let mut s = ShipStatistics::placeholder(ship_id);
    s.in_garage = true;
    s.last_battle_time = at;
    s.battles = wins + 1;
    s.pvp.wins = wins;
    s.pvp.battles = wins + 1;
    s
}

#[test]
fn scenario_new_account_with_pre_start_battle_gets_uncredited_entry() {
    let cat = catalogue();
    let engine = Reconciler::new(&Snowflake2021, &cat, start());
    let live = LiveFetch {
        statistics: [(20, played(20, start().timestamp() - 3600, 5))]
            .into_iter()
            .collect(),
        port: vec![20],
    };

    let out = engine.reconcile("500", None, live, start());

    assert!(out.is_new);
    assert!(out.events.is_empty());
    assert_eq!(out.snapshot.ships.len(), 1);
    assert_eq!(out.snapshot.ships[&20].reward.earned, 0);
    assert_eq!(out.snapshot.ships[&20].reward.awardable, 75);
}

#[test]
fn scenario_new_ship_on_existing_account_is_announced() {
    let cat = catalogue();
    let engine = Reconciler::new(&Snowflake2021, &cat, start());
    let first = engine.reconcile(
        "500",
        None,
        LiveFetch {
            statistics: Default::default(),
            port: vec![10],
        },
        start(),
    );

    let second = engine.reconcile(
        "500",
        Some(first.snapshot),
        LiveFetch {
            statistics: Default::default(),
            port: vec![10, 40],
        },
        start() + Duration::hours(2),
    );

    assert_eq!(
        second.events,
        vec![DomainEvent::ShipAddition {
            account_id: "500".to_string(),
            ship_id: 40,
        }]
    );
    assert!(second.snapshot.ships[&40].statistics.in_garage);
    assert!(second.snapshot.ships[&40].statistics.never_played());
}

#[test]
fn scenario_late_join_on_existing_account_announces_then_credits_once() {
    let cat = catalogue();
    let engine = Reconciler::new(&Snowflake2021, &cat, start());
    let first = engine.reconcile(
        "500",
        None,
        LiveFetch {
            statistics: Default::default(),
            port: vec![10],
        },
        start(),
    );
    assert!(first.events.is_empty());

    let live = || LiveFetch {
        statistics: [(20, played(20, start().timestamp() + 600, 3))]
            .into_iter()
            .collect(),
        port: vec![10, 20],
    };
    let second = engine.reconcile(
        "500",
        Some(first.snapshot),
        live(),
        start() + Duration::hours(2),
    );

    assert_eq!(
        second.events,
        vec![
            DomainEvent::ShipAddition {
                account_id: "500".to_string(),
                ship_id: 20,
            },
            DomainEvent::ResourceEarned {
                account_id: "500".to_string(),
                ship_id: 20,
                kind: ResourceKind::Steel,
                quantity: 75,
                credit: CreditReason::LateJoin(GameMode::Pvp),
            },
        ]
    );
    assert!(second.snapshot.ships[&20].reward.is_credited());

    // Redelivery of the same live data credits nothing new.
    let third = engine.reconcile(
        "500",
        Some(second.snapshot.clone()),
        live(),
        start() + Duration::hours(4),
    );
    assert!(third.events.is_empty());
    assert_eq!(third.snapshot.ships[&20].reward.earned, 75);
    assert_eq!(
        third.snapshot.total(ResourceKind::Steel).map(|t| t.earned),
        Some(75)
    );
}

#[test]
fn scenario_policy_change_removes_ineligible_entries_even_when_credited() {
    let cat = catalogue();
    let old = Reconciler::new(&Snowflake2021, &cat, start());
    let after = start().timestamp() + 600;

    let first = old.reconcile(
        "500",
        None,
        LiveFetch {
            statistics: [(10, played(10, after, 1)), (20, played(20, after, 0))]
                .into_iter()
                .collect(),
            port: vec![10, 20],
        },
        start() + Duration::hours(1),
    );
    // Late join credited the Cleveland, the Amagi only lost.
    assert!(first.snapshot.ships[&10].reward.is_credited());
    assert!(!first.snapshot.ships[&20].reward.is_credited());

    let new = Reconciler::new(&HighTierOnly, &cat, start());
    let out = new.reconcile(
        "500",
        Some(first.snapshot),
        LiveFetch {
            statistics: [(10, played(10, after, 1)), (20, played(20, after, 0))]
                .into_iter()
                .collect(),
            port: vec![10, 20],
        },
        start() + Duration::hours(3),
    );

    assert_eq!(
        out.events,
        vec![DomainEvent::ShipRemoval {
            account_id: "500".to_string(),
            ship_id: 10,
            reason: RemovalReason::Ineligible,
        }]
    );
    assert!(!out.snapshot.ships.contains_key(&10));
    assert!(out.snapshot.ships.contains_key(&20));
    assert_eq!(out.snapshot.total(ResourceKind::Coal).map(|t| t.earned), None);
    assert!(out.snapshot.totals_consistent());
}

#[test]
fn scenario_ship_leaving_port_clears_garage_flag_and_keeps_entry() {
    let cat = catalogue();
    let engine = Reconciler::new(&Snowflake2021, &cat, start());
    let first = engine.reconcile(
        "500",
        None,
        LiveFetch {
            statistics: Default::default(),
            port: vec![10, 20],
        },
        start(),
    );
    assert!(first.snapshot.ships[&20].statistics.in_garage);

    let out = engine.reconcile(
        "500",
        Some(first.snapshot),
        LiveFetch {
            statistics: Default::default(),
            port: vec![10],
        },
        start() + Duration::hours(2),
    );

    assert_eq!(
        out.events,
        vec![DomainEvent::ShipRemoval {
            account_id: "500".to_string(),
            ship_id: 20,
            reason: RemovalReason::LeftGarage,
        }]
    );
    assert!(!out.snapshot.ships[&20].statistics.in_garage);
    assert!(out.snapshot.ships[&10].statistics.in_garage);
}

#[test]
fn scenario_sold_ship_with_statistics_keeps_flag_cleared() {
    let cat = catalogue();
    let engine = Reconciler::new(&Snowflake2021, &cat, start());
    let before = start().timestamp() - 600;
    let first = engine.reconcile(
        "500",
        None,
        LiveFetch {
            statistics: [(20, played(20, before, 2))].into_iter().collect(),
            port: vec![20],
        },
        start(),
    );

    // The API still reports the ship in garage, but it is gone from port.
    let out = engine.reconcile(
        "500",
        Some(first.snapshot),
        LiveFetch {
            statistics: [(20, played(20, before, 2))].into_iter().collect(),
            port: vec![],
        },
        start() + Duration::hours(2),
    );

    assert_eq!(out.events.len(), 1);
    assert!(!out.snapshot.ships[&20].statistics.in_garage);
}

#[test]
fn scenario_catalogue_drift_is_skipped() {
    let cat = catalogue();
    let engine = Reconciler::new(&Snowflake2021, &cat, start());
    let first = engine.reconcile(
        "500",
        None,
        LiveFetch {
            statistics: Default::default(),
            port: vec![10, 20],
        },
        start(),
    );

    // The Amagi was retired from the encyclopedia since the last run.
    let shrunk = ShipCatalogue::from_ships([Warship::new(10, "Cleveland", 6)]);
    let engine = Reconciler::new(&Snowflake2021, &shrunk, start());
    let out = engine.reconcile(
        "500",
        Some(first.snapshot),
        LiveFetch {
            statistics: [(20, played(20, start().timestamp() + 60, 9))]
                .into_iter()
                .collect(),
            port: vec![10, 777],
        },
        start() + Duration::hours(2),
    );

    assert!(out.events.is_empty());
    assert!(out.snapshot.ships.contains_key(&20));
    assert!(!out.snapshot.ships.contains_key(&777));
    assert!(!out.snapshot.ships[&20].reward.is_credited());
}
