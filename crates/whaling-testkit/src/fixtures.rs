use chrono::{DateTime, TimeZone, Utc};
use whaling_policy::{ShipCatalogue, Warship};
use whaling_schemas::{Account, ShipStatistics};

/// Promotion start used across fixtures: 2021-12-08T00:00:00Z.
pub fn promotion_start() -> DateTime<Utc> {
    Utc.timestamp_opt(1_638_921_600, 0)
        .single()
        .unwrap_or_default()
}

/// Active account with a credential valid for a day after `last_scheduled`.
pub fn account(account_id: &str, realm: &str, last_scheduled: DateTime<Utc>) -> Account {
    Account {
        account_id: account_id.to_string(),
        realm: realm.to_string(),
        access_token: format!("token-{account_id}"),
        access_token_expires_at: last_scheduled.timestamp() + 86_400,
        snapshot_location: format!("data/{account_id}/snapshot.json"),
        last_updated: None,
        last_scheduled,
        active: true,
    }
}

/// Small catalogue covering every tier band the seasonal policies care about.
///
/// | id | name | tier |
/// |----|------|------|
/// | 10 | Cleveland | 6 |
/// | 20 | Amagi | 8 |
/// | 30 | Hermelin | 2 |
/// | 40 | Yamato | 10 |
/// | 50 | [Marceau] | 10 (test ship) |
pub fn catalogue() -> ShipCatalogue {
    ShipCatalogue::from_ships([
        Warship::new(10, "Cleveland", 6),
        Warship::new(20, "Amagi", 8),
        Warship::new(30, "Hermelin", 2),
        Warship::new(40, "Yamato", 10),
        Warship::new(50, "[Marceau]", 10),
    ])
}

/// Garage ship last played at `at` with the given PvP wins out of
/// `wins + 1` battles.
pub fn played_stats(ship_id: i64, at: DateTime<Utc>, pvp_wins: u32) -> ShipStatistics {
    let mut s = ShipStatistics::placeholder(ship_id);
    s.last_battle_time = at.timestamp();
    s.pvp.wins = pvp_wins;
    s.pvp.battles = pvp_wins + 1;
    s.battles = pvp_wins + 1;
    s
}
