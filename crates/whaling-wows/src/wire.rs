//! Wire format of the Game Statistics API and its normalisation.
//!
//! Every response is wrapped in an envelope carrying `status` and either
//! `data` or `error`. Ship statistics arrive with signed counters; entries
//! that cannot be trusted are dropped one by one, never failing the fetch.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::warn;
use whaling_ports::ApiError;
use whaling_schemas::{ModeCounters, ShipStatistics};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    NegativeCounter {
        ship_id: i64,
        field: &'static str,
        value: i64,
    },
    CounterOutOfRange {
        ship_id: i64,
        field: &'static str,
        value: i64,
    },
    WinsExceedBattles {
        ship_id: i64,
        mode: &'static str,
        wins: i64,
        battles: i64,
    },
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeCounter {
                ship_id,
                field,
                value,
            } => write!(f, "ship {ship_id} has negative {field} {value}"),
            Self::CounterOutOfRange {
                ship_id,
                field,
                value,
            } => write!(f, "ship {ship_id} has out-of-range {field} {value}"),
            Self::WinsExceedBattles {
                ship_id,
                mode,
                wins,
                battles,
            } => write!(
                f,
                "ship {ship_id} reports {wins} {mode} wins out of {battles} battles"
            ),
        }
    }
}

impl std::error::Error for WireError {}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RawApiError {
    /// Numeric on most endpoints, occasionally a string.
    #[serde(default)]
    pub code: serde_json::Value,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub error: Option<RawApiError>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap `data` of an `ok` response; map everything else to `ApiError`.
    pub fn into_data(self) -> Result<T, ApiError> {
        if self.status != "ok" {
            let err = self.error.unwrap_or(RawApiError {
                code: serde_json::Value::Null,
                message: format!("status {}", self.status),
            });
            if err.message == "INVALID_ACCESS_TOKEN" {
                return Err(ApiError::InvalidAccessToken);
            }
            return Err(ApiError::Api {
                code: err.code.as_i64().unwrap_or(0),
                message: err.message,
            });
        }
        self.data
            .ok_or_else(|| ApiError::Decode("ok response without data".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Ship statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawCounters {
    #[serde(default)]
    pub wins: i64,
    #[serde(default)]
    pub battles: i64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawShipPrivate {
    #[serde(default)]
    pub in_garage: bool,
}

/// One entry of `ships/stats`. Mode blocks are absent when the mode was not
/// requested through `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawShipStatistics {
    pub ship_id: i64,
    #[serde(default)]
    pub last_battle_time: i64,
    #[serde(default)]
    pub battles: i64,
    pub private: Option<RawShipPrivate>,
    pub pvp: Option<RawCounters>,
    pub pve: Option<RawCounters>,
    pub rank_solo: Option<RawCounters>,
    pub oper_div: Option<RawCounters>,
    pub oper_solo: Option<RawCounters>,
}

fn non_negative(ship_id: i64, field: &'static str, value: i64) -> Result<u32, WireError> {
    if value < 0 {
        return Err(WireError::NegativeCounter {
            ship_id,
            field,
            value,
        });
    }
    u32::try_from(value).map_err(|_| WireError::CounterOutOfRange {
        ship_id,
        field,
        value,
    })
}

fn counters(
    ship_id: i64,
    mode: &'static str,
    raw: Option<RawCounters>,
) -> Result<ModeCounters, WireError> {
    let raw = raw.unwrap_or_default();
    let wins = non_negative(ship_id, "wins", raw.wins)?;
    let battles = non_negative(ship_id, "battles", raw.battles)?;
    if wins > battles {
        return Err(WireError::WinsExceedBattles {
            ship_id,
            mode,
            wins: raw.wins,
            battles: raw.battles,
        });
    }
    Ok(ModeCounters { wins, battles })
}

/// Convert one wire entry into internal statistics.
pub fn normalize_ship(raw: &RawShipStatistics) -> Result<ShipStatistics, WireError> {
    let id = raw.ship_id;
    Ok(ShipStatistics {
        ship_id: id,
        last_battle_time: raw.last_battle_time,
        battles: non_negative(id, "battles", raw.battles)?,
        in_garage: raw.private.map(|p| p.in_garage).unwrap_or(false),
        pvp: counters(id, "pvp", raw.pvp)?,
        pve: counters(id, "pve", raw.pve)?,
        rank_solo: counters(id, "rank_solo", raw.rank_solo)?,
        oper_div: counters(id, "oper_div", raw.oper_div)?,
        oper_solo: counters(id, "oper_solo", raw.oper_solo)?,
    })
}

/// Normalise a whole fetch, keyed by ship id. Malformed entries are logged
/// and skipped.
pub fn normalize_statistics(raw: &[RawShipStatistics]) -> BTreeMap<i64, ShipStatistics> {
    let mut out = BTreeMap::new();
    for entry in raw {
        match normalize_ship(entry) {
            Ok(stats) => {
                out.insert(stats.ship_id, stats);
            }
            Err(e) => warn!(ship_id = entry.ship_id, error = %e, "dropping malformed ship statistics"),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Account info / credential renewal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPortPrivate {
    #[serde(default)]
    pub port: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPortData {
    pub private: Option<RawPortPrivate>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCredential {
    pub access_token: String,
    pub expires_at: i64,
}

/// `data` of `ships/stats` and `account/info`: keyed by account id, `null`
/// for hidden profiles.
pub(crate) type PerAccount<T> = BTreeMap<String, Option<T>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn decode<T: for<'de> Deserialize<'de>>(raw: &str) -> Envelope<T> {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn stats_response_normalises_every_mode() {
        let env: Envelope<PerAccount<Vec<RawShipStatistics>>> = decode(
            r#"{
                "status": "ok",
                "meta": {"count": 1},
                "data": {"500": [{
                    "ship_id": 4179506160,
                    "last_battle_time": 1639000000,
                    "battles": 12,
                    "private": {"in_garage": true},
                    "pvp": {"wins": 5, "battles": 9},
                    "pve": {"wins": 1, "battles": 2},
                    "oper_div": {"wins": 1, "battles": 1},
                    "oper_solo": {"wins": 0, "battles": 0},
                    "rank_solo": {"wins": 0, "battles": 0}
                }]}
            }"#,
        );
        let mut data = env.into_data().unwrap();
        let ships = data.remove("500").flatten().unwrap();
        let stats = normalize_statistics(&ships);

        let s = &stats[&4_179_506_160];
        assert!(s.in_garage);
        assert_eq!(s.battles, 12);
        assert_eq!(s.pvp, ModeCounters { wins: 5, battles: 9 });
        assert_eq!(s.pve, ModeCounters { wins: 1, battles: 2 });
        assert_eq!(s.oper_div.wins, 1);
    }

    #[test]
    fn missing_modes_and_private_default_to_zero() {
        let raw: RawShipStatistics =
            serde_json::from_str(r#"{"ship_id": 7, "last_battle_time": 5, "battles": 1}"#).unwrap();
        let s = normalize_ship(&raw).unwrap();
        assert!(!s.in_garage);
        assert_eq!(s.pvp, ModeCounters::default());
        assert_eq!(s.rank_solo, ModeCounters::default());
    }

    #[test]
    fn untrustworthy_entries_are_dropped_not_fatal() {
        let raw: Vec<RawShipStatistics> = serde_json::from_str(
            r#"[
                {"ship_id": 1, "battles": 3, "pvp": {"wins": 4, "battles": 3}},
                {"ship_id": 2, "battles": -1},
                {"ship_id": 3, "battles": 2, "pve": {"wins": -2, "battles": 2}},
                {"ship_id": 4, "battles": 2, "pvp": {"wins": 1, "battles": 2}}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            normalize_ship(&raw[0]),
            Err(WireError::WinsExceedBattles {
                ship_id: 1,
                mode: "pvp",
                wins: 4,
                battles: 3
            })
        );
        let stats = normalize_statistics(&raw);
        assert_eq!(stats.keys().copied().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn invalid_token_is_its_own_error() {
        let env: Envelope<serde_json::Value> = decode(
            r#"{"status": "error", "error": {"code": 407, "message": "INVALID_ACCESS_TOKEN", "field": "access_token"}}"#,
        );
        assert_eq!(env.into_data(), Err(ApiError::InvalidAccessToken));
    }

    #[test]
    fn other_errors_keep_code_and_message() {
        let env: Envelope<serde_json::Value> = decode(
            r#"{"status": "error", "error": {"code": 407, "message": "REQUEST_LIMIT_EXCEEDED"}}"#,
        );
        assert_eq!(
            env.into_data(),
            Err(ApiError::Api {
                code: 407,
                message: "REQUEST_LIMIT_EXCEEDED".to_string()
            })
        );
    }

    #[test]
    fn hidden_profile_and_port_payloads() {
        let env: Envelope<PerAccount<RawPortData>> = decode(
            r#"{"status": "ok", "data": {"500": {"private": {"port": [10, 20]}}, "600": null}}"#,
        );
        let data = env.into_data().unwrap();
        let port = data
            .get("500")
            .cloned()
            .flatten()
            .and_then(|d| d.private)
            .map(|p| p.port);
        assert_eq!(port, Some(vec![10, 20]));
        assert!(data.get("600").cloned().flatten().is_none());
    }
}
