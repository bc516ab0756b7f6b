use serde::{Deserialize, Serialize};
use whaling_policy::ResourceKind;

use crate::GameMode;

/// Why a reward was credited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "mode", rename_all = "snake_case")]
pub enum CreditReason {
    /// Win observed between two refreshes.
    BattleWin(GameMode),
    /// Win already present on the first observation of the ship.
    LateJoin(GameMode),
    /// Credited by the account owner ("mark as played").
    Manual,
}

impl CreditReason {
    pub fn label(&self) -> &'static str {
        match self {
            CreditReason::BattleWin(_) => "battle_win",
            CreditReason::LateJoin(_) => "late_join",
            CreditReason::Manual => "manual",
        }
    }

    pub fn mode(&self) -> Option<GameMode> {
        match self {
            CreditReason::BattleWin(m) | CreditReason::LateJoin(m) => Some(*m),
            CreditReason::Manual => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    Ineligible,
    LeftGarage,
}

/// Observable outcome of a reconciliation, emitted best-effort.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    ResourceEarned {
        account_id: String,
        ship_id: i64,
        kind: ResourceKind,
        quantity: u32,
        credit: CreditReason,
    },
    ShipAddition {
        account_id: String,
        ship_id: i64,
    },
    ShipRemoval {
        account_id: String,
        ship_id: i64,
        reason: RemovalReason,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ResourceEarned { .. } => "resource_earned",
            DomainEvent::ShipAddition { .. } => "ship_addition",
            DomainEvent::ShipRemoval { .. } => "ship_removal",
        }
    }

    pub fn account_id(&self) -> &str {
        match self {
            DomainEvent::ResourceEarned { account_id, .. }
            | DomainEvent::ShipAddition { account_id, .. }
            | DomainEvent::ShipRemoval { account_id, .. } => account_id,
        }
    }

    pub fn ship_id(&self) -> i64 {
        match self {
            DomainEvent::ResourceEarned { ship_id, .. }
            | DomainEvent::ShipAddition { ship_id, .. }
            | DomainEvent::ShipRemoval { ship_id, .. } => *ship_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_earned_serializes_flat_with_mode() {
        let ev = DomainEvent::ResourceEarned {
            account_id: "500".to_string(),
            ship_id: 7,
            kind: ResourceKind::Coal,
            quantity: 750,
            credit: CreditReason::BattleWin(GameMode::Pvp),
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["event"], "resource_earned");
        assert_eq!(v["kind"], "coal");
        assert_eq!(v["credit"]["reason"], "battle_win");
        assert_eq!(v["credit"]["mode"], "pvp");
    }

    #[test]
    fn manual_credit_has_no_mode() {
        let v = serde_json::to_value(CreditReason::Manual).unwrap();
        assert_eq!(v, serde_json::json!({ "reason": "manual" }));
        assert_eq!(CreditReason::Manual.mode(), None);
    }
}
