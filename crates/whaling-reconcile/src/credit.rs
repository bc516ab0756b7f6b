use chrono::{DateTime, Utc};
use whaling_policy::ResourceKind;
use whaling_schemas::{AccountSnapshot, CreditReason, DomainEvent};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreditError {
    /// The snapshot has no entry for the ship.
    UnknownShip { ship_id: i64 },
    AlreadyCredited { ship_id: i64 },
}

impl std::fmt::Display for CreditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreditError::UnknownShip { ship_id } => {
                write!(f, "ship {ship_id} is not tracked for this account")
            }
            CreditError::AlreadyCredited { ship_id } => {
                write!(f, "ship {ship_id} was already credited")
            }
        }
    }
}

impl std::error::Error for CreditError {}

/// Credit one ship on the account owner's word ("mark as played").
///
/// The ship's last battle time is moved to `now` so that the next refresh does
/// not read the manual credit as a pending battle.
pub fn credit_manually(
    snapshot: &mut AccountSnapshot,
    ship_id: i64,
    now: DateTime<Utc>,
) -> Result<DomainEvent, CreditError> {
    let entry = snapshot
        .ships
        .get_mut(&ship_id)
        .ok_or(CreditError::UnknownShip { ship_id })?;
    if entry.reward.is_credited() {
        return Err(CreditError::AlreadyCredited { ship_id });
    }

    entry.reward.credit();
    entry.statistics.last_battle_time = now.timestamp();
    let event = DomainEvent::ResourceEarned {
        account_id: snapshot.account_id.clone(),
        ship_id,
        kind: entry.reward.kind,
        quantity: entry.reward.awardable,
        credit: CreditReason::Manual,
    };

    let seed: Vec<ResourceKind> = snapshot.resources.iter().map(|t| t.kind).collect();
    snapshot.recompute_totals(&seed);
    if now > snapshot.last_updated {
        snapshot.last_updated = now;
    }
    Ok(event)
}
