//! Static ship attributes and the ship catalogue.
//!
//! The catalogue is the game's encyclopedia, reduced to what the reward
//! policies need. Catalogue drift is expected: the account statistics may
//! mention ships that were retired from the encyclopedia, and those must be
//! skipped by callers rather than treated as errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Highest tier the game has ever shipped (super ships).
const MAX_TIER: u8 = 11;

/// A ship as described by the game's encyclopedia.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warship {
    pub ship_id: i64,
    pub name: String,
    pub tier: u8,
    #[serde(default)]
    pub nation: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub price_credit: i64,
    #[serde(default)]
    pub price_gold: i64,
    /// Research successors keyed by ship name.
    #[serde(default)]
    pub next_ships: BTreeMap<String, i64>,
    /// Time-limited rental ship.
    #[serde(default)]
    pub is_rental: bool,
    /// Unreleased ship under test.
    #[serde(default)]
    pub is_test: bool,
}

impl Warship {
    pub fn new(ship_id: i64, name: impl Into<String>, tier: u8) -> Self {
        Self {
            ship_id,
            name: name.into(),
            tier,
            nation: String::new(),
            is_premium: false,
            price_credit: 0,
            price_gold: 0,
            next_ships: BTreeMap::new(),
            is_rental: false,
            is_test: false,
        }
    }

    /// Test ships are flagged explicitly or carry a bracketed name
    /// (e.g. `"[Tokachi]"`).
    pub fn is_test_ship(&self) -> bool {
        self.is_test || self.name.starts_with('[')
    }

    pub fn is_rental_ship(&self) -> bool {
        self.is_rental
    }

    /// Premium ships and premiums in disguise (armory ships below T10 without
    /// successors, ships that cannot be bought for credits).
    pub fn gets_premium_treatment(&self) -> bool {
        if self.is_premium {
            return true;
        }
        if self.next_ships.is_empty() && self.tier < 10 {
            return true;
        }
        self.price_credit == 0
    }

    /// Entries with an empty name or an impossible tier are catalogue noise.
    pub fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty() && (1..=MAX_TIER).contains(&self.tier)
    }
}

/// Failure to load a catalogue document.
#[derive(Debug)]
pub enum CatalogueError {
    Decode(serde_json::Error),
}

impl std::fmt::Display for CatalogueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogueError::Decode(e) => write!(f, "ship catalogue decode failed: {e}"),
        }
    }
}

impl std::error::Error for CatalogueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogueError::Decode(e) => Some(e),
        }
    }
}

/// Ship id -> static attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShipCatalogue {
    ships: BTreeMap<i64, Warship>,
}

impl ShipCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ships(ships: impl IntoIterator<Item = Warship>) -> Self {
        Self {
            ships: ships.into_iter().map(|w| (w.ship_id, w)).collect(),
        }
    }

    /// Parse `{ "<ship_id>": { "ship_id": .., "name": .., "tier": .. }, .. }`.
    ///
    /// The map key is informational; the embedded `ship_id` is authoritative.
    /// Only a document that is not a keyed object fails; an entry that does
    /// not decode is dropped with a warning.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogueError> {
        let doc: BTreeMap<String, Value> =
            serde_json::from_str(raw).map_err(CatalogueError::Decode)?;
        let ships = doc.into_iter().filter_map(|(key, entry)| {
            match serde_json::from_value::<Warship>(entry) {
                Ok(ship) => Some(ship),
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping undecodable catalogue entry");
                    None
                }
            }
        });
        Ok(Self::from_ships(ships))
    }

    pub fn insert(&mut self, ship: Warship) {
        self.ships.insert(ship.ship_id, ship);
    }

    /// Well-formed entry for `ship_id`, or `None` when the ship is unknown or
    /// its catalogue data is malformed.
    pub fn lookup(&self, ship_id: i64) -> Option<&Warship> {
        self.ships.get(&ship_id).filter(|w| w.is_well_formed())
    }

    pub fn len(&self) -> usize {
        self.ships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracketed_name_is_a_test_ship() {
        let w = Warship::new(1, "[Alaska]", 9);
        assert!(w.is_test_ship());
        assert!(!Warship::new(2, "Alaska", 9).is_test_ship());
    }

    #[test]
    fn premium_treatment_covers_armory_ships() {
        let mut tech_tree = Warship::new(10, "Amagi", 8);
        tech_tree.price_credit = 10_000_000;
        tech_tree.next_ships.insert("Izumo".to_string(), 11);
        assert!(!tech_tree.gets_premium_treatment());

        let mut armory = Warship::new(12, "Smaland", 10);
        armory.price_credit = 0;
        assert!(armory.gets_premium_treatment());

        let mut no_successor = Warship::new(13, "Belfast", 7);
        no_successor.price_credit = 1;
        assert!(no_successor.gets_premium_treatment());
    }

    #[test]
    fn lookup_skips_malformed_entries() {
        let cat = ShipCatalogue::from_ships([
            Warship::new(1, "Good", 6),
            Warship::new(2, "", 6),
            Warship::new(3, "NoTier", 0),
        ]);
        assert!(cat.lookup(1).is_some());
        assert!(cat.lookup(2).is_none());
        assert!(cat.lookup(3).is_none());
        assert!(cat.lookup(4).is_none());
        assert_eq!(cat.len(), 3);
    }

    #[test]
    fn undecodable_entry_is_dropped_and_the_rest_survive() {
        let raw = r#"{
            "1": { "ship_id": 1, "name": "Cleveland", "tier": 6 },
            "2": { "ship_id": 2, "name": null, "tier": 8 },
            "3": { "ship_id": 3, "name": "Amagi", "tier": "eight" },
            "4": { "ship_id": 4, "name": "Yamato" }
        }"#;
        let cat = ShipCatalogue::from_json_str(raw).unwrap();
        assert_eq!(cat.len(), 1);
        assert_eq!(cat.lookup(1).unwrap().name, "Cleveland");
        assert!(cat.lookup(2).is_none());
        assert!(cat.lookup(3).is_none());
        assert!(cat.lookup(4).is_none());
    }

    #[test]
    fn catalogue_parses_keyed_document() {
        let raw = r#"{
            "4179571696": { "ship_id": 4179571696, "name": "Cleveland", "tier": 6, "nation": "usa" },
            "3763304432": { "ship_id": 3763304432, "name": "Mutsu", "tier": 6, "is_premium": true }
        }"#;
        let cat = ShipCatalogue::from_json_str(raw).unwrap();
        assert_eq!(cat.len(), 2);
        assert!(cat.lookup(3763304432).unwrap().is_premium);
    }

    #[test]
    fn catalogue_rejects_garbage() {
        assert!(ShipCatalogue::from_json_str("[1,2,3]").is_err());
    }
}
