use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RefreshRequest;

/// Game server cluster an account lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Realm {
    Eu,
    Com,
    Ru,
    Asia,
}

impl Realm {
    pub const ALL: [Realm; 4] = [Realm::Eu, Realm::Com, Realm::Ru, Realm::Asia];

    pub fn as_str(&self) -> &'static str {
        match self {
            Realm::Eu => "eu",
            Realm::Com => "com",
            Realm::Ru => "ru",
            Realm::Asia => "asia",
        }
    }
}

impl std::fmt::Display for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RealmParseError {
    pub raw: String,
}

impl std::fmt::Display for RealmParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown realm '{}'", self.raw)
    }
}

impl std::error::Error for RealmParseError {}

impl std::str::FromStr for Realm {
    type Err = RealmParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Realm::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| RealmParseError { raw: s.to_string() })
    }
}

/// Registry record of a participant.
///
/// The realm stays a raw string here: accounts are written by the login flow
/// and a stale or mistyped realm must surface as a skipped refresh, not as a
/// registry decode failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub realm: String,
    pub access_token: String,
    /// Unix seconds.
    pub access_token_expires_at: i64,
    /// Unique per account, relative to the snapshot store root.
    pub snapshot_location: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_scheduled: DateTime<Utc>,
    pub active: bool,
}

impl Account {
    pub fn refresh_request(&self) -> RefreshRequest {
        RefreshRequest {
            account_id: self.account_id.clone(),
            realm: self.realm.clone(),
            access_token: self.access_token.clone(),
            access_token_expires_at: self.access_token_expires_at,
            snapshot_location: self.snapshot_location.clone(),
        }
    }
}
