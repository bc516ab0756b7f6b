use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One account's unit of refresh work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub account_id: String,
    pub realm: String,
    pub access_token: String,
    /// Unix seconds.
    pub access_token_expires_at: i64,
    pub snapshot_location: String,
}

/// Payload moved by the dispatch transport. Delivered at least once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshBatch {
    pub batch_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub requests: Vec<RefreshRequest>,
}

#[derive(Debug)]
pub enum BatchDecodeError {
    Json(serde_json::Error),
    Empty { batch_id: Uuid },
}

impl std::fmt::Display for BatchDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchDecodeError::Json(e) => write!(f, "refresh batch decode failed: {e}"),
            BatchDecodeError::Empty { batch_id } => {
                write!(f, "refresh batch {batch_id} carries no requests")
            }
        }
    }
}

impl std::error::Error for BatchDecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchDecodeError::Json(e) => Some(e),
            BatchDecodeError::Empty { .. } => None,
        }
    }
}

impl RefreshBatch {
    pub fn new(requests: Vec<RefreshRequest>, now: DateTime<Utc>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            created_at: now,
            requests,
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a transport payload. A payload that cannot be decoded, or that
    /// carries no requests, fails as a whole.
    pub fn from_json(raw: &str) -> Result<Self, BatchDecodeError> {
        let batch: Self = serde_json::from_str(raw).map_err(BatchDecodeError::Json)?;
        if batch.requests.is_empty() {
            return Err(BatchDecodeError::Empty {
                batch_id: batch.batch_id,
            });
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn req(id: &str) -> RefreshRequest {
        RefreshRequest {
            account_id: id.to_string(),
            realm: "eu".to_string(),
            access_token: "tok".to_string(),
            access_token_expires_at: 1_700_000_000,
            snapshot_location: format!("data/{id}/x.json"),
        }
    }

    #[test]
    fn decode_rejects_truncated_payload() {
        let now = Utc.with_ymd_and_hms(2021, 12, 8, 0, 0, 0).unwrap();
        let raw = RefreshBatch::new(vec![req("1")], now).to_json().unwrap();
        let cut = &raw[..raw.len() / 2];
        assert!(matches!(
            RefreshBatch::from_json(cut),
            Err(BatchDecodeError::Json(_))
        ));
    }

    #[test]
    fn decode_rejects_empty_batch() {
        let now = Utc.with_ymd_and_hms(2021, 12, 8, 0, 0, 0).unwrap();
        let raw = RefreshBatch::new(vec![], now).to_json().unwrap();
        assert!(matches!(
            RefreshBatch::from_json(&raw),
            Err(BatchDecodeError::Empty { .. })
        ));
    }

    #[test]
    fn decode_keeps_request_order() {
        let now = Utc.with_ymd_and_hms(2021, 12, 8, 0, 0, 0).unwrap();
        let batch = RefreshBatch::new(vec![req("b"), req("a"), req("c")], now);
        let back = RefreshBatch::from_json(&batch.to_json().unwrap()).unwrap();
        let ids: Vec<&str> = back.requests.iter().map(|r| r.account_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(back.batch_id, batch.batch_id);
    }
}
