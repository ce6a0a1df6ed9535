//! Caregiver to patient relationship model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AuthError;

/// Lifecycle state of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
    Pending,
    Approved,
    Rejected,
    Removed,
}

impl RelationshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Pending => "pending",
            RelationshipStatus::Approved => "approved",
            RelationshipStatus::Rejected => "rejected",
            RelationshipStatus::Removed => "removed",
        }
    }

    /// Whether a caregiver may file a new request over a row in this state.
    pub fn can_be_rerequested(&self) -> bool {
        matches!(self, RelationshipStatus::Rejected | RelationshipStatus::Removed)
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipStatus {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RelationshipStatus::Pending),
            "approved" => Ok(RelationshipStatus::Approved),
            "rejected" => Ok(RelationshipStatus::Rejected),
            "removed" => Ok(RelationshipStatus::Removed),
            other => Err(AuthError::Internal(format!(
                "unknown relationship status in store: {}",
                other
            ))),
        }
    }
}

/// A patient's answer to a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl From<Decision> for RelationshipStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => RelationshipStatus::Approved,
            Decision::Rejected => RelationshipStatus::Rejected,
        }
    }
}

/// Relationship entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub id: Uuid,
    pub caregiver_id: Uuid,
    pub patient_id: Uuid,
    pub status: RelationshipStatus,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Relationship {
    /// True when `user_id` is the caregiver or the patient of this row.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.caregiver_id == user_id || self.patient_id == user_id
    }
}

/// Input for a caregiver's access request
#[derive(Debug, Clone)]
pub struct AccessRequest {
    /// Id used if no row exists yet for the pair
    pub id: Uuid,
    pub caregiver_id: Uuid,
    pub patient_id: Uuid,
    pub notes: Option<String>,
    pub requested_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_closed_states_can_be_rerequested() {
        assert!(!RelationshipStatus::Pending.can_be_rerequested());
        assert!(!RelationshipStatus::Approved.can_be_rerequested());
        assert!(RelationshipStatus::Rejected.can_be_rerequested());
        assert!(RelationshipStatus::Removed.can_be_rerequested());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            RelationshipStatus::Pending,
            RelationshipStatus::Approved,
            RelationshipStatus::Rejected,
            RelationshipStatus::Removed,
        ] {
            assert_eq!(status.as_str().parse::<RelationshipStatus>().unwrap(), status);
        }
    }

    #[test]
    fn decision_deserializes_only_terminal_answers() {
        let approved: Decision = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(RelationshipStatus::from(approved), RelationshipStatus::Approved);
        assert!(serde_json::from_str::<Decision>("\"removed\"").is_err());
    }
}
