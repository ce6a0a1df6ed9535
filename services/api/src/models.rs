//! API service request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vitals::{Alert, VitalSigns};

/// Query for a point-in-time reading
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadingQuery {
    /// RFC 3339 timestamp; defaults to now
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertsResponse {
    pub patient_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub vitals: VitalSigns,
    pub alerts: Vec<Alert>,
}
