//! Daily challenge attempt records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One accepted daily challenge submission. At most one exists per
/// `(user_id, date)`; records are never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub id: Uuid,
    pub user_id: String,
    pub display_name: Option<String>,
    pub date: NaiveDate,
    pub score: u32,
    /// Time the player took to finish the challenge.
    pub duration_ms: u64,
    pub submitted_at: DateTime<Utc>,
}

/// Result of an insert-if-absent against the attempt store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}
