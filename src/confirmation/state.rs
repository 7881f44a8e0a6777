use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a session sits in the confirmation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ConfirmationStatus {
    Idle,
    Candidate {
        label: String,
        since: DateTime<Utc>,
    },
    Confirmed {
        label: String,
    },
}

impl Default for ConfirmationStatus {
    fn default() -> Self {
        ConfirmationStatus::Idle
    }
}

/// Per-session confirmation state.
///
/// `candidate_since` is set exactly when `current_candidate` is, and
/// `confirmed_label` only ever holds a label that stayed the candidate for the
/// full hold duration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationState {
    pub current_candidate: Option<String>,
    pub candidate_since: Option<DateTime<Utc>>,
    pub confirmed_label: Option<String>,
}

impl ConfirmationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConfirmationStatus {
        match (&self.current_candidate, self.candidate_since, &self.confirmed_label) {
            (Some(label), _, Some(confirmed)) if label == confirmed => {
                ConfirmationStatus::Confirmed {
                    label: confirmed.clone(),
                }
            }
            (Some(label), Some(since), _) => ConfirmationStatus::Candidate {
                label: label.clone(),
                since,
            },
            _ => ConfirmationStatus::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.current_candidate.is_none()
    }

    pub fn begin_candidate(&mut self, label: String, since: DateTime<Utc>) {
        *self = Self {
            current_candidate: Some(label),
            candidate_since: Some(since),
            confirmed_label: None,
        };
    }

    pub fn confirm(&mut self) {
        self.confirmed_label = self.current_candidate.clone();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
