//! Debounce/hold state machine turning per-frame predictions into confirmed
//! letters.
//!
//! A label has to be the only thing the classifier reports, at or above the
//! confidence threshold, for the whole hold duration before it is confirmed.
//! Any gap (no hand, low confidence, a different letter) restarts the hold.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classifier::ClassificationSample;

use super::state::{ConfirmationState, ConfirmationStatus};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfirmationConfig {
    /// How long a label must persist before it is confirmed.
    pub hold: Duration,
    /// Samples below this are treated as "no gesture".
    pub min_confidence: f32,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            hold: Duration::from_secs(3),
            min_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ConfirmationEvent {
    /// Nothing usable this frame; any candidate and confirmation were dropped.
    Reset,
    /// A new label started its hold.
    CandidateChanged { label: String },
    /// The candidate is still held. Also reported for every frame after the
    /// label was confirmed.
    Pending {
        label: String,
        #[serde(rename = "elapsedMs", serialize_with = "serialize_millis")]
        elapsed: Duration,
    },
    /// The candidate reached the hold duration. Emitted once per hold.
    Confirmed { label: String },
}

fn serialize_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

impl ConfirmationEvent {
    pub fn label(&self) -> Option<&str> {
        match self {
            ConfirmationEvent::Reset => None,
            ConfirmationEvent::CandidateChanged { label }
            | ConfirmationEvent::Pending { label, .. }
            | ConfirmationEvent::Confirmed { label } => Some(label),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmationEngine {
    config: ConfirmationConfig,
    state: ConfirmationState,
}

impl ConfirmationEngine {
    pub fn new(config: ConfirmationConfig) -> Self {
        Self {
            config,
            state: ConfirmationState::new(),
        }
    }

    pub fn config(&self) -> &ConfirmationConfig {
        &self.config
    }

    pub fn state(&self) -> &ConfirmationState {
        &self.state
    }

    pub fn status(&self) -> ConfirmationStatus {
        self.state.status()
    }

    /// The label confirmed for the gesture currently held, if any.
    pub fn confirmed_label(&self) -> Option<&str> {
        self.state.confirmed_label.as_deref()
    }

    /// Feeds one classifier result observed at `now`.
    pub fn observe(&mut self, sample: &ClassificationSample, now: DateTime<Utc>) -> ConfirmationEvent {
        let label = match sample.label.as_deref() {
            Some(label) if self.is_confident(sample.confidence) => label,
            _ => {
                self.state.clear();
                return ConfirmationEvent::Reset;
            }
        };

        if self.state.current_candidate.as_deref() != Some(label) {
            self.state.begin_candidate(label.to_string(), now);
            return ConfirmationEvent::CandidateChanged {
                label: label.to_string(),
            };
        }

        let since = self.state.candidate_since.unwrap_or(now);
        // Samples may arrive with a clock slightly behind the one that
        // started the hold; never report negative progress.
        let elapsed = (now - since).to_std().unwrap_or(Duration::ZERO);

        if elapsed >= self.config.hold && self.state.confirmed_label.as_deref() != Some(label) {
            self.state.confirm();
            return ConfirmationEvent::Confirmed {
                label: label.to_string(),
            };
        }

        ConfirmationEvent::Pending {
            label: label.to_string(),
            elapsed,
        }
    }

    pub fn reset(&mut self) {
        self.state.clear();
    }

    // NaN compares false, so it lands on the "not confident" side.
    fn is_confident(&self, confidence: f32) -> bool {
        confidence >= self.config.min_confidence
    }
}
