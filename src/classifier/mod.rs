//! Boundary to the gesture classifier.
//!
//! The model itself runs elsewhere; this module validates what goes in,
//! decodes what comes out, and turns every classifier failure into a
//! "no gesture" sample so the confirmation engine never sees an error.

mod decoder;
mod frame;

pub use decoder::{Prediction, ScoreDecoder, ScoredClassifier};
pub use frame::LandmarkFrame;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

/// One classifier output for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationSample {
    /// `None` when no gesture was recognized.
    pub label: Option<String>,
    pub confidence: f32,
    pub observed_at: DateTime<Utc>,
}

impl ClassificationSample {
    pub fn nothing(observed_at: DateTime<Utc>) -> Self {
        Self {
            label: None,
            confidence: 0.0,
            observed_at,
        }
    }

    pub fn from_prediction(prediction: Prediction, observed_at: DateTime<Utc>) -> Self {
        Self {
            label: prediction.label,
            confidence: prediction.confidence,
            observed_at,
        }
    }
}

pub trait ClassifierPort: Send + Sync {
    fn classify(&self, frame: &LandmarkFrame) -> anyhow::Result<Prediction>;
}

/// Runs the classifier on `frame`, mapping a failure to "no gesture".
pub fn sample_frame<C: ClassifierPort + ?Sized>(
    classifier: &C,
    frame: &LandmarkFrame,
    now: DateTime<Utc>,
) -> ClassificationSample {
    match classifier.classify(frame) {
        Ok(prediction) => ClassificationSample::from_prediction(prediction, now),
        Err(err) => {
            warn!("Classifier failed, treating frame as no gesture: {err:#}");
            ClassificationSample::nothing(now)
        }
    }
}
