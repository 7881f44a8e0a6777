use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

use super::{frame::LandmarkFrame, ClassifierPort};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub label: Option<String>,
    pub confidence: f32,
}

impl Prediction {
    pub fn none() -> Self {
        Self {
            label: None,
            confidence: 0.0,
        }
    }
}

/// Maps a model's per-class scores back to a label.
#[derive(Debug, Clone)]
pub struct ScoreDecoder {
    label_classes: Vec<String>,
}

impl ScoreDecoder {
    pub fn new(label_classes: Vec<String>) -> CoreResult<Self> {
        if label_classes.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "label_classes must not be empty".into(),
            ));
        }
        Ok(Self { label_classes })
    }

    pub fn label_classes(&self) -> &[String] {
        &self.label_classes
    }

    /// Argmax over `scores`. Equal scores go to the lowest class index.
    pub fn decode(&self, scores: &[f32]) -> CoreResult<Prediction> {
        if scores.len() != self.label_classes.len() {
            return Err(CoreError::InvalidInput(format!(
                "expected {} class scores, got {}",
                self.label_classes.len(),
                scores.len()
            )));
        }

        let mut best: Option<(usize, f32)> = None;
        for (index, &score) in scores.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((index, score)),
            }
        }

        Ok(match best {
            Some((index, confidence)) => Prediction {
                label: Some(self.label_classes[index].clone()),
                confidence,
            },
            None => Prediction::none(),
        })
    }
}

/// A [`ClassifierPort`] built from a scoring function and a decoder.
pub struct ScoredClassifier<F> {
    model: F,
    decoder: ScoreDecoder,
}

impl<F> ScoredClassifier<F>
where
    F: Fn(&[f32]) -> anyhow::Result<Vec<f32>> + Send + Sync,
{
    pub fn new(model: F, decoder: ScoreDecoder) -> Self {
        Self { model, decoder }
    }
}

impl<F> ClassifierPort for ScoredClassifier<F>
where
    F: Fn(&[f32]) -> anyhow::Result<Vec<f32>> + Send + Sync,
{
    fn classify(&self, frame: &LandmarkFrame) -> anyhow::Result<Prediction> {
        let scores = (self.model)(frame.values()).context("model inference failed")?;
        Ok(self.decoder.decode(&scores)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> ScoreDecoder {
        ScoreDecoder::new(vec!["A".into(), "B".into(), "C".into()]).unwrap()
    }

    #[test]
    fn picks_highest_score() {
        let prediction = decoder().decode(&[0.1, 0.7, 0.2]).unwrap();
        assert_eq!(prediction.label.as_deref(), Some("B"));
        assert_eq!(prediction.confidence, 0.7);
    }

    #[test]
    fn ties_go_to_first_class() {
        let prediction = decoder().decode(&[0.4, 0.4, 0.2]).unwrap();
        assert_eq!(prediction.label.as_deref(), Some("A"));
    }

    #[test]
    fn length_mismatch_is_invalid_input() {
        assert!(matches!(
            decoder().decode(&[0.5, 0.5]),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn all_nan_scores_decode_to_nothing() {
        let prediction = decoder().decode(&[f32::NAN; 3]).unwrap();
        assert_eq!(prediction, Prediction::none());
    }

    #[test]
    fn scored_classifier_runs_model_then_decodes() {
        let classifier = ScoredClassifier::new(
            |values: &[f32]| -> anyhow::Result<Vec<f32>> { Ok(vec![0.0, 0.0, values[0]]) },
            decoder(),
        );
        let frame = LandmarkFrame::new(vec![0.9, 0.1], 2).unwrap();
        let prediction = classifier.classify(&frame).unwrap();
        assert_eq!(prediction.label.as_deref(), Some("C"));
    }
}
