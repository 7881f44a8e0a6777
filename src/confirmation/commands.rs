use chrono::Utc;
use serde::Serialize;

use crate::{
    classifier::{ClassificationSample, LandmarkFrame},
    settings::ConfirmationSettings,
    AppState,
};

use super::{ConfirmationEvent, Observation, SessionId, SessionSnapshot};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub session_id: SessionId,
}

/// What a client needs after each frame.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionPayload {
    pub predicted: Option<String>,
    pub confirmed: bool,
    pub event: ConfirmationEvent,
}

impl From<Observation> for PredictionPayload {
    fn from(observation: Observation) -> Self {
        Self {
            predicted: observation.event.label().map(str::to_string),
            confirmed: observation.confirmed_label.is_some(),
            event: observation.event,
        }
    }
}

pub fn open_session(state: &AppState) -> Result<SessionPayload, String> {
    Ok(SessionPayload {
        session_id: state.sessions.open(Utc::now()),
    })
}

/// Feeds a prediction made by an external model.
pub fn observe_prediction(
    state: &AppState,
    session_id: SessionId,
    predicted: Option<String>,
    confidence: f32,
) -> Result<PredictionPayload, String> {
    let now = Utc::now();
    let sample = ClassificationSample {
        label: predicted,
        confidence,
        observed_at: now,
    };
    state
        .sessions
        .observe(session_id, &sample, now)
        .map(PredictionPayload::from)
        .map_err(|e| e.to_string())
}

/// Feeds raw per-class scores, decoded against the configured label classes.
pub fn observe_scores(
    state: &AppState,
    session_id: SessionId,
    scores: Vec<f32>,
) -> Result<PredictionPayload, String> {
    let now = Utc::now();
    let prediction = state.decoder.decode(&scores).map_err(|e| e.to_string())?;
    let sample = ClassificationSample::from_prediction(prediction, now);
    state
        .sessions
        .observe(session_id, &sample, now)
        .map(PredictionPayload::from)
        .map_err(|e| e.to_string())
}

/// Classifies a landmark vector with the attached model, then observes it.
pub fn observe_landmarks(
    state: &AppState,
    session_id: SessionId,
    landmarks: Vec<f32>,
) -> Result<PredictionPayload, String> {
    let classifier = state
        .classifier()
        .ok_or_else(|| "no classifier attached".to_string())?;

    let settings = state.settings.snapshot();
    let frame = LandmarkFrame::build(
        landmarks,
        settings.classifier.feature_len,
        settings.classifier.pad_short_frames,
    )
    .map_err(|e| e.to_string())?;

    state
        .sessions
        .observe_frame(session_id, classifier, &frame, Utc::now())
        .map(PredictionPayload::from)
        .map_err(|e| e.to_string())
}

pub fn reset_session(state: &AppState, session_id: SessionId) -> Result<(), String> {
    state
        .sessions
        .reset(session_id, Utc::now())
        .map_err(|e| e.to_string())
}

pub fn close_session(state: &AppState, session_id: SessionId) -> Result<bool, String> {
    Ok(state.sessions.close(session_id))
}

pub fn get_session(state: &AppState, session_id: SessionId) -> Result<SessionSnapshot, String> {
    state.sessions.snapshot(session_id).map_err(|e| e.to_string())
}

/// Stores new thresholds; sessions opened afterwards use them.
pub fn update_confirmation_settings(
    state: &AppState,
    confirmation: ConfirmationSettings,
) -> Result<(), String> {
    state
        .settings
        .update_confirmation(confirmation)
        .map_err(|e| e.to_string())?;
    state
        .sessions
        .set_config(state.settings.snapshot().confirmation_config());
    Ok(())
}
