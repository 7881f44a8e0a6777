use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{today, AppState};

use super::{AttemptRecord, ProfileStats, SubmitOutcome, Submission};

/// A finished daily run as sent by a client. The day is always today's.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub score: u32,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
    pub accepted: bool,
    pub error: Option<String>,
    pub attempt: Option<AttemptRecord>,
}

pub async fn submit_attempt(state: &AppState, request: SubmitRequest) -> Result<SubmitPayload, String> {
    let submission = Submission {
        user_id: request.user_id,
        display_name: request.display_name,
        date: today(),
        score: request.score,
        duration_ms: request.duration_ms,
    };

    let outcome = state
        .gate
        .try_submit(submission, Utc::now())
        .await
        .map_err(|e| e.to_string())?;

    Ok(match outcome {
        SubmitOutcome::Accepted(record) => SubmitPayload {
            accepted: true,
            error: None,
            attempt: Some(record),
        },
        SubmitOutcome::Rejected(reason) => SubmitPayload {
            accepted: false,
            error: Some(reason.message().to_string()),
            attempt: None,
        },
    })
}

pub async fn can_submit_today(state: &AppState, user_id: String) -> Result<bool, String> {
    state
        .gate
        .can_submit(&user_id, today())
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_user_attempts(state: &AppState, user_id: String) -> Result<Vec<AttemptRecord>, String> {
    state.gate.history(&user_id).await.map_err(|e| e.to_string())
}

pub async fn get_profile(state: &AppState, user_id: String) -> Result<ProfileStats, String> {
    state.gate.profile(&user_id).await.map_err(|e| e.to_string())
}
