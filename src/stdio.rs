//! Line-delimited JSON front end.
//!
//! Each input line is one command object tagged by `cmd`; each output line is
//! `{"ok":true,"data":...}` or `{"ok":false,"error":"..."}`. A malformed line
//! gets an error response and the loop carries on.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    attempts::commands::{
        can_submit_today, get_profile, get_user_attempts, submit_attempt, SubmitRequest,
    },
    challenge::commands::{get_daily_letters, get_daily_letters_for},
    confirmation::{
        commands::{
            close_session, get_session, observe_landmarks, observe_prediction, observe_scores,
            open_session, reset_session, update_confirmation_settings,
        },
        SessionId,
    },
    leaderboard::{commands::get_leaderboard, LeaderboardWindow},
    settings::ConfirmationSettings,
    AppState,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    Health,
    OpenSession,
    Observe {
        session_id: SessionId,
        predicted: Option<String>,
        /// Models that only report a label are taken at their word.
        #[serde(default = "full_confidence")]
        confidence: f32,
    },
    ObserveScores {
        session_id: SessionId,
        scores: Vec<f32>,
    },
    /// Only answered when the embedding program attached a classifier with
    /// [`AppState::with_classifier`]; the stock binary has none and replies
    /// with an error.
    ObserveLandmarks {
        session_id: SessionId,
        landmarks: Vec<f32>,
    },
    ResetSession {
        session_id: SessionId,
    },
    CloseSession {
        session_id: SessionId,
    },
    GetSession {
        session_id: SessionId,
    },
    UpdateConfirmation(ConfirmationSettings),
    DailyLetters {
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    Submit(SubmitRequest),
    CanSubmit {
        user_id: String,
    },
    History {
        user_id: String,
    },
    Profile {
        user_id: String,
    },
    Leaderboard {
        window: LeaderboardWindow,
    },
}

fn full_confidence() -> f32 {
    1.0
}

fn to_value<T: Serialize>(result: Result<T, String>) -> Result<Value, String> {
    result.and_then(|data| serde_json::to_value(data).map_err(|e| e.to_string()))
}

pub async fn dispatch(state: &AppState, request: Request) -> Result<Value, String> {
    match request {
        Request::Health => Ok(json!({
            "service": "isl-gesture",
            "sessions": state.sessions.len(),
            "classifier": state.classifier().is_some(),
        })),
        Request::OpenSession => to_value(open_session(state)),
        Request::Observe {
            session_id,
            predicted,
            confidence,
        } => to_value(observe_prediction(state, session_id, predicted, confidence)),
        Request::ObserveScores { session_id, scores } => {
            to_value(observe_scores(state, session_id, scores))
        }
        Request::ObserveLandmarks {
            session_id,
            landmarks,
        } => to_value(observe_landmarks(state, session_id, landmarks)),
        Request::ResetSession { session_id } => to_value(reset_session(state, session_id)),
        Request::CloseSession { session_id } => to_value(close_session(state, session_id)),
        Request::GetSession { session_id } => to_value(get_session(state, session_id)),
        Request::UpdateConfirmation(settings) => {
            to_value(update_confirmation_settings(state, settings))
        }
        Request::DailyLetters { date: Some(date) } => to_value(get_daily_letters_for(state, date)),
        Request::DailyLetters { date: None } => to_value(get_daily_letters(state)),
        Request::Submit(request) => to_value(submit_attempt(state, request).await),
        Request::CanSubmit { user_id } => to_value(can_submit_today(state, user_id).await),
        Request::History { user_id } => to_value(get_user_attempts(state, user_id).await),
        Request::Profile { user_id } => to_value(get_profile(state, user_id).await),
        Request::Leaderboard { window } => to_value(get_leaderboard(state, window).await),
    }
}

/// Handles one raw input line and renders the response line.
pub async fn handle_line(state: &AppState, line: &str) -> Value {
    let response = match serde_json::from_str::<Request>(line) {
        Ok(request) => {
            debug!("stdio request: {request:?}");
            dispatch(state, request).await
        }
        Err(err) => {
            warn!("Rejecting malformed command: {err}");
            Err(format!("malformed command: {err}"))
        }
    };

    match response {
        Ok(data) => json!({ "ok": true, "data": data }),
        Err(error) => json!({ "ok": false, "error": error }),
    }
}

/// Serves commands from `reader` until it reaches end of input.
///
/// Lines are read as raw bytes so a line that is not UTF-8 is answered like
/// any other malformed command instead of ending the loop.
pub async fn serve<R, W>(state: &AppState, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("failed to read command")?;
        if read == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(state, line.trim_end_matches(&['\r', '\n'][..])).await,
            Err(err) => {
                warn!("Rejecting command that is not UTF-8: {err}");
                json!({ "ok": false, "error": format!("malformed command: {err}") })
            }
        };

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        writer
            .write_all(&encoded)
            .await
            .context("failed to write response")?;
        writer.flush().await?;
    }
    Ok(())
}
