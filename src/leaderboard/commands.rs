use chrono::NaiveDate;
use serde::Serialize;

use crate::{today, AppState};

use super::{build_leaderboard, LeaderboardEntry, LeaderboardWindow};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPayload {
    pub window: LeaderboardWindow,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub entries: Vec<LeaderboardEntry>,
}

pub async fn get_leaderboard(
    state: &AppState,
    window: LeaderboardWindow,
) -> Result<LeaderboardPayload, String> {
    let today = today();
    let (from, to) = window.range(today);

    let records = state
        .gate
        .attempts_between(from, to)
        .await
        .map_err(|e| e.to_string())?;

    Ok(LeaderboardPayload {
        window,
        from,
        to,
        entries: build_leaderboard(&records, window, today),
    })
}
