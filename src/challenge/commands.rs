use chrono::NaiveDate;
use serde::Serialize;

use crate::{today, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLettersPayload {
    pub date: NaiveDate,
    pub letters: Vec<String>,
}

pub fn get_daily_letters(state: &AppState) -> Result<DailyLettersPayload, String> {
    get_daily_letters_for(state, today())
}

pub fn get_daily_letters_for(state: &AppState, date: NaiveDate) -> Result<DailyLettersPayload, String> {
    let challenge = state
        .challenges
        .get_or_select(date)
        .map_err(|e| e.to_string())?;

    Ok(DailyLettersPayload {
        date: challenge.date,
        letters: challenge.letters,
    })
}
