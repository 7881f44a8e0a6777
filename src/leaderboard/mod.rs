//! Daily, weekly and monthly rankings over accepted attempts.

pub mod commands;

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::AttemptRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaderboardWindow {
    /// Today only.
    Daily,
    /// The last seven days, today included.
    Weekly,
    /// From the first of the current month.
    Monthly,
}

impl LeaderboardWindow {
    /// First and last day (inclusive) covered when ranking on `today`.
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            LeaderboardWindow::Daily => today,
            LeaderboardWindow::Weekly => today - Duration::days(6),
            LeaderboardWindow::Monthly => today.with_day(1).unwrap_or(today),
        };
        (start, today)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub display_name: Option<String>,
    pub total_score: u64,
    pub total_duration_ms: u64,
    pub attempts: usize,
}

/// Sums each user's attempts inside `window` and ranks them: higher score
/// first, then less time spent, then user id.
pub fn build_leaderboard(
    records: &[AttemptRecord],
    window: LeaderboardWindow,
    today: NaiveDate,
) -> Vec<LeaderboardEntry> {
    let (start, end) = window.range(today);
    let mut totals: HashMap<&str, LeaderboardEntry> = HashMap::new();

    for record in records.iter().filter(|r| r.date >= start && r.date <= end) {
        let entry = totals
            .entry(record.user_id.as_str())
            .or_insert_with(|| LeaderboardEntry {
                rank: 0,
                user_id: record.user_id.clone(),
                display_name: None,
                total_score: 0,
                total_duration_ms: 0,
                attempts: 0,
            });
        entry.total_score += u64::from(record.score);
        entry.total_duration_ms = entry.total_duration_ms.saturating_add(record.duration_ms);
        entry.attempts += 1;
        if record.display_name.is_some() {
            entry.display_name = record.display_name.clone();
        }
    }

    let mut ranked: Vec<LeaderboardEntry> = totals.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then(a.total_duration_ms.cmp(&b.total_duration_ms))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    for (index, entry) in ranked.iter_mut().enumerate() {
        entry.rank = index + 1;
    }
    ranked
}
