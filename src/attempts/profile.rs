//! Per-player summary shown on the profile page.

use serde::Serialize;

use super::AttemptRecord;

const TOP_SCORER_MIN_HIGHEST: u32 = 10;
const CONSISTENT_MIN_AVERAGE: f64 = 5.0;
const EXPERIENCED_MIN_GAMES: usize = 10;
const RECENT_GAMES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Badge {
    TopScorer,
    ConsistentPlayer,
    Experienced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub user_id: String,
    pub highest_score: u32,
    /// Mean score rounded to two decimals. Badges are judged on this value.
    pub average_score: f64,
    pub total_games: usize,
    pub badges: Vec<Badge>,
    /// Most recent games, newest day first.
    pub recent: Vec<AttemptRecord>,
}

impl ProfileStats {
    /// Summarizes `records`, which may arrive in any order.
    pub fn from_attempts(user_id: impl Into<String>, mut records: Vec<AttemptRecord>) -> Self {
        let total_games = records.len();
        let highest_score = records.iter().map(|r| r.score).max().unwrap_or(0);
        let average_score = if total_games == 0 {
            0.0
        } else {
            let sum: u64 = records.iter().map(|r| u64::from(r.score)).sum();
            (sum as f64 / total_games as f64 * 100.0).round() / 100.0
        };

        let mut badges = Vec::new();
        if total_games > 0 {
            if highest_score >= TOP_SCORER_MIN_HIGHEST {
                badges.push(Badge::TopScorer);
            }
            if average_score >= CONSISTENT_MIN_AVERAGE {
                badges.push(Badge::ConsistentPlayer);
            }
            if total_games >= EXPERIENCED_MIN_GAMES {
                badges.push(Badge::Experienced);
            }
        }

        records.sort_by(|a, b| b.date.cmp(&a.date).then(b.submitted_at.cmp(&a.submitted_at)));
        records.truncate(RECENT_GAMES);

        Self {
            user_id: user_id.into(),
            highest_score,
            average_score,
            total_games,
            badges,
            recent: records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn game(d: u32, score: u32) -> AttemptRecord {
        AttemptRecord {
            id: Uuid::new_v4(),
            user_id: "u1".into(),
            display_name: None,
            date: NaiveDate::from_ymd_opt(2025, 7, d).unwrap(),
            score,
            duration_ms: 1_000,
            submitted_at: Utc.with_ymd_and_hms(2025, 7, d, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn no_games_means_no_badges() {
        let stats = ProfileStats::from_attempts("u1", Vec::new());
        assert_eq!(stats.total_games, 0);
        assert_eq!(stats.highest_score, 0);
        assert_eq!(stats.average_score, 0.0);
        assert!(stats.badges.is_empty());
        assert!(stats.recent.is_empty());
    }

    #[test]
    fn average_is_rounded_to_two_decimals() {
        let stats = ProfileStats::from_attempts("u1", vec![game(1, 1), game(2, 1), game(3, 2)]);
        assert_eq!(stats.average_score, 1.33);
        assert_eq!(stats.highest_score, 2);
        assert_eq!(stats.total_games, 3);
    }

    #[test]
    fn badges_follow_their_thresholds() {
        let stats = ProfileStats::from_attempts("u1", vec![game(1, 10), game(2, 0)]);
        assert_eq!(stats.badges, vec![Badge::TopScorer, Badge::ConsistentPlayer]);

        let stats = ProfileStats::from_attempts("u1", vec![game(1, 9), game(2, 0)]);
        assert!(stats.badges.is_empty());

        let ten: Vec<_> = (1..=10).map(|d| game(d, 1)).collect();
        let stats = ProfileStats::from_attempts("u1", ten);
        assert_eq!(stats.badges, vec![Badge::Experienced]);
    }

    #[test]
    fn recent_keeps_the_five_newest() {
        let games: Vec<_> = [4, 9, 1, 7, 3, 8, 2].into_iter().map(|d| game(d, 1)).collect();
        let stats = ProfileStats::from_attempts("u1", games);
        let days: Vec<u32> = stats.recent.iter().map(|r| chrono::Datelike::day(&r.date)).collect();
        assert_eq!(days, vec![9, 8, 7, 4, 3]);
        assert_eq!(stats.total_games, 7);
    }
}
