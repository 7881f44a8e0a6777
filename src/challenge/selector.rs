use chrono::{Datelike, NaiveDate};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Letters every player gets on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    pub date: NaiveDate,
    pub letters: Vec<String>,
}

/// Seed for `date`: its day number counted from 0001-01-01 (proleptic
/// Gregorian), so every process derives the same stream without coordination.
pub fn seed_for(date: NaiveDate) -> u64 {
    i64::from(date.num_days_from_ce()) as u64
}

/// Picks `count` letters from `pool` for `date`.
///
/// `StdRng` seeded with [`seed_for`], then a partial Fisher-Yates shuffle of
/// a copy of the pool; the first `count` shuffled entries are the challenge
/// in order. Same date and pool always give the same letters.
pub fn select_letters(date: NaiveDate, pool: &[String], count: usize) -> CoreResult<Vec<String>> {
    if count > pool.len() {
        return Err(CoreError::InvalidConfiguration(format!(
            "daily challenge wants {count} letters but the pool only has {}",
            pool.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed_for(date));
    let mut shuffled = pool.to_vec();
    let (chosen, _) = shuffled.partial_shuffle(&mut rng, count);
    Ok(chosen.to_vec())
}

pub fn daily_challenge(date: NaiveDate, pool: &[String], count: usize) -> CoreResult<DailyChallenge> {
    Ok(DailyChallenge {
        date,
        letters: select_letters(date, pool, count)?,
    })
}
