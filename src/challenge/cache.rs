use std::{collections::HashMap, sync::RwLock};

use chrono::NaiveDate;

use crate::error::CoreResult;

use super::selector::{daily_challenge, DailyChallenge};

/// Days kept before old entries are evicted on insert.
const RETAINED_DAYS: i64 = 7;

/// Read-through cache of daily challenges for a fixed pool.
///
/// Two callers racing on an uncached date both compute the challenge; the
/// selection is deterministic, so whichever insert wins stores the same value.
pub struct DailyChallengeCache {
    pool: Vec<String>,
    count: usize,
    entries: RwLock<HashMap<NaiveDate, DailyChallenge>>,
}

impl DailyChallengeCache {
    /// Validates the pool/count pair up front so a bad configuration fails at
    /// startup rather than on the first request.
    pub fn new(pool: Vec<String>, count: usize) -> CoreResult<Self> {
        daily_challenge(NaiveDate::MIN, &pool, count)?;
        Ok(Self {
            pool,
            count,
            entries: RwLock::new(HashMap::new()),
        })
    }

    pub fn get_or_select(&self, date: NaiveDate) -> CoreResult<DailyChallenge> {
        {
            let entries = match self.entries.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(challenge) = entries.get(&date) {
                return Ok(challenge.clone());
            }
        }

        let challenge = daily_challenge(date, &self.pool, self.count)?;
        log::debug!("Selected daily letters for {date}: {:?}", challenge.letters);

        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.retain(|cached, _| (date - *cached).num_days().abs() <= RETAINED_DAYS);
        Ok(entries.entry(date).or_insert(challenge).clone())
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::select_letters;
    use std::{sync::Arc, thread};

    fn pool() -> Vec<String> {
        ('A'..='Z').map(String::from).collect()
    }

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    #[test]
    fn cached_value_matches_direct_selection() {
        let cache = DailyChallengeCache::new(pool(), 3).unwrap();
        let cached = cache.get_or_select(day(0)).unwrap();
        assert_eq!(cached.letters, select_letters(day(0), &pool(), 3).unwrap());
        assert_eq!(cache.get_or_select(day(0)).unwrap(), cached);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_callers_agree() {
        let cache = Arc::new(DailyChallengeCache::new(pool(), 4).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_or_select(day(3)).unwrap())
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn old_days_are_evicted() {
        let cache = DailyChallengeCache::new(pool(), 3).unwrap();
        cache.get_or_select(day(0)).unwrap();
        cache.get_or_select(day(30)).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn oversized_count_fails_at_construction() {
        assert!(DailyChallengeCache::new(vec!["A".into()], 2).is_err());
    }
}
