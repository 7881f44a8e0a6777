use std::{collections::HashSet, sync::Arc, thread};

use chrono::NaiveDate;
use isl_gesture_lib::{
    challenge::{select_letters, DailyChallengeCache},
    CoreError,
};

fn pool(letters: &str) -> Vec<String> {
    letters.chars().map(String::from).collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn whole_pool_is_a_permutation() {
    let letters = pool("ABC");
    let mut chosen = select_letters(date(2025, 3, 14), &letters, 3).unwrap();
    chosen.sort();
    assert_eq!(chosen, letters);
}

#[test]
fn choices_are_distinct_members_of_the_pool() {
    let letters = pool("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    let mut day = date(2024, 1, 1);
    for _ in 0..400 {
        let chosen = select_letters(day, &letters, 5).unwrap();
        let unique: HashSet<_> = chosen.iter().collect();
        assert_eq!(unique.len(), 5, "duplicate letter on {day}");
        assert!(chosen.iter().all(|letter| letters.contains(letter)));
        day = day.succ_opt().unwrap();
    }
}

#[test]
fn days_do_not_all_agree() {
    let letters = pool("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    let distinct: HashSet<Vec<String>> = (1..=28)
        .map(|d| select_letters(date(2025, 2, d), &letters, 3).unwrap())
        .collect();
    assert!(distinct.len() > 1);
}

#[test]
fn oversized_request_is_a_configuration_error() {
    let result = select_letters(date(2025, 3, 14), &pool("AB"), 3);
    assert!(matches!(result, Err(CoreError::InvalidConfiguration(_))));
    assert!(matches!(
        DailyChallengeCache::new(pool("AB"), 3),
        Err(CoreError::InvalidConfiguration(_))
    ));
}

#[test]
fn zero_count_is_an_empty_challenge() {
    assert!(select_letters(date(2025, 3, 14), &pool("ABC"), 0).unwrap().is_empty());
}

#[test]
fn cache_agrees_with_direct_selection_across_threads() {
    let letters = pool("ABCDEFGHIJ");
    let cache = Arc::new(DailyChallengeCache::new(letters.clone(), 4).unwrap());
    let target = date(2025, 8, 1);
    let expected = select_letters(target, &letters, 4).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get_or_select(target).unwrap().letters)
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
    assert_eq!(cache.len(), 1);
}
