pub mod cache;
pub mod commands;
pub mod selector;

pub use cache::DailyChallengeCache;
pub use selector::{daily_challenge, select_letters, seed_for, DailyChallenge};
