use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{AttemptRecord, InsertOutcome},
    error::{CoreError, CoreResult},
    log_info, log_warn,
};

use super::{profile::ProfileStats, store::AttemptStore};

const ENABLE_LOGS: bool = true;

/// A player's scored run at the daily challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub date: NaiveDate,
    pub score: u32,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    AlreadySubmitted,
}

impl RejectReason {
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::AlreadySubmitted => "already submitted for this day",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(AttemptRecord),
    Rejected(RejectReason),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

/// Allows one scored attempt per user per day.
pub struct AttemptGate<S> {
    store: S,
}

impl<S: AttemptStore> AttemptGate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records `submission` unless the user already has an attempt for that
    /// day. This is the authoritative check; [`AttemptGate::can_submit`] is
    /// only a hint.
    pub async fn try_submit(
        &self,
        submission: Submission,
        submitted_at: DateTime<Utc>,
    ) -> CoreResult<SubmitOutcome> {
        validate(&submission, submitted_at)?;

        let record = AttemptRecord {
            id: Uuid::new_v4(),
            user_id: submission.user_id.trim().to_string(),
            display_name: submission.display_name,
            date: submission.date,
            score: submission.score,
            duration_ms: submission.duration_ms,
            submitted_at,
        };

        let user_id = record.user_id.clone();
        let date = record.date;

        match self.store.insert_if_absent(record.clone()).await {
            Ok(InsertOutcome::Inserted) => {
                log_info!(
                    "Accepted attempt {} for {user_id} on {date} (score {})",
                    record.id,
                    record.score
                );
                Ok(SubmitOutcome::Accepted(record))
            }
            Ok(InsertOutcome::AlreadyExists) => {
                log_info!("Rejected duplicate attempt for {user_id} on {date}");
                Ok(SubmitOutcome::Rejected(RejectReason::AlreadySubmitted))
            }
            Err(err) => {
                log_warn!("Attempt store failed for {user_id} on {date}: {err}");
                Err(err)
            }
        }
    }

    /// Whether `user_id` has no attempt for `date` yet. Read-only.
    pub async fn can_submit(&self, user_id: &str, date: NaiveDate) -> CoreResult<bool> {
        let user_id = normalized_user(user_id)?;
        Ok(!self.store.exists(user_id, date).await?)
    }

    pub async fn history(&self, user_id: &str) -> CoreResult<Vec<AttemptRecord>> {
        let user_id = normalized_user(user_id)?;
        self.store.attempts_for_user(user_id).await
    }

    /// Score summary, badges and latest games for `user_id`.
    pub async fn profile(&self, user_id: &str) -> CoreResult<ProfileStats> {
        let user_id = normalized_user(user_id)?;
        let records = self.store.attempts_for_user(user_id).await?;
        Ok(ProfileStats::from_attempts(user_id, records))
    }

    pub async fn attempts_between(&self, from: NaiveDate, to: NaiveDate) -> CoreResult<Vec<AttemptRecord>> {
        if from > to {
            return Err(CoreError::InvalidInput(format!(
                "range start {from} is after end {to}"
            )));
        }
        self.store.attempts_between(from, to).await
    }
}

fn normalized_user(user_id: &str) -> CoreResult<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput("user_id must not be empty".into()));
    }
    Ok(trimmed)
}

fn validate(submission: &Submission, submitted_at: DateTime<Utc>) -> CoreResult<()> {
    normalized_user(&submission.user_id)?;
    if submission.date > submitted_at.date_naive() {
        return Err(CoreError::InvalidInput(format!(
            "cannot submit for {} before that day has started",
            submission.date
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempts::MemoryAttemptStore;
    use chrono::TimeZone;
    use std::{
        future::Future,
        sync::atomic::{AtomicBool, Ordering},
    };

    /// Memory store that fails every call while `down` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryAttemptStore,
        down: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> CoreResult<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(CoreError::StoreUnavailable("connection refused".into()));
            }
            Ok(())
        }
    }

    impl AttemptStore for FlakyStore {
        fn insert_if_absent(
            &self,
            record: AttemptRecord,
        ) -> impl Future<Output = CoreResult<InsertOutcome>> + Send {
            async move {
                self.check()?;
                self.inner.insert_if_absent(record).await
            }
        }

        fn exists(&self, user_id: &str, date: NaiveDate) -> impl Future<Output = CoreResult<bool>> + Send {
            async move {
                self.check()?;
                self.inner.exists(user_id, date).await
            }
        }

        fn attempts_for_user(
            &self,
            user_id: &str,
        ) -> impl Future<Output = CoreResult<Vec<AttemptRecord>>> + Send {
            async move {
                self.check()?;
                self.inner.attempts_for_user(user_id).await
            }
        }

        fn attempts_between(
            &self,
            from: NaiveDate,
            to: NaiveDate,
        ) -> impl Future<Output = CoreResult<Vec<AttemptRecord>>> + Send {
            async move {
                self.check()?;
                self.inner.attempts_between(from, to).await
            }
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap()
    }

    fn submission(user: &str, day: u32, score: u32) -> Submission {
        Submission {
            user_id: user.into(),
            display_name: None,
            date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            score,
            duration_ms: 1_000,
        }
    }

    #[tokio::test]
    async fn second_submission_same_day_is_rejected() {
        let gate = AttemptGate::new(MemoryAttemptStore::new());
        let first = gate.try_submit(submission("u1", 3, 2), at(3)).await.unwrap();
        let second = gate.try_submit(submission("u1", 3, 3), at(3)).await.unwrap();

        assert!(first.is_accepted());
        assert_eq!(second, SubmitOutcome::Rejected(RejectReason::AlreadySubmitted));
        assert_eq!(gate.history("u1").await.unwrap()[0].score, 2);
    }

    #[tokio::test]
    async fn next_day_is_a_fresh_attempt() {
        let gate = AttemptGate::new(MemoryAttemptStore::new());
        assert!(gate.try_submit(submission("u1", 3, 1), at(3)).await.unwrap().is_accepted());
        assert!(gate.try_submit(submission("u1", 4, 1), at(4)).await.unwrap().is_accepted());
        assert!(gate.try_submit(submission("u2", 4, 1), at(4)).await.unwrap().is_accepted());
    }

    #[tokio::test]
    async fn can_submit_is_read_only() {
        let gate = AttemptGate::new(MemoryAttemptStore::new());
        let date = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
        assert!(gate.can_submit("u1", date).await.unwrap());
        assert!(gate.can_submit("u1", date).await.unwrap());

        gate.try_submit(submission("u1", 3, 1), at(3)).await.unwrap();
        assert!(!gate.can_submit("u1", date).await.unwrap());
    }

    #[tokio::test]
    async fn blank_user_is_invalid_input() {
        let gate = AttemptGate::new(MemoryAttemptStore::new());
        let result = gate.try_submit(submission("  ", 3, 1), at(3)).await;
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn future_day_is_invalid_input() {
        let gate = AttemptGate::new(MemoryAttemptStore::new());
        let result = gate.try_submit(submission("u1", 9, 1), at(3)).await;
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
        assert!(gate.history("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn user_ids_are_trimmed_before_keying() {
        let gate = AttemptGate::new(MemoryAttemptStore::new());
        gate.try_submit(submission("u1", 3, 1), at(3)).await.unwrap();
        let again = gate.try_submit(submission(" u1 ", 3, 1), at(3)).await.unwrap();
        assert!(!again.is_accepted());
    }

    #[tokio::test]
    async fn store_outage_is_retryable_and_records_nothing() {
        let gate = AttemptGate::new(FlakyStore::default());
        gate.store().down.store(true, Ordering::SeqCst);

        let err = gate.try_submit(submission("u1", 3, 2), at(3)).await.unwrap_err();
        assert!(matches!(err, CoreError::StoreUnavailable(_)));
        assert!(err.is_retryable());

        let date = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
        let err = gate.can_submit("u1", date).await.unwrap_err();
        assert!(matches!(err, CoreError::StoreUnavailable(_)));
        assert!(matches!(gate.profile("u1").await, Err(CoreError::StoreUnavailable(_))));

        gate.store().down.store(false, Ordering::SeqCst);
        assert!(gate.history("u1").await.unwrap().is_empty());
        assert!(gate.can_submit("u1", date).await.unwrap());
        assert!(gate.try_submit(submission("u1", 3, 2), at(3)).await.unwrap().is_accepted());
    }

    #[test]
    fn invalid_input_is_not_retryable() {
        assert!(!CoreError::InvalidInput("blank".into()).is_retryable());
    }

    #[tokio::test]
    async fn profile_summarizes_history() {
        let gate = AttemptGate::new(MemoryAttemptStore::new());
        for (day, score) in [(3, 12), (4, 4), (5, 2)] {
            gate.try_submit(submission("u1", day, score), at(day)).await.unwrap();
        }

        let profile = gate.profile(" u1 ").await.unwrap();
        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.total_games, 3);
        assert_eq!(profile.highest_score, 12);
        assert_eq!(profile.average_score, 6.0);
        assert_eq!(
            profile.badges,
            vec![crate::attempts::Badge::TopScorer, crate::attempts::Badge::ConsistentPlayer]
        );
        assert_eq!(profile.recent[0].date, NaiveDate::from_ymd_opt(2025, 5, 5).unwrap());
    }
}
