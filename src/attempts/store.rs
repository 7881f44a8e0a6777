use std::{
    collections::HashMap,
    future::Future,
    sync::{Mutex, MutexGuard},
};

use chrono::NaiveDate;

use crate::{
    db::{AttemptRecord, Database, InsertOutcome},
    error::{CoreError, CoreResult},
};

/// Persistence the attempt gate relies on.
///
/// `insert_if_absent` must be atomic per `(user_id, date)`: two concurrent
/// calls for the same key may not both return [`InsertOutcome::Inserted`].
pub trait AttemptStore: Send + Sync {
    fn insert_if_absent(
        &self,
        record: AttemptRecord,
    ) -> impl Future<Output = CoreResult<InsertOutcome>> + Send;

    fn exists(&self, user_id: &str, date: NaiveDate) -> impl Future<Output = CoreResult<bool>> + Send;

    fn attempts_for_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = CoreResult<Vec<AttemptRecord>>> + Send;

    fn attempts_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = CoreResult<Vec<AttemptRecord>>> + Send;
}

fn unavailable(err: anyhow::Error) -> CoreError {
    CoreError::StoreUnavailable(format!("{err:#}"))
}

impl AttemptStore for Database {
    fn insert_if_absent(
        &self,
        record: AttemptRecord,
    ) -> impl Future<Output = CoreResult<InsertOutcome>> + Send {
        async move { self.insert_attempt_if_absent(&record).await.map_err(unavailable) }
    }

    fn exists(&self, user_id: &str, date: NaiveDate) -> impl Future<Output = CoreResult<bool>> + Send {
        async move { self.attempt_exists(user_id, date).await.map_err(unavailable) }
    }

    fn attempts_for_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = CoreResult<Vec<AttemptRecord>>> + Send {
        async move { self.get_attempts_for_user(user_id).await.map_err(unavailable) }
    }

    fn attempts_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = CoreResult<Vec<AttemptRecord>>> + Send {
        async move { self.get_attempts_between(from, to).await.map_err(unavailable) }
    }
}

/// In-process store. The existence check and the insert happen under one
/// lock, which is what makes the pair atomic.
#[derive(Default)]
pub struct MemoryAttemptStore {
    records: Mutex<HashMap<(String, NaiveDate), AttemptRecord>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<(String, NaiveDate), AttemptRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn collect<P>(&self, mut keep: P) -> Vec<AttemptRecord>
    where
        P: FnMut(&AttemptRecord) -> bool,
    {
        let mut found: Vec<AttemptRecord> = self
            .records()
            .values()
            .filter(|record| keep(record))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.date.cmp(&b.date).then(a.submitted_at.cmp(&b.submitted_at)));
        found
    }
}

impl AttemptStore for MemoryAttemptStore {
    fn insert_if_absent(
        &self,
        record: AttemptRecord,
    ) -> impl Future<Output = CoreResult<InsertOutcome>> + Send {
        let key = (record.user_id.clone(), record.date);
        let outcome = match self.records().entry(key) {
            std::collections::hash_map::Entry::Occupied(_) => InsertOutcome::AlreadyExists,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(record);
                InsertOutcome::Inserted
            }
        };
        std::future::ready(Ok(outcome))
    }

    fn exists(&self, user_id: &str, date: NaiveDate) -> impl Future<Output = CoreResult<bool>> + Send {
        let found = self.records().contains_key(&(user_id.to_string(), date));
        std::future::ready(Ok(found))
    }

    fn attempts_for_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = CoreResult<Vec<AttemptRecord>>> + Send {
        let mut found = self.collect(|record| record.user_id == user_id);
        found.reverse();
        std::future::ready(Ok(found))
    }

    fn attempts_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = CoreResult<Vec<AttemptRecord>>> + Send {
        std::future::ready(Ok(self.collect(|record| record.date >= from && record.date <= to)))
    }
}
