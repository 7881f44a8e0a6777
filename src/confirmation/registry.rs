use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, RwLock},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    classifier::{sample_frame, ClassificationSample, ClassifierPort, LandmarkFrame},
    error::{CoreError, CoreResult},
    log_debug, log_info,
};

use super::{
    engine::{ConfirmationConfig, ConfirmationEngine, ConfirmationEvent},
    state::ConfirmationStatus,
};

const ENABLE_LOGS: bool = true;

pub type SessionId = Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub status: ConfirmationStatus,
    pub confirmed_label: Option<String>,
    pub last_seen: DateTime<Utc>,
}

/// Outcome of one observation, with the confirmation answer at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub event: ConfirmationEvent,
    pub confirmed_label: Option<String>,
}

struct SessionEntry {
    engine: ConfirmationEngine,
    last_seen: DateTime<Utc>,
}

/// Owns one confirmation engine per client session.
///
/// Each session sits behind its own lock, so observations for one session are
/// applied in order while other sessions proceed in parallel. The map lock is
/// only held long enough to look up or insert an entry.
pub struct SessionRegistry {
    config: RwLock<ConfirmationConfig>,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<SessionEntry>>>>,
}

fn lock_entry(entry: &Mutex<SessionEntry>) -> MutexGuard<'_, SessionEntry> {
    match entry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl SessionRegistry {
    pub fn new(config: ConfirmationConfig) -> Self {
        Self {
            config: RwLock::new(config),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Config handed to sessions opened from now on. Running sessions keep
    /// the thresholds they started with.
    pub fn set_config(&self, config: ConfirmationConfig) {
        match self.config.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    fn current_config(&self) -> ConfirmationConfig {
        match self.config.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn open(&self, now: DateTime<Utc>) -> SessionId {
        let session_id = Uuid::new_v4();
        let entry = SessionEntry {
            engine: ConfirmationEngine::new(self.current_config()),
            last_seen: now,
        };

        let mut sessions = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions.insert(session_id, Arc::new(Mutex::new(entry)));
        log_info!("Opened confirmation session {session_id} ({} active)", sessions.len());

        session_id
    }

    pub fn close(&self, session_id: SessionId) -> bool {
        let mut sessions = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let removed = sessions.remove(&session_id).is_some();
        if removed {
            log_info!("Closed confirmation session {session_id}");
        }
        removed
    }

    pub fn len(&self) -> usize {
        match self.sessions.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, session_id: SessionId) -> CoreResult<Arc<Mutex<SessionEntry>>> {
        let sessions = match self.sessions.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| CoreError::InvalidInput(format!("unknown session {session_id}")))
    }

    pub fn observe(
        &self,
        session_id: SessionId,
        sample: &ClassificationSample,
        now: DateTime<Utc>,
    ) -> CoreResult<Observation> {
        let entry = self.entry(session_id)?;
        let mut guard = lock_entry(&entry);

        let event = guard.engine.observe(sample, now);
        guard.last_seen = now;

        match &event {
            ConfirmationEvent::Confirmed { label } => {
                log_info!("Session {session_id} confirmed '{label}'");
            }
            other => {
                log_debug!("Session {session_id}: {other:?}");
            }
        }

        Ok(Observation {
            confirmed_label: guard.engine.confirmed_label().map(str::to_string),
            event,
        })
    }

    /// Classifies `frame` and feeds the result to the session's engine.
    ///
    /// The session is checked before the classifier runs, so an unknown
    /// session never costs an inference.
    pub fn observe_frame<C: ClassifierPort + ?Sized>(
        &self,
        session_id: SessionId,
        classifier: &C,
        frame: &LandmarkFrame,
        now: DateTime<Utc>,
    ) -> CoreResult<Observation> {
        self.entry(session_id)?;
        let sample = sample_frame(classifier, frame, now);
        self.observe(session_id, &sample, now)
    }

    pub fn reset(&self, session_id: SessionId, now: DateTime<Utc>) -> CoreResult<()> {
        let entry = self.entry(session_id)?;
        let mut guard = lock_entry(&entry);
        guard.engine.reset();
        guard.last_seen = now;
        Ok(())
    }

    pub fn snapshot(&self, session_id: SessionId) -> CoreResult<SessionSnapshot> {
        let entry = self.entry(session_id)?;
        let guard = lock_entry(&entry);
        Ok(SessionSnapshot {
            session_id,
            status: guard.engine.status(),
            confirmed_label: guard.engine.confirmed_label().map(str::to_string),
            last_seen: guard.last_seen,
        })
    }

    /// Drops sessions not touched within `max_idle` of `now`. Returns how many
    /// were removed.
    pub fn prune_idle(&self, max_idle: Duration, now: DateTime<Utc>) -> usize {
        let max_idle = chrono::Duration::from_std(max_idle).unwrap_or_else(|_| chrono::Duration::max_value());

        let mut sessions = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = sessions.len();
        sessions.retain(|_, entry| now - lock_entry(entry).last_seen <= max_idle);
        let removed = before - sessions.len();

        if removed > 0 {
            log_info!("Pruned {removed} idle confirmation sessions");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn a(ms: i64) -> ClassificationSample {
        ClassificationSample {
            label: Some("A".into()),
            confidence: 0.9,
            observed_at: t(ms),
        }
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(ConfirmationConfig {
            hold: Duration::from_millis(100),
            min_confidence: 0.5,
        })
    }

    #[test]
    fn sessions_do_not_share_state() {
        let registry = registry();
        let first = registry.open(t(0));
        let second = registry.open(t(0));

        registry.observe(first, &a(0), t(0)).unwrap();
        registry.observe(second, &a(90), t(90)).unwrap();
        let done = registry.observe(first, &a(100), t(100)).unwrap();
        let pending = registry.observe(second, &a(100), t(100)).unwrap();

        assert_eq!(done.confirmed_label.as_deref(), Some("A"));
        assert_eq!(pending.confirmed_label, None);
    }

    #[test]
    fn unknown_session_is_invalid_input() {
        let registry = registry();
        let result = registry.observe(Uuid::new_v4(), &a(0), t(0));
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn prune_drops_only_stale_sessions() {
        let registry = registry();
        let stale = registry.open(t(0));
        let fresh = registry.open(t(0));
        registry.observe(fresh, &a(5_000), t(5_000)).unwrap();

        let removed = registry.prune_idle(Duration::from_secs(2), t(6_000));
        assert_eq!(removed, 1);
        assert!(registry.snapshot(stale).is_err());
        assert!(registry.snapshot(fresh).is_ok());
    }

    #[test]
    fn new_config_applies_to_new_sessions_only() {
        let registry = registry();
        let old = registry.open(t(0));
        registry.set_config(ConfirmationConfig {
            hold: Duration::from_millis(500),
            min_confidence: 0.5,
        });
        let new = registry.open(t(0));

        for session in [old, new] {
            registry.observe(session, &a(0), t(0)).unwrap();
        }
        assert!(registry.observe(old, &a(200), t(200)).unwrap().confirmed_label.is_some());
        assert!(registry.observe(new, &a(200), t(200)).unwrap().confirmed_label.is_none());
    }
}
