use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::RwLock,
    time::Duration,
};

use crate::{
    challenge::select_letters,
    confirmation::ConfirmationConfig,
    error::{CoreError, CoreResult},
};

/// Hold used when `ISL_DEBUG` is set, so a tester doesn't stand still for seconds.
const DEBUG_HOLD_MS: u64 = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfirmationSettings {
    pub hold_ms: u64,
    pub min_confidence: f32,
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        Self {
            hold_ms: 3_000,
            min_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Landmark values per frame: 42 (x,y single hand), 63 (x,y,z single hand)
    /// or 84 (x,y two hands) depending on how the model was trained.
    pub feature_len: usize,
    /// Zero-pad frames shorter than `feature_len` instead of rejecting them.
    pub pad_short_frames: bool,
    pub label_classes: Vec<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            feature_len: 63,
            pad_short_frames: false,
            label_classes: ('A'..='Z').map(String::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChallengeSettings {
    pub letter_pool: Vec<String>,
    pub daily_count: usize,
}

impl Default for ChallengeSettings {
    fn default() -> Self {
        Self {
            letter_pool: vec!["A".into(), "B".into(), "C".into()],
            daily_count: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub confirmation: ConfirmationSettings,
    pub classifier: ClassifierSettings,
    pub challenge: ChallengeSettings,
    pub db_path: PathBuf,
    /// Sessions untouched for this long are dropped by the registry.
    pub session_idle_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confirmation: ConfirmationSettings::default(),
            classifier: ClassifierSettings::default(),
            challenge: ChallengeSettings::default(),
            db_path: PathBuf::from("isl.sqlite3"),
            session_idle_secs: 15 * 60,
        }
    }
}

impl Settings {
    /// Reads `path` when it exists, applies `ISL_*` environment overrides and
    /// validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings from {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse settings in {}", path.display()))?
            }
            Some(path) => {
                info!("No settings file at {}, using defaults", path.display());
                Settings::default()
            }
            None => Settings::default(),
        };

        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(hold_ms) = env_override("ISL_HOLD_MS") {
            self.confirmation.hold_ms = hold_ms;
        }
        if let Some(min_confidence) = env_override("ISL_MIN_CONFIDENCE") {
            self.confirmation.min_confidence = min_confidence;
        }
        if let Some(feature_len) = env_override("ISL_FEATURE_LEN") {
            self.classifier.feature_len = feature_len;
        }
        if let Ok(db_path) = env::var("ISL_DB_PATH") {
            self.db_path = PathBuf::from(db_path);
        }

        let debug_mode = env::var("ISL_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            info!("ISL_DEBUG set, hold shortened to {DEBUG_HOLD_MS}ms");
            self.confirmation.hold_ms = DEBUG_HOLD_MS;
        }
    }

    /// Rejects settings the core cannot run with. Fatal at startup.
    pub fn validate(&self) -> CoreResult<()> {
        let min_confidence = self.confirmation.min_confidence;
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(CoreError::InvalidConfiguration(format!(
                "min_confidence must be within [0, 1], got {min_confidence}"
            )));
        }
        if self.classifier.feature_len == 0 {
            return Err(CoreError::InvalidConfiguration(
                "feature_len must be greater than zero".into(),
            ));
        }
        if self.classifier.label_classes.is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "label_classes must not be empty".into(),
            ));
        }

        // Dry run against an arbitrary date: the pool/count pair either works
        // for every date or for none.
        select_letters(
            chrono::NaiveDate::MIN,
            &self.challenge.letter_pool,
            self.challenge.daily_count,
        )?;

        Ok(())
    }

    pub fn confirmation_config(&self) -> ConfirmationConfig {
        ConfirmationConfig {
            hold: Duration::from_millis(self.confirmation.hold_ms),
            min_confidence: self.confirmation.min_confidence,
        }
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

fn env_override<T: FromStr>(key: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => {
            info!("{key} overrides settings file: {raw}");
            Some(value)
        }
        Err(err) => {
            warn!("Ignoring invalid {key} value '{raw}': {err}");
            None
        }
    }
}

/// Settings shared across the running process, persisted back on update.
pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(settings: Settings, path: Option<PathBuf>) -> Self {
        Self {
            path,
            data: RwLock::new(settings),
        }
    }

    pub fn snapshot(&self) -> Settings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swaps in the confirmation thresholds. Only sessions opened afterwards
    /// pick them up.
    pub fn update_confirmation(&self, confirmation: ConfirmationSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut next = guard.clone();
        next.confirmation = confirmation;
        next.validate()?;
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn more_daily_letters_than_pool_is_rejected() {
        let mut settings = Settings::default();
        settings.challenge.daily_count = 4;
        assert!(matches!(
            settings.validate(),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "confirmation": { "hold_ms": 5000 } }"#).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.confirmation.min_confidence, 0.5);
        assert_eq!(settings.challenge.daily_count, 3);
        assert_eq!(settings.classifier.label_classes.len(), 26);
    }

    #[test]
    fn update_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(Settings::default(), Some(path.clone()));

        store
            .update_confirmation(ConfirmationSettings {
                hold_ms: 5_000,
                min_confidence: 0.7,
            })
            .unwrap();

        let reloaded: Settings =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reloaded.confirmation.hold_ms, 5_000);
        assert_eq!(store.snapshot().confirmation.min_confidence, 0.7);
    }

    #[test]
    fn invalid_update_keeps_previous_values() {
        let store = SettingsStore::new(Settings::default(), None);
        let result = store.update_confirmation(ConfirmationSettings {
            hold_ms: 1_000,
            min_confidence: 1.5,
        });
        assert!(result.is_err());
        assert_eq!(store.snapshot().confirmation.hold_ms, 3_000);
    }
}
