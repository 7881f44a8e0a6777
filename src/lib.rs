pub mod attempts;
pub mod challenge;
pub mod classifier;
pub mod confirmation;
pub mod db;
pub mod error;
pub mod leaderboard;
pub mod settings;
pub mod stdio;
mod utils;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use log::info;
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use attempts::AttemptGate;
use challenge::DailyChallengeCache;
use classifier::{ClassifierPort, ScoreDecoder};
use confirmation::SessionRegistry;
use db::Database;
use settings::{Settings, SettingsStore};

pub use error::{CoreError, CoreResult};

/// How often idle confirmation sessions are swept.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Everything the command layer needs, shared for the life of the process.
pub struct AppState {
    pub db: Database,
    pub sessions: SessionRegistry,
    pub challenges: DailyChallengeCache,
    pub gate: AttemptGate<Database>,
    pub settings: SettingsStore,
    pub decoder: ScoreDecoder,
    classifier: Option<Arc<dyn ClassifierPort>>,
}

impl AppState {
    pub fn new(settings: Settings, settings_path: Option<PathBuf>) -> anyhow::Result<Self> {
        settings.validate()?;

        let database = Database::new(settings.db_path.clone())?;
        let challenges = DailyChallengeCache::new(
            settings.challenge.letter_pool.clone(),
            settings.challenge.daily_count,
        )?;
        let decoder = ScoreDecoder::new(settings.classifier.label_classes.clone())?;

        Ok(Self {
            gate: AttemptGate::new(database.clone()),
            db: database,
            sessions: SessionRegistry::new(settings.confirmation_config()),
            challenges,
            decoder,
            settings: SettingsStore::new(settings, settings_path),
            classifier: None,
        })
    }

    /// Attaches the model used for raw landmark frames.
    pub fn with_classifier(mut self, classifier: Arc<dyn ClassifierPort>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn classifier(&self) -> Option<&dyn ClassifierPort> {
        self.classifier.as_deref()
    }
}

/// The calendar day used for challenges and attempts. Days are UTC so every
/// client agrees on when one ends.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn spawn_session_pruner(state: Arc<AppState>, cancel_token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(PRUNE_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let max_idle = state.settings.snapshot().session_idle();
                    state.sessions.prune_idle(max_idle, Utc::now());
                }
                _ = cancel_token.cancelled() => {
                    info!("session pruner shutting down");
                    break;
                }
            }
        }
    })
}

/// Starts the service: logging, settings, storage, then the stdio command
/// loop until stdin closes.
pub async fn run() -> anyhow::Result<()> {
    // RUST_LOG wins; otherwise info.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("ISL gesture core starting up...");

    let settings_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("ISL_SETTINGS").map(PathBuf::from));
    let settings = Settings::load(settings_path.as_deref()).context("failed to load settings")?;

    info!(
        "Hold {}ms at confidence >= {}, {} daily letters from a pool of {}",
        settings.confirmation.hold_ms,
        settings.confirmation.min_confidence,
        settings.challenge.daily_count,
        settings.challenge.letter_pool.len()
    );

    let state = Arc::new(AppState::new(settings, settings_path)?);
    let cancel_token = CancellationToken::new();
    let pruner = spawn_session_pruner(Arc::clone(&state), cancel_token.clone());

    let result = stdio::serve(
        &state,
        tokio::io::BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await;

    info!("stdin closed, shutting down");
    cancel_token.cancel();
    if let Err(err) = pruner.await {
        log::warn!("session pruner task failed: {err}");
    }
    result
}
