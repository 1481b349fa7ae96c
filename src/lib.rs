pub mod api;
pub mod audio;
pub mod error;
pub mod models;
pub mod report;
pub mod settings;
pub mod timer;
pub mod utils;
pub mod voice;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::info;

use api::{ApiClient, ChatReply};
use audio::{AudioOutput, CueEmitter};
use report::{CompletionReporter, CompletionSink, LogSink};
use settings::{Settings, SettingsStore};
use timer::{SessionSelection, TimerController};
use voice::{ChatBackend, SpeechSynthesizer};

pub use error::{Error, ValidationError};

/// Everything a front end needs to drive sessions.
pub struct AppState {
    pub timer: TimerController,
    pub settings: SettingsStore,
    pub api: Option<ApiClient>,
}

impl AppState {
    /// Wire the timer to `output` and to the API named in the settings, or to
    /// the log when there is none.
    pub fn new(settings: SettingsStore, output: Arc<dyn AudioOutput>) -> Result<Self> {
        let mut current = settings.get();
        current.apply_env();
        info!("Using settings from {}", settings.path().display());

        let api = match current.api_base_url.as_deref() {
            Some(url) => Some(ApiClient::new(url)?),
            None => None,
        };
        let sink: Arc<dyn CompletionSink> = match &api {
            Some(client) => {
                info!("Reporting sessions to {}", client.base_url());
                Arc::new(client.clone())
            }
            None => {
                info!("No API configured, sessions are only logged");
                Arc::new(LogSink)
            }
        };

        let timer = build_timer(&current, output, sink);
        Ok(Self {
            timer,
            settings,
            api,
        })
    }

    /// Default selection for `kind` using the stored preferences.
    pub fn selection(&self, kind: models::ExerciseKind) -> SessionSelection {
        selection_from(&self.settings.get(), kind)
    }

    /// Send a spoken message to the companion and read the answer aloud in
    /// the stored voice.
    pub async fn converse<S>(&self, synth: &S, transcript: &str) -> Result<ChatReply>
    where
        S: SpeechSynthesizer + ?Sized,
    {
        let chat = self
            .api
            .as_ref()
            .ok_or_else(|| anyhow!("chat needs an API base URL"))?;
        self.converse_with(chat, synth, transcript).await
    }

    async fn converse_with<C, S>(&self, chat: &C, synth: &S, transcript: &str) -> Result<ChatReply>
    where
        C: ChatBackend + ?Sized,
        S: SpeechSynthesizer + ?Sized,
    {
        let preference = self.settings.get().voice;
        Ok(voice::converse(chat, synth, transcript, preference).await?)
    }
}

pub fn build_timer(
    settings: &Settings,
    output: Arc<dyn AudioOutput>,
    sink: Arc<dyn CompletionSink>,
) -> TimerController {
    output.set_volume(settings.volume).ok();
    let cues = CueEmitter::new(output, settings.cue_frequencies, settings.muted);
    let reporter = CompletionReporter::new(sink, settings.abandon_threshold_secs);
    TimerController::new(cues, reporter, settings.tick_interval())
}

pub fn selection_from(settings: &Settings, kind: models::ExerciseKind) -> SessionSelection {
    match kind {
        models::ExerciseKind::Breathing => {
            SessionSelection::breathing(&settings.breathing_pattern)
        }
        models::ExerciseKind::Meditation => SessionSelection::meditation(
            settings.meditation_minutes,
            settings.ambient_sound,
            settings.volume,
        ),
        models::ExerciseKind::Relaxation => SessionSelection::relaxation(),
    }
}
