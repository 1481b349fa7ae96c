use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    audio::{AmbientLoop, AmbientSound, CueEmitter},
    models::{CompletionRecord, ExerciseKind, SessionSummary},
    report::CompletionReporter,
};

use super::{
    pattern::{breathing_pattern, relaxation_pattern, Phase, DEFAULT_BREATHING_PATTERN},
    Program, SessionState, TickEvent, TimerStatus,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

/// What the user picked before pressing start.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSelection {
    pub kind: ExerciseKind,
    pub pattern_key: Option<String>,
    pub minutes: Option<u32>,
    pub ambient: AmbientSound,
    pub volume: f32,
}

impl SessionSelection {
    pub fn breathing(pattern_key: &str) -> Self {
        Self {
            kind: ExerciseKind::Breathing,
            pattern_key: Some(pattern_key.to_string()),
            minutes: None,
            ambient: AmbientSound::None,
            volume: 0.3,
        }
    }

    pub fn meditation(minutes: u32, ambient: AmbientSound, volume: f32) -> Self {
        Self {
            kind: ExerciseKind::Meditation,
            pattern_key: None,
            minutes: Some(minutes),
            ambient,
            volume,
        }
    }

    pub fn relaxation() -> Self {
        Self {
            kind: ExerciseKind::Relaxation,
            pattern_key: None,
            minutes: None,
            ambient: AmbientSound::None,
            volume: 0.3,
        }
    }

    fn program(&self) -> Result<Program> {
        match self.kind {
            ExerciseKind::Breathing => {
                let key = self
                    .pattern_key
                    .as_deref()
                    .unwrap_or(DEFAULT_BREATHING_PATTERN);
                Ok(Program::Phased(breathing_pattern(key)?))
            }
            ExerciseKind::Meditation => match self.minutes {
                Some(minutes) if minutes > 0 => Ok(Program::Countdown {
                    total_secs: u64::from(minutes) * 60,
                }),
                _ => bail!("meditation needs a duration of at least one minute"),
            },
            ExerciseKind::Relaxation => Ok(Program::Phased(relaxation_pattern()?)),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "type")]
pub enum SessionEvent {
    Started {
        session_id: String,
        kind: ExerciseKind,
    },
    PhaseChanged {
        index: usize,
        phase: Phase,
        seconds: u64,
    },
    Tick {
        remaining_secs: u64,
        elapsed_secs: u64,
    },
    Paused,
    Resumed,
    Completed {
        session_id: String,
        elapsed_secs: u64,
    },
    Reset {
        elapsed_secs: u64,
        reported: bool,
    },
    ReportFailed {
        session_id: String,
        message: String,
        unauthorized: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub session_id: Option<String>,
    pub kind: Option<ExerciseKind>,
    pub state: SessionState,
    pub phase: Option<Phase>,
    pub muted: bool,
}

struct ActiveSession {
    id: String,
    selection: SessionSelection,
    program: Program,
    state: SessionState,
    started_at: DateTime<Utc>,
    ambient: Option<AmbientLoop>,
    reported: bool,
}

impl ActiveSession {
    fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            kind: self.selection.kind,
            pattern_key: match &self.program {
                Program::Phased(pattern) => Some(pattern.key.clone()),
                Program::Countdown { .. } => None,
            },
            target_minutes: self.selection.minutes,
            elapsed_secs: self.state.elapsed_secs,
            started_at: self.started_at,
        }
    }

    fn wants_ambient(&self) -> bool {
        self.state.is_running() && self.selection.ambient != AmbientSound::None
    }
}

#[derive(Default)]
struct Inner {
    session: Option<ActiveSession>,
    /// Bumped whenever a ticker is started or stopped; ticks carrying an older
    /// value are dropped.
    epoch: u64,
    ticker: Option<(JoinHandle<()>, CancellationToken)>,
}

impl Inner {
    fn stop_ticker(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if let Some((handle, token)) = self.ticker.take() {
            token.cancel();
            handle.abort();
        }
    }
}

// Last controller handle gone: stop the clock. The session, and with it any
// ambient loop, is dropped right after.
impl Drop for Inner {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

/// Owns at most one guided session and the clock that drives it.
///
/// Clones share the session. Dropping the last clone stops the clock and
/// releases audio without reporting; call [`TimerController::shutdown`] first
/// to apply the abandonment rule.
#[derive(Clone)]
pub struct TimerController {
    inner: Arc<Mutex<Inner>>,
    cues: Arc<CueEmitter>,
    reporter: CompletionReporter,
    events: broadcast::Sender<SessionEvent>,
    tick_interval: Duration,
}

impl TimerController {
    pub fn new(cues: CueEmitter, reporter: CompletionReporter, tick_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            cues: Arc::new(cues),
            reporter,
            events,
            tick_interval,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let guard = self.inner.lock().await;
        self.snapshot_of(&guard)
    }

    pub async fn start(&self, selection: SessionSelection) -> Result<TimerSnapshot> {
        let program = selection.program()?;

        let mut guard = self.inner.lock().await;
        if let Some(session) = &guard.session {
            if matches!(
                session.state.status,
                TimerStatus::Running | TimerStatus::Paused
            ) {
                bail!("a session is already active");
            }
        }
        guard.stop_ticker();

        let session_id = Uuid::new_v4().to_string();
        let state = SessionState::start(&program);
        let mut session = ActiveSession {
            id: session_id.clone(),
            selection,
            program,
            state,
            started_at: Utc::now(),
            ambient: None,
            reported: false,
        };

        log_info!(
            "Starting {} session {}",
            session.selection.kind.as_str(),
            session_id
        );
        self.emit(SessionEvent::Started {
            session_id,
            kind: session.selection.kind,
        });

        if let Some(phase) = session.program.phase_at(state.phase_index) {
            self.cues.phase_cue(phase);
            self.emit(SessionEvent::PhaseChanged {
                index: state.phase_index,
                phase,
                seconds: state.remaining_secs,
            });
        }
        if session.wants_ambient() {
            session.ambient = self
                .cues
                .start_ambient(session.selection.ambient, session.selection.volume);
        }

        guard.session = Some(session);
        self.spawn_ticker(&mut guard);
        Ok(self.snapshot_of(&guard))
    }

    pub async fn pause(&self) -> Result<TimerSnapshot> {
        let mut guard = self.inner.lock().await;
        let session = guard
            .session
            .as_mut()
            .ok_or_else(|| anyhow!("no active session to pause"))?;
        if session.state.status != TimerStatus::Running {
            bail!("session is not running");
        }
        session.state = session.state.pause();
        session.ambient = None;
        guard.stop_ticker();

        log_debug!("Session paused");
        self.emit(SessionEvent::Paused);
        Ok(self.snapshot_of(&guard))
    }

    pub async fn resume(&self) -> Result<TimerSnapshot> {
        let mut guard = self.inner.lock().await;
        let session = guard
            .session
            .as_mut()
            .ok_or_else(|| anyhow!("no session to resume"))?;
        if session.state.status != TimerStatus::Paused {
            bail!("session is not paused");
        }
        session.state = session.state.resume();
        if session.wants_ambient() {
            session.ambient = self
                .cues
                .start_ambient(session.selection.ambient, session.selection.volume);
        }
        self.spawn_ticker(&mut guard);

        log_debug!("Session resumed");
        self.emit(SessionEvent::Resumed);
        Ok(self.snapshot_of(&guard))
    }

    /// Jump to the next routine step.
    pub async fn skip(&self) -> Result<TimerSnapshot> {
        let mut guard = self.inner.lock().await;
        let session = guard
            .session
            .as_mut()
            .ok_or_else(|| anyhow!("no active session to skip"))?;
        let tick = session.state.skip(&session.program);
        session.state = tick.state;
        if let Some(TickEvent::PhaseChanged {
            index,
            phase,
            seconds,
        }) = tick.event
        {
            self.cues.phase_cue(phase);
            self.emit(SessionEvent::PhaseChanged {
                index,
                phase,
                seconds,
            });
        }
        Ok(self.snapshot_of(&guard))
    }

    /// Stop the clock and return to the first phase. Abandoned sessions past
    /// the threshold are reported; the returned record is what was sent.
    pub async fn reset(&self) -> Result<Option<CompletionRecord>> {
        let mut guard = self.inner.lock().await;
        guard.stop_ticker();
        let Some(session) = guard.session.as_mut() else {
            return Ok(None);
        };

        let record = self.abandon(session);
        let (idle, elapsed_secs) = session.state.reset(&session.program);
        session.state = idle;
        session.reported = false;

        self.emit(SessionEvent::Reset {
            elapsed_secs,
            reported: record.is_some(),
        });
        Ok(record)
    }

    /// Discard the session entirely, as when the user navigates away.
    pub async fn shutdown(&self) -> Option<CompletionRecord> {
        let mut guard = self.inner.lock().await;
        guard.stop_ticker();
        let mut session = guard.session.take()?;
        self.abandon(&mut session)
    }

    pub async fn set_muted(&self, muted: bool) -> TimerSnapshot {
        let mut guard = self.inner.lock().await;
        self.cues.set_muted(muted);
        if let Some(session) = guard.session.as_mut() {
            if muted {
                session.ambient = None;
            } else if session.ambient.is_none() && session.wants_ambient() {
                session.ambient = self
                    .cues
                    .start_ambient(session.selection.ambient, session.selection.volume);
            }
        }
        self.snapshot_of(&guard)
    }

    pub async fn set_volume(&self, volume: f32) {
        let mut guard = self.inner.lock().await;
        if let Some(session) = guard.session.as_mut() {
            session.selection.volume = volume;
        }
        self.cues.set_volume(volume);
    }

    /// Releases audio and reports if the session counts as abandoned.
    fn abandon(&self, session: &mut ActiveSession) -> Option<CompletionRecord> {
        session.ambient = None;
        if session.reported || session.state.status == TimerStatus::Complete {
            return None;
        }
        let Some(record) = self.reporter.abandonment(&session.summary()) else {
            log_debug!(
                "Session {} stopped within {}s, not reported",
                session.id,
                self.reporter.abandon_threshold_secs()
            );
            return None;
        };
        session.reported = true;
        log_info!(
            "Reporting abandoned session {} after {}s",
            session.id,
            session.state.elapsed_secs
        );
        self.report(record.clone());
        Some(record)
    }

    fn report(&self, record: CompletionRecord) {
        let session_id = record.session_id.clone();
        let handle = self.reporter.submit(record);
        let events = self.events.clone();
        tokio::spawn(async move {
            let failure = match handle.await {
                Ok(Ok(())) => return,
                Ok(Err(e)) => e,
                Err(join) => {
                    log_warn!("Report task for {} did not finish: {}", session_id, join);
                    return;
                }
            };
            let _ = events.send(SessionEvent::ReportFailed {
                session_id,
                unauthorized: failure.is_unauthorized(),
                message: failure.to_string(),
            });
        });
    }

    fn spawn_ticker(&self, inner: &mut Inner) {
        inner.stop_ticker();
        let epoch = inner.epoch;
        let token = CancellationToken::new();
        let token_clone = token.clone();
        // The ticker must not keep the session alive on its own.
        let weak = Arc::downgrade(&self.inner);
        let cues = Arc::clone(&self.cues);
        let reporter = self.reporter.clone();
        let events = self.events.clone();
        let period = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let Some(inner) = weak.upgrade() else {
                            break;
                        };
                        let controller = TimerController {
                            inner,
                            cues: Arc::clone(&cues),
                            reporter: reporter.clone(),
                            events: events.clone(),
                            tick_interval: period,
                        };
                        if !controller.on_tick(epoch).await {
                            break;
                        }
                    }
                    _ = token_clone.cancelled() => break,
                }
            }
        });

        inner.ticker = Some((handle, token));
    }

    /// Apply one clock tick. Returns whether the clock should keep running.
    async fn on_tick(&self, epoch: u64) -> bool {
        let mut guard = self.inner.lock().await;
        if guard.epoch != epoch {
            return false;
        }
        let Some(session) = guard.session.as_mut() else {
            return false;
        };
        if !session.state.is_running() {
            return false;
        }

        let tick = session.state.tick(&session.program);
        session.state = tick.state;
        self.emit(SessionEvent::Tick {
            remaining_secs: tick.state.remaining_secs,
            elapsed_secs: tick.state.elapsed_secs,
        });

        match tick.event {
            None => true,
            Some(TickEvent::PhaseChanged {
                index,
                phase,
                seconds,
            }) => {
                self.cues.phase_cue(phase);
                self.emit(SessionEvent::PhaseChanged {
                    index,
                    phase,
                    seconds,
                });
                true
            }
            Some(TickEvent::Completed) => {
                session.ambient = None;
                self.cues.completion_chime();
                let elapsed_secs = session.state.elapsed_secs;
                let session_id = session.id.clone();
                if !session.reported {
                    session.reported = true;
                    self.report(self.reporter.completion(&session.summary()));
                }
                log_info!("Session {} complete after {}s", session_id, elapsed_secs);
                self.emit(SessionEvent::Completed {
                    session_id,
                    elapsed_secs,
                });
                false
            }
        }
    }

    fn snapshot_of(&self, inner: &Inner) -> TimerSnapshot {
        match &inner.session {
            Some(session) => TimerSnapshot {
                session_id: Some(session.id.clone()),
                kind: Some(session.selection.kind),
                state: session.state,
                phase: session.program.phase_at(session.state.phase_index),
                muted: self.cues.is_muted(),
            },
            None => TimerSnapshot {
                session_id: None,
                kind: None,
                state: SessionState::default(),
                phase: None,
                muted: self.cues.is_muted(),
            },
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
