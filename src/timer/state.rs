use serde::{Deserialize, Serialize};

use super::pattern::{Pattern, Phase};
use super::sequencer::{self, Transition};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Complete,
}

/// What a session counts down through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Program {
    Phased(Pattern),
    /// A single countdown with no phase cycling.
    Countdown { total_secs: u64 },
}

impl Program {
    fn initial(&self) -> (usize, u64) {
        match self {
            Program::Phased(pattern) => {
                let index = sequencer::first_active(pattern);
                let seconds = pattern.get(index).map(|s| s.seconds).unwrap_or(0);
                (index, u64::from(seconds))
            }
            Program::Countdown { total_secs } => (0, *total_secs),
        }
    }

    pub fn phase_at(&self, index: usize) -> Option<Phase> {
        match self {
            Program::Phased(pattern) => pattern.get(index).map(|s| s.phase),
            Program::Countdown { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TickEvent {
    PhaseChanged {
        index: usize,
        phase: Phase,
        seconds: u64,
    },
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub state: SessionState,
    pub event: Option<TickEvent>,
}

impl Tick {
    fn quiet(state: SessionState) -> Self {
        Self { state, event: None }
    }
}

/// Snapshot of a session at one instant. Every operation returns a new value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub status: TimerStatus,
    pub phase_index: usize,
    pub remaining_secs: u64,
    pub elapsed_secs: u64,
}

impl SessionState {
    pub fn idle(program: &Program) -> Self {
        let (phase_index, remaining_secs) = program.initial();
        Self {
            status: TimerStatus::Idle,
            phase_index,
            remaining_secs,
            elapsed_secs: 0,
        }
    }

    pub fn start(program: &Program) -> Self {
        Self {
            status: TimerStatus::Running,
            ..Self::idle(program)
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn pause(self) -> Self {
        match self.status {
            TimerStatus::Running => Self {
                status: TimerStatus::Paused,
                ..self
            },
            _ => self,
        }
    }

    pub fn resume(self) -> Self {
        match self.status {
            TimerStatus::Paused => Self {
                status: TimerStatus::Running,
                ..self
            },
            _ => self,
        }
    }

    /// Back to the first phase with zeroed counters. Returns the elapsed
    /// seconds the session had accumulated before the reset.
    pub fn reset(self, program: &Program) -> (Self, u64) {
        (Self::idle(program), self.elapsed_secs)
    }

    pub fn tick(self, program: &Program) -> Tick {
        if self.status != TimerStatus::Running {
            return Tick::quiet(self);
        }

        let mut next = Self {
            remaining_secs: self.remaining_secs.saturating_sub(1),
            elapsed_secs: self.elapsed_secs + 1,
            ..self
        };
        if next.remaining_secs > 0 {
            return Tick::quiet(next);
        }

        match program {
            Program::Countdown { .. } => {
                next.status = TimerStatus::Complete;
                Tick {
                    state: next,
                    event: Some(TickEvent::Completed),
                }
            }
            Program::Phased(pattern) => match sequencer::next(pattern, self.phase_index) {
                Transition::Next(index) => next.enter(pattern, index),
                Transition::Finished => {
                    next.status = TimerStatus::Complete;
                    Tick {
                        state: next,
                        event: Some(TickEvent::Completed),
                    }
                }
            },
        }
    }

    /// Move to the next routine step without counting any time.
    pub fn skip(self, program: &Program) -> Tick {
        let Program::Phased(pattern) = program else {
            return Tick::quiet(self);
        };
        if !matches!(self.status, TimerStatus::Running | TimerStatus::Paused) {
            return Tick::quiet(self);
        }
        match sequencer::skip_step(pattern, self.phase_index) {
            Some(index) => self.enter(pattern, index),
            None => Tick::quiet(self),
        }
    }

    fn enter(self, pattern: &Pattern, index: usize) -> Tick {
        let Some(step) = pattern.get(index) else {
            return Tick::quiet(self);
        };
        let seconds = u64::from(step.seconds);
        Tick {
            state: Self {
                phase_index: index,
                remaining_secs: seconds,
                ..self
            },
            event: Some(TickEvent::PhaseChanged {
                index,
                phase: step.phase,
                seconds,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::pattern::{breathing_pattern, relaxation_pattern};

    fn run(
        program: &Program,
        mut state: SessionState,
        ticks: u64,
    ) -> (SessionState, Vec<TickEvent>) {
        let mut events = Vec::new();
        for _ in 0..ticks {
            let tick = state.tick(program);
            state = tick.state;
            events.extend(tick.event);
        }
        (state, events)
    }

    #[test]
    fn box_breathing_phase_per_tick() {
        let program = Program::Phased(breathing_pattern("4-4-4").unwrap());
        let mut state = SessionState::start(&program);
        let mut phases = Vec::new();
        for _ in 0..13 {
            phases.push(program.phase_at(state.phase_index).unwrap());
            state = state.tick(&program).state;
        }
        let expected: Vec<Phase> = [Phase::Inhale; 4]
            .into_iter()
            .chain([Phase::Hold; 4])
            .chain([Phase::Exhale; 4])
            .chain([Phase::Inhale])
            .collect();
        assert_eq!(phases, expected);
        assert_eq!(state.elapsed_secs, 13);
    }

    #[test]
    fn countdown_resets_to_new_phase_duration() {
        let program = Program::Phased(breathing_pattern("4-7-8").unwrap());
        let (state, events) = run(&program, SessionState::start(&program), 4);
        assert_eq!(state.phase_index, 1);
        assert_eq!(state.remaining_secs, 7);
        assert_eq!(
            events,
            vec![TickEvent::PhaseChanged {
                index: 1,
                phase: Phase::Hold,
                seconds: 7
            }]
        );

        let (state, _) = run(&program, state, 7);
        assert_eq!(state.phase_index, 2);
        assert_eq!(state.remaining_secs, 8);
    }

    #[test]
    fn every_phase_transitions_after_its_own_duration() {
        for key in ["4-4-4", "4-7-8", "6-2-6", "4-4-4-4"] {
            let pattern = breathing_pattern(key).unwrap();
            let program = Program::Phased(pattern.clone());
            let mut state = SessionState::start(&program);
            // two full laps
            for _ in 0..2 {
                for step in pattern.steps().iter().filter(|s| s.seconds > 0) {
                    assert_eq!(program.phase_at(state.phase_index), Some(step.phase), "{key}");
                    let (after, events) = run(&program, state, u64::from(step.seconds));
                    assert_eq!(events.len(), 1, "{key}");
                    state = after;
                }
            }
            assert_eq!(state.phase_index, 0);
            assert_eq!(state.elapsed_secs, pattern.cycle_secs() * 2);
        }
    }

    #[test]
    fn pause_freezes_counters_and_resume_continues() {
        let program = Program::Phased(breathing_pattern("4-4-4").unwrap());
        let (running, _) = run(&program, SessionState::start(&program), 6);
        let paused = running.pause();
        assert_eq!(paused.status, TimerStatus::Paused);

        let (still_paused, events) = run(&program, paused, 30);
        assert!(events.is_empty());
        assert_eq!(still_paused.remaining_secs, running.remaining_secs);
        assert_eq!(still_paused.elapsed_secs, running.elapsed_secs);

        let resumed = still_paused.resume();
        let (after, _) = run(&program, resumed, 1);
        assert_eq!(after.elapsed_secs, 7);
        assert_eq!(after.remaining_secs, running.remaining_secs - 1);
    }

    #[test]
    fn pause_and_resume_only_apply_to_matching_status() {
        let program = Program::Countdown { total_secs: 10 };
        let idle = SessionState::idle(&program);
        assert_eq!(idle.pause(), idle);
        assert_eq!(idle.resume(), idle);
        let running = SessionState::start(&program);
        assert_eq!(running.resume(), running);
    }

    #[test]
    fn reset_returns_elapsed_and_first_phase() {
        let program = Program::Phased(Pattern::breathing("x", "x", 0, 3, 3, 0).unwrap());
        let (state, _) = run(&program, SessionState::start(&program), 5);
        let (reset, elapsed) = state.reset(&program);
        assert_eq!(elapsed, 5);
        assert_eq!(reset.status, TimerStatus::Idle);
        assert_eq!(reset.phase_index, 1);
        assert_eq!(reset.remaining_secs, 3);
        assert_eq!(reset.elapsed_secs, 0);
    }

    #[test]
    fn five_minute_countdown_completes_at_tick_300() {
        let program = Program::Countdown { total_secs: 300 };
        let (state, events) = run(&program, SessionState::start(&program), 299);
        assert!(events.is_empty());
        assert_eq!(state.remaining_secs, 1);

        let (state, events) = run(&program, state, 1);
        assert_eq!(events, vec![TickEvent::Completed]);
        assert_eq!(state.status, TimerStatus::Complete);
        assert_eq!(state.remaining_secs, 0);

        let (after, events) = run(&program, state, 10);
        assert!(events.is_empty());
        assert_eq!(after, state);
    }

    #[test]
    fn relaxation_completes_at_tick_120_and_stays_complete() {
        let program = Program::Phased(relaxation_pattern().unwrap());
        let (state, events) = run(&program, SessionState::start(&program), 119);
        assert_eq!(state.status, TimerStatus::Running);
        assert_eq!(events.len(), 15);

        let (state, events) = run(&program, state, 1);
        assert_eq!(events, vec![TickEvent::Completed]);
        assert_eq!(state.status, TimerStatus::Complete);
        assert_eq!(state.elapsed_secs, 120);

        let (_, events) = run(&program, state, 50);
        assert!(events.is_empty());
    }

    #[test]
    fn skip_enters_next_body_part_without_counting_time() {
        let program = Program::Phased(relaxation_pattern().unwrap());
        let (state, _) = run(&program, SessionState::start(&program), 2);
        let tick = state.skip(&program);
        assert_eq!(tick.state.phase_index, 2);
        assert_eq!(tick.state.remaining_secs, 5);
        assert_eq!(tick.state.elapsed_secs, 2);
        assert_eq!(
            tick.event,
            Some(TickEvent::PhaseChanged {
                index: 2,
                phase: Phase::Tense,
                seconds: 5
            })
        );
    }

    #[test]
    fn skip_on_last_body_part_is_ignored() {
        let program = Program::Phased(relaxation_pattern().unwrap());
        let (state, _) = run(&program, SessionState::start(&program), 111);
        assert_eq!(state.phase_index, 15);
        let tick = state.skip(&program);
        assert_eq!(tick.state, state);
        assert!(tick.event.is_none());
    }

    #[test]
    fn skip_ignores_countdown_and_idle_sessions() {
        let countdown = Program::Countdown { total_secs: 60 };
        let state = SessionState::start(&countdown);
        assert!(state.skip(&countdown).event.is_none());

        let phased = Program::Phased(breathing_pattern("4-4-4").unwrap());
        let idle = SessionState::idle(&phased);
        assert!(idle.skip(&phased).event.is_none());
    }
}
