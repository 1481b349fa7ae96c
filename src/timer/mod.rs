pub mod controller;
pub mod pattern;
pub mod sequencer;
pub mod state;

pub use controller::{SessionEvent, SessionSelection, TimerController, TimerSnapshot};
pub use pattern::{Pattern, Phase, PhaseStep, Repeat};
pub use state::{Program, SessionState, Tick, TickEvent, TimerStatus};
