use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::tone::ToneSpec;
use crate::timer::Phase;

/// Frequency (Hz) played when a phase is entered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CueTable {
    pub inhale: f32,
    pub hold: f32,
    pub exhale: f32,
    pub rest: f32,
    pub tense: f32,
    pub relax: f32,
}

impl Default for CueTable {
    fn default() -> Self {
        Self {
            inhale: 523.0,
            hold: 440.0,
            exhale: 330.0,
            rest: 220.0,
            tense: 392.0,
            relax: 262.0,
        }
    }
}

impl CueTable {
    pub fn frequency(&self, phase: Phase) -> f32 {
        match phase {
            Phase::Inhale => self.inhale,
            Phase::Hold => self.hold,
            Phase::Exhale => self.exhale,
            Phase::Rest => self.rest,
            Phase::Tense => self.tense,
            Phase::Relax => self.relax,
        }
    }

    pub fn cue(&self, phase: Phase) -> ToneSpec {
        ToneSpec::cue(self.frequency(phase))
    }
}

/// C major triad, low to high.
pub const COMPLETION_CHIME: [f32; 3] = [523.0, 659.0, 784.0];
pub const CHIME_STAGGER: Duration = Duration::from_millis(200);

pub fn completion_chime() -> Vec<ToneSpec> {
    COMPLETION_CHIME
        .iter()
        .zip(0u32..)
        .map(|(freq, i)| ToneSpec::chime(*freq, CHIME_STAGGER * i))
        .collect()
}
