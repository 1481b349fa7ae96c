use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
    Rest,
    Tense,
    Relax,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Inhale => "inhale",
            Phase::Hold => "hold",
            Phase::Exhale => "exhale",
            Phase::Rest => "rest",
            Phase::Tense => "tense",
            Phase::Relax => "relax",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe In Slowly",
            Phase::Hold => "Hold Your Breath",
            Phase::Exhale => "Breathe Out Slowly",
            Phase::Rest => "Rest and Relax",
            Phase::Tense => "Tense the muscles",
            Phase::Relax => "Release the tension",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Repeat {
    /// Wrap to the first phase after the last one, forever.
    Cycle,
    /// Finish after the last phase.
    Once,
}

/// One row of a pattern's transition table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseStep {
    pub phase: Phase,
    /// Zero means the phase is never entered.
    pub seconds: u32,
    /// Routine step (body part) this phase belongs to.
    pub step: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub key: String,
    pub name: String,
    steps: Vec<PhaseStep>,
    pub repeat: Repeat,
}

impl Pattern {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        steps: Vec<PhaseStep>,
        repeat: Repeat,
    ) -> Result<Self> {
        let key = key.into();
        if steps.iter().all(|s| s.seconds == 0) {
            bail!("pattern '{key}' has no phase with a non-zero duration");
        }
        Ok(Self {
            key,
            name: name.into(),
            steps,
            repeat,
        })
    }

    /// A four-phase breathing cycle; a zero `rest` drops the rest phase.
    pub fn breathing(
        key: &str,
        name: &str,
        inhale: u32,
        hold: u32,
        exhale: u32,
        rest: u32,
    ) -> Result<Self> {
        let steps = [
            (Phase::Inhale, inhale),
            (Phase::Hold, hold),
            (Phase::Exhale, exhale),
            (Phase::Rest, rest),
        ]
        .into_iter()
        .enumerate()
        .map(|(step, (phase, seconds))| PhaseStep {
            phase,
            seconds,
            step,
        })
        .collect();
        Self::new(key, name, steps, Repeat::Cycle)
    }

    /// A tense/relax routine that runs once through every body part.
    pub fn relaxation(key: &str, name: &str, parts: &[BodyPart]) -> Result<Self> {
        let steps = parts
            .iter()
            .enumerate()
            .flat_map(|(step, part)| {
                [
                    PhaseStep {
                        phase: Phase::Tense,
                        seconds: part.tense_secs,
                        step,
                    },
                    PhaseStep {
                        phase: Phase::Relax,
                        seconds: part.relax_secs,
                        step,
                    },
                ]
            })
            .collect();
        Self::new(key, name, steps, Repeat::Once)
    }

    pub fn steps(&self) -> &[PhaseStep] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&PhaseStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Seconds in one pass through the pattern.
    pub fn cycle_secs(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.seconds)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyPart {
    pub name: &'static str,
    pub tense_instruction: &'static str,
    pub relax_instruction: &'static str,
    pub tense_secs: u32,
    pub relax_secs: u32,
}

pub const BODY_PARTS: [BodyPart; 8] = [
    BodyPart {
        name: "Feet and Toes",
        tense_instruction: "Curl your toes tightly and tense your feet",
        relax_instruction: "Release and feel the tension melt away from your feet",
        tense_secs: 5,
        relax_secs: 10,
    },
    BodyPart {
        name: "Calves",
        tense_instruction: "Point your toes up and tense your calf muscles",
        relax_instruction: "Let your calves become completely loose and heavy",
        tense_secs: 5,
        relax_secs: 10,
    },
    BodyPart {
        name: "Thighs",
        tense_instruction: "Squeeze your thigh muscles as tight as you can",
        relax_instruction: "Allow your thighs to sink down and relax completely",
        tense_secs: 5,
        relax_secs: 10,
    },
    BodyPart {
        name: "Glutes",
        tense_instruction: "Clench your buttock muscles firmly",
        relax_instruction: "Release all tension from your glutes and hips",
        tense_secs: 5,
        relax_secs: 10,
    },
    BodyPart {
        name: "Abdomen",
        tense_instruction: "Tense your stomach muscles, pull them in tight",
        relax_instruction: "Let your belly expand naturally as you breathe",
        tense_secs: 5,
        relax_secs: 10,
    },
    BodyPart {
        name: "Hands and Arms",
        tense_instruction: "Make tight fists and tense your entire arms",
        relax_instruction: "Open your hands and let your arms fall loose",
        tense_secs: 5,
        relax_secs: 10,
    },
    BodyPart {
        name: "Shoulders",
        tense_instruction: "Raise your shoulders up to your ears",
        relax_instruction: "Drop your shoulders and feel them melt down",
        tense_secs: 5,
        relax_secs: 10,
    },
    BodyPart {
        name: "Face",
        tense_instruction: "Scrunch up your entire face - eyes, mouth, forehead",
        relax_instruction: "Release all facial tension and let your face go soft",
        tense_secs: 5,
        relax_secs: 10,
    },
];

pub const DEFAULT_BREATHING_PATTERN: &str = "4-4-4";
pub const RELAXATION_PATTERN: &str = "progressive-muscle-relaxation";

/// Built-in breathing patterns, keyed the way users pick them.
pub fn breathing_patterns() -> Vec<Pattern> {
    [
        ("4-4-4", "Box Breathing", 4, 4, 4, 0),
        ("4-7-8", "Relaxing Breath", 4, 7, 8, 0),
        ("6-2-6", "Calming Breath", 6, 2, 6, 0),
        ("4-4-4-4", "Square Breathing", 4, 4, 4, 4),
    ]
    .into_iter()
    .filter_map(|(key, name, inhale, hold, exhale, rest)| {
        Pattern::breathing(key, name, inhale, hold, exhale, rest).ok()
    })
    .collect()
}

pub fn breathing_pattern(key: &str) -> Result<Pattern> {
    match breathing_patterns().into_iter().find(|p| p.key == key) {
        Some(pattern) => Ok(pattern),
        None => bail!("unknown breathing pattern '{key}'"),
    }
}

pub fn relaxation_pattern() -> Result<Pattern> {
    Pattern::relaxation(
        RELAXATION_PATTERN,
        "Progressive Muscle Relaxation",
        &BODY_PARTS,
    )
}

/// What to tell the user during phase `index` of the relaxation routine.
pub fn relaxation_instruction(index: usize) -> Option<(&'static str, &'static str)> {
    let part = BODY_PARTS.get(index / 2)?;
    let text = if index % 2 == 0 {
        part.tense_instruction
    } else {
        part.relax_instruction
    };
    Some((part.name, text))
}
