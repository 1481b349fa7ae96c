use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ExerciseKind {
    Breathing,
    Meditation,
    Relaxation,
}

impl ExerciseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Breathing => "breathing",
            ExerciseKind::Meditation => "meditation",
            ExerciseKind::Relaxation => "relaxation",
        }
    }
}

/// What a session looked like when it ended.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub kind: ExerciseKind,
    pub pattern_key: Option<String>,
    /// Configured length for countdown sessions.
    pub target_minutes: Option<u32>,
    pub elapsed_secs: u64,
    pub started_at: DateTime<Utc>,
}

/// Body of `POST /api/exercises`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub exercise_type: ExerciseKind,
    /// Whole minutes.
    pub duration: u64,
    pub completed: bool,
    pub data: Map<String, Value>,
    #[serde(skip)]
    pub session_id: String,
}

impl CompletionRecord {
    pub fn completed(summary: &SessionSummary) -> Self {
        let minutes = match (summary.kind, summary.target_minutes) {
            (ExerciseKind::Meditation, Some(target)) => u64::from(target),
            _ => summary.elapsed_secs / 60,
        };
        Self::build(summary, minutes, true)
    }

    pub fn abandoned(summary: &SessionSummary) -> Self {
        Self::build(summary, summary.elapsed_secs / 60, false)
    }

    fn build(summary: &SessionSummary, minutes: u64, completed: bool) -> Self {
        let mut data = Map::new();
        match summary.kind {
            ExerciseKind::Breathing => {
                data.insert("totalMinutes".into(), json!(minutes));
                if let Some(key) = &summary.pattern_key {
                    data.insert("pattern".into(), json!(key));
                }
            }
            ExerciseKind::Meditation => {
                data.insert(
                    "timerDuration".into(),
                    json!(summary.target_minutes.map(u64::from).unwrap_or(minutes)),
                );
            }
            ExerciseKind::Relaxation => {
                data.insert("type".into(), json!("progressive_muscle_relaxation"));
            }
        }
        data.insert("durationSeconds".into(), json!(summary.elapsed_secs));
        data.insert("startedAt".into(), json!(summary.started_at.to_rfc3339()));

        Self {
            exercise_type: summary.kind,
            duration: minutes,
            completed,
            data,
            session_id: summary.session_id.clone(),
        }
    }
}
