//! Rows the API hands back for dashboards, journal prompts and chat history.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::entries::{ActivityType, JournalEntry};
use crate::error::ValidationError;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub daily_activities: u32,
    pub mood_score: f64,
    pub exercises_completed: u32,
    pub streak: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoodRecord {
    pub id: u64,
    pub mood_value: u8,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: u64,
    pub name: String,
    /// Kept as sent; older rows may carry types no longer offered.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn activity_type(&self) -> Option<ActivityType> {
        ActivityType::from_key(&self.kind)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryItem {
    pub id: u64,
    pub message: String,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JournalPrompt {
    pub prompt: String,
}

impl JournalPrompt {
    /// A journal entry answering this prompt.
    pub fn entry(&self, title: &str, content: &str) -> Result<JournalEntry, ValidationError> {
        JournalEntry::new(title, content, Some(self.prompt.clone()))
    }
}
