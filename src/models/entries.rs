//! Mood, activity, journal and chat drafts.
//!
//! Each constructor validates and normalises user input, so a value of one of
//! these types is always safe to send.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub mood_value: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl MoodEntry {
    pub fn new(mood_value: u8, note: &str) -> Result<Self, ValidationError> {
        if !(1..=5).contains(&mood_value) {
            return Err(ValidationError::MoodOutOfRange(mood_value));
        }
        let note = note.trim();
        Ok(Self {
            mood_value,
            note: (!note.is_empty()).then(|| note.to_string()),
        })
    }

    pub fn label(&self) -> &'static str {
        match self.mood_value {
            1 => "Very Sad",
            2 => "Sad",
            3 => "Okay",
            4 => "Good",
            _ => "Great",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    Meditation,
    Exercise,
    Journaling,
    Breathing,
    Walking,
    Reading,
    Other,
}

impl ActivityType {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "meditation" => Some(ActivityType::Meditation),
            "exercise" => Some(ActivityType::Exercise),
            "journaling" => Some(ActivityType::Journaling),
            "breathing" => Some(ActivityType::Breathing),
            "walking" => Some(ActivityType::Walking),
            "reading" => Some(ActivityType::Reading),
            "other" => Some(ActivityType::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    /// Planned minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl NewActivity {
    pub fn new(name: &str, kind: &str, duration: Option<u32>) -> Result<Self, ValidationError> {
        let name = name.trim();
        let kind_key = kind.trim();
        if name.is_empty() || kind_key.is_empty() {
            return Err(ValidationError::IncompleteActivity);
        }
        let kind = ActivityType::from_key(kind_key)
            .ok_or_else(|| ValidationError::UnknownActivityType(kind_key.to_string()))?;
        if duration == Some(0) {
            return Err(ValidationError::ZeroDuration);
        }
        Ok(Self {
            name: name.to_string(),
            kind,
            duration,
        })
    }
}

pub const DEFAULT_JOURNAL_TITLE: &str = "Journal Entry";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl JournalEntry {
    /// Content is kept as written; only a blank body is rejected.
    pub fn new(
        title: &str,
        content: &str,
        prompt: Option<String>,
    ) -> Result<Self, ValidationError> {
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyJournal);
        }
        let title = match title.trim() {
            "" => DEFAULT_JOURNAL_TITLE,
            t => t,
        };
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            prompt,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub message: String,
}

impl ChatMessage {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        match text.trim() {
            "" => Err(ValidationError::EmptyMessage),
            t => Ok(Self {
                message: t.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mood_blank_note_is_dropped() {
        let entry = MoodEntry::new(4, "   ").unwrap();
        assert_eq!(entry.note, None);
        assert_eq!(entry.label(), "Good");
        assert_eq!(serde_json::to_value(&entry).unwrap(), json!({ "moodValue": 4 }));
    }

    #[test]
    fn mood_note_is_trimmed() {
        let entry = MoodEntry::new(1, "  rough day \n").unwrap();
        assert_eq!(entry.note.as_deref(), Some("rough day"));
    }

    #[test]
    fn mood_outside_scale_is_rejected() {
        assert_eq!(MoodEntry::new(0, ""), Err(ValidationError::MoodOutOfRange(0)));
        assert_eq!(MoodEntry::new(6, "hi"), Err(ValidationError::MoodOutOfRange(6)));
    }

    #[test]
    fn activity_needs_name_and_type() {
        assert_eq!(
            NewActivity::new("  ", "walking", None),
            Err(ValidationError::IncompleteActivity)
        );
        assert_eq!(
            NewActivity::new("Evening walk", "", None),
            Err(ValidationError::IncompleteActivity)
        );
        assert_eq!(
            NewActivity::new("Evening walk", "skydiving", None),
            Err(ValidationError::UnknownActivityType("skydiving".into()))
        );
    }

    #[test]
    fn activity_serializes_type_field() {
        let activity = NewActivity::new(" Evening walk ", "walking", Some(30)).unwrap();
        assert_eq!(
            serde_json::to_value(&activity).unwrap(),
            json!({ "name": "Evening walk", "type": "walking", "duration": 30 })
        );
    }

    #[test]
    fn zero_minute_activity_is_rejected() {
        assert_eq!(
            NewActivity::new("Read", "reading", Some(0)),
            Err(ValidationError::ZeroDuration)
        );
    }

    #[test]
    fn journal_requires_content_and_defaults_title() {
        assert_eq!(
            JournalEntry::new("Title", " \n\t", None),
            Err(ValidationError::EmptyJournal)
        );
        let entry =
            JournalEntry::new("", "Grateful for coffee.", Some("What went well?".into())).unwrap();
        assert_eq!(entry.title, DEFAULT_JOURNAL_TITLE);
        assert_eq!(entry.prompt.as_deref(), Some("What went well?"));
    }

    #[test]
    fn chat_message_is_trimmed() {
        assert_eq!(ChatMessage::new("  hi  ").unwrap().message, "hi");
        assert_eq!(ChatMessage::new(" "), Err(ValidationError::EmptyMessage));
    }
}
