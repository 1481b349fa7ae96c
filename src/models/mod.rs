pub mod entries;
pub mod history;
pub mod record;

pub use entries::{ActivityType, ChatMessage, JournalEntry, MoodEntry, NewActivity};
pub use history::{
    ActivityRecord, ChatHistoryItem, DashboardStats, JournalPrompt, MoodRecord,
};
pub use record::{CompletionRecord, ExerciseKind, SessionSummary};
