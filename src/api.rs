use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::{
    ActivityRecord, ChatHistoryItem, ChatMessage, CompletionRecord, DashboardStats, JournalEntry,
    JournalPrompt, MoodEntry, MoodRecord, NewActivity,
};
use crate::report::CompletionSink;
use crate::voice::{ChatBackend, VoicePreference};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChatReply {
    pub message: String,
}

#[derive(Serialize)]
struct VoiceBody {
    voice: VoicePreference,
}

/// Client for the wellness REST API. Requests are sent once; there are no
/// automatic retries.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.get("/api/dashboard/stats").await
    }

    pub async fn moods(&self) -> Result<Vec<MoodRecord>> {
        self.get("/api/moods").await
    }

    /// Shape is up to the server; passed through untouched.
    pub async fn mood_stats(&self) -> Result<Value> {
        self.get("/api/moods/stats").await
    }

    pub async fn activities(&self) -> Result<Vec<ActivityRecord>> {
        self.get("/api/activities").await
    }

    pub async fn activity_stats(&self) -> Result<Value> {
        self.get("/api/activities/stats").await
    }

    pub async fn journal_prompt(&self) -> Result<JournalPrompt> {
        self.get("/api/journal/prompt").await
    }

    pub async fn chat_history(&self) -> Result<Vec<ChatHistoryItem>> {
        self.get("/api/chat/history").await
    }

    pub async fn record_exercise(&self, record: &CompletionRecord) -> Result<()> {
        self.send("/api/exercises", record).await
    }

    pub async fn record_mood(&self, entry: &MoodEntry) -> Result<()> {
        self.send("/api/moods", entry).await
    }

    pub async fn add_activity(&self, activity: &NewActivity) -> Result<()> {
        self.send("/api/activities", activity).await
    }

    pub async fn complete_activity(&self, activity_id: u64) -> Result<()> {
        let path = format!("/api/activities/{activity_id}/complete");
        self.send(&path, &serde_json::json!({})).await
    }

    pub async fn save_journal(&self, entry: &JournalEntry) -> Result<()> {
        self.send("/api/journal", entry).await
    }

    pub async fn send_chat(&self, message: &ChatMessage) -> Result<ChatReply> {
        self.fetch("/api/chat", message).await
    }

    pub async fn set_voice_preference(&self, voice: VoicePreference) -> Result<()> {
        self.send("/api/user/voice-preference", &VoiceBody { voice })
            .await
    }

    async fn send<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.post(path, body).await.map(|_| ())
    }

    async fn fetch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.post(path, body).await?;
        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .dispatch("GET", path, self.http.get(self.url(path)))
            .await?;
        Ok(response.json::<T>().await?)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        self.dispatch("POST", path, self.http.post(self.url(path)).json(body))
            .await
    }

    async fn dispatch(
        &self,
        method: &'static str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response> {
        debug!("{} {}", method, path);
        let response = request.send().await?;
        check_status(method, path, response.status())?;
        Ok(response)
    }
}

/// 401 means the login expired; everything else non-2xx is a plain failure.
fn check_status(method: &'static str, path: &str, status: StatusCode) -> Result<()> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized);
    }
    if !status.is_success() {
        return Err(Error::Api {
            method,
            path: path.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}

#[async_trait]
impl CompletionSink for ApiClient {
    async fn submit(&self, record: &CompletionRecord) -> Result<()> {
        self.record_exercise(record).await
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn reply(&self, message: &ChatMessage) -> Result<ChatReply> {
        self.send_chat(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let client = ApiClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.url("/api/moods"), "http://localhost:5000/api/moods");
    }

    #[test]
    fn unauthorized_is_distinguished() {
        let err = check_status("POST", "/api/chat", StatusCode::UNAUTHORIZED).unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn server_errors_carry_status() {
        let err =
            check_status("POST", "/api/moods", StatusCode::INTERNAL_SERVER_ERROR).unwrap_err();
        assert!(matches!(err, Error::Api { status: 500, .. }));
        assert_eq!(err.to_string(), "POST /api/moods failed with status 500");
        assert!(check_status("POST", "/api/moods", StatusCode::CREATED).is_ok());
    }

    #[test]
    fn reads_map_unauthorized_too() {
        let err = check_status("GET", "/api/chat/history", StatusCode::UNAUTHORIZED).unwrap_err();
        assert!(err.is_unauthorized());
        let err = check_status("GET", "/api/moods", StatusCode::NOT_FOUND).unwrap_err();
        assert_eq!(err.to_string(), "GET /api/moods failed with status 404");
    }

    #[test]
    fn chat_reply_parses() {
        let reply: ChatReply = serde_json::from_str(r#"{"message":"Breathe with me."}"#).unwrap();
        assert_eq!(reply.message, "Breathe with me.");
    }
}
