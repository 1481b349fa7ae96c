//! Glue between speech recognition, the chat companion and speech synthesis.
//!
//! Both speech engines belong to the host; this module only decides what to
//! send and what to say.

use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::api::ChatReply;
use crate::error::{Result, ValidationError};
use crate::models::ChatMessage;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoicePreference {
    Male,
    #[default]
    Female,
}

impl VoicePreference {
    pub fn pitch(&self) -> f32 {
        match self {
            VoicePreference::Female => 1.2,
            VoicePreference::Male => 0.8,
        }
    }

    fn hints(&self) -> &'static [&'static str] {
        match self {
            VoicePreference::Female => &["female", "woman", "samantha"],
            VoicePreference::Male => &["male", "man", "daniel"],
        }
    }
}

pub const SPEECH_RATE: f32 = 0.9;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    /// Host voice name, when one matched the preference.
    pub voice: Option<String>,
}

/// Whatever answers chat messages; the REST API in production.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn reply(&self, message: &ChatMessage) -> Result<ChatReply>;
}

pub trait SpeechSynthesizer {
    fn voices(&self) -> Vec<String>;
    fn cancel(&self);
    fn speak(&self, request: SpeechRequest) -> Result<(), String>;
}

/// Picks the first host voice whose name suggests the preferred voice.
///
/// "female" and "woman" contain "male" and "man", so male matching skips any
/// name that also carries a female hint.
pub fn pick_voice<'a>(names: &'a [String], preference: VoicePreference) -> Option<&'a str> {
    let female = VoicePreference::Female.hints();
    names
        .iter()
        .map(String::as_str)
        .find(|name| {
            let lower = name.to_lowercase();
            let matches = |hints: &[&str]| hints.iter().any(|h| lower.contains(h));
            match preference {
                VoicePreference::Female => matches(female),
                VoicePreference::Male => matches(preference.hints()) && !matches(female),
            }
        })
}

/// Final speech-to-text result to a chat message.
pub fn message_from_transcript(transcript: &str) -> Result<ChatMessage, ValidationError> {
    ChatMessage::new(transcript)
}

pub fn speech_for_reply(
    reply: &str,
    preference: VoicePreference,
    voices: &[String],
) -> SpeechRequest {
    SpeechRequest {
        text: reply.to_string(),
        rate: SPEECH_RATE,
        pitch: preference.pitch(),
        voice: pick_voice(voices, preference).map(str::to_string),
    }
}

/// Speak a chat reply, cutting off whatever was being said before.
pub fn speak_reply<S: SpeechSynthesizer + ?Sized>(
    synth: &S,
    reply: &str,
    preference: VoicePreference,
) {
    synth.cancel();
    let request = speech_for_reply(reply, preference, &synth.voices());
    if let Err(e) = synth.speak(request) {
        warn!("Speech synthesis failed: {}", e);
    }
}

/// One spoken exchange: send the final transcript, speak the answer.
///
/// Blank transcripts are rejected before anything is sent. Nothing is spoken
/// when the chat request fails.
pub async fn converse<C, S>(
    chat: &C,
    synth: &S,
    transcript: &str,
    preference: VoicePreference,
) -> Result<ChatReply>
where
    C: ChatBackend + ?Sized,
    S: SpeechSynthesizer + ?Sized,
{
    let message = message_from_transcript(transcript)?;
    let reply = chat.reply(&message).await?;
    speak_reply(synth, &reply.message, preference);
    Ok(reply)
}
