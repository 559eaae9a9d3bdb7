use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;

use crate::llm_client::{ensure_success, LlmError};

/// Text-to-speech model served by the same OpenAI-compatible API as chat.
pub const TTS_MODEL: &str = "playai-tts";
pub const TTS_FORMAT: &str = "wav";

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[derive(Clone)]
pub struct TtsClient {
    client: Client,
    api_key: String,
    base_url: String,
    voice: String,
}

impl TtsClient {
    pub fn new(api_key: String, base_url: String, voice: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            voice,
        })
    }

    /// Renders `text` to WAV audio.
    pub async fn render(&self, text: &str) -> Result<Bytes, LlmError> {
        let body = SpeechBody {
            model: TTS_MODEL,
            voice: &self.voice,
            input: text,
            response_format: TTS_FORMAT,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        Ok(ensure_success(response).await?.bytes().await?)
    }
}
