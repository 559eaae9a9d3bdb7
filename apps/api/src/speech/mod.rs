//! Speech synthesis for interviewer replies.
//!
//! `HostedSpeech` renders text with the TTS endpoint, uploads the audio to
//! object storage and hands back a presigned URL the browser can play.
//! Every failure here is non-fatal to a turn: the caller logs it and delivers
//! the reply as text only.

pub mod storage;
pub mod tts;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::llm_client::LlmError;
use crate::speech::storage::AudioStore;
use crate::speech::tts::TtsClient;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("synthesis request failed: {0}")]
    Synthesis(#[from] LlmError),

    #[error("synthesis returned no audio")]
    EmptyAudio,

    #[error("audio upload failed: {0}")]
    Upload(String),
}

/// Speech-synthesis collaborator: text in, playable audio URL out.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<String, SpeechError>;
}

/// Production synthesizer: TTS render + S3 upload + presigned URL.
pub struct HostedSpeech {
    tts: TtsClient,
    store: AudioStore,
}

impl HostedSpeech {
    pub fn new(tts: TtsClient, store: AudioStore) -> Self {
        Self { tts, store }
    }
}

#[async_trait]
impl SpeechSynthesizer for HostedSpeech {
    async fn synthesize(&self, text: &str) -> Result<String, SpeechError> {
        let audio = self.tts.render(text).await?;
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        debug!("Synthesized {} bytes of speech", audio.len());
        self.store.publish(audio).await
    }
}
