//! Turn Processor: one candidate utterance in, transcript + reply (+ speech) out.
//!
//! Flow: transcribe → build prompt + history → chat completion → optional speech.
//! Persisting the resulting pair is the caller's job.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::models::{count_role_repeats, CandidateContext, JobContext, Turn};
use crate::interview::prompts::build_system_prompt;
use crate::llm_client::{AudioClip, ChatCompleter, ChatMessage, CompletionRequest, Transcriber};
use crate::speech::SpeechSynthesizer;

pub const REPLY_TEMPERATURE: f32 = 0.7;
/// Keeps replies short enough to speak.
pub const REPLY_MAX_TOKENS: u32 = 150;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub candidate_text: String,
    pub interviewer_text: String,
    /// Absent when speech is disabled or synthesis failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

#[derive(Clone)]
pub struct TurnProcessor {
    transcriber: Arc<dyn Transcriber>,
    completer: Arc<dyn ChatCompleter>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl TurnProcessor {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        completer: Arc<dyn ChatCompleter>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            transcriber,
            completer,
            speech,
        }
    }

    /// Runs one exchange against `history`, which is sent verbatim and in order.
    pub async fn process_turn(
        &self,
        audio: &AudioClip,
        history: &[Turn],
        job: Option<&JobContext>,
        candidate: Option<&CandidateContext>,
    ) -> Result<TurnResult, AppError> {
        if audio.bytes.is_empty() {
            return Err(AppError::Validation("No audio provided".to_string()));
        }

        let candidate_text = self
            .transcriber
            .transcribe(audio)
            .await
            .map_err(|e| AppError::Transcription(format!("Failed to transcribe audio: {e}")))?
            .trim()
            .to_string();
        if candidate_text.is_empty() {
            return Err(AppError::Transcription(
                "Transcription returned no speech".to_string(),
            ));
        }
        info!("Candidate said {} chars", candidate_text.len());

        let repeats = count_role_repeats(history);
        if repeats > 0 {
            warn!("History has {repeats} consecutive same-role turns; sending as received");
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(build_system_prompt(job, candidate)));
        messages.extend(history.iter().map(Turn::to_chat_message));
        messages.push(ChatMessage::user(candidate_text.clone()));

        let reply = self
            .completer
            .complete(CompletionRequest {
                messages,
                temperature: REPLY_TEMPERATURE,
                max_tokens: Some(REPLY_MAX_TOKENS),
                json_object: false,
            })
            .await
            .map_err(|e| AppError::Completion(format!("Failed to get AI response: {e}")))?;

        let interviewer_text = reply.trim().to_string();
        if interviewer_text.is_empty() {
            return Err(AppError::Completion("Empty response from AI".to_string()));
        }

        let audio_url = self.speak(&interviewer_text).await;

        Ok(TurnResult {
            candidate_text,
            interviewer_text,
            audio_url,
        })
    }

    async fn speak(&self, text: &str) -> Option<String> {
        let speech = self.speech.as_ref()?;
        match speech.synthesize(text).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Speech synthesis failed, delivering text only: {e}");
                None
            }
        }
    }
}
