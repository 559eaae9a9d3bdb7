//! In-test collaborators for the interview pipeline.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{AudioClip, ChatCompleter, CompletionRequest, LlmError, Transcriber};
use crate::speech::{SpeechError, SpeechSynthesizer};

pub const SCORED_ANALYSIS: &str = r#"{
    "technical_score": 78,
    "communication_score": 85,
    "confidence_score": 72,
    "feedback": [
        {"topic": "Indexing", "feedback": "Good instinct to index.", "better_answer": "Explain why a composite index fits the predicate order."},
        {"topic": "Communication", "feedback": "Concise answers.", "better_answer": "Quantify the improvement."},
        {"topic": "Depth", "feedback": "Stayed high level.", "better_answer": "Discuss the query plan before and after."}
    ]
}"#;

pub struct ScriptedTranscriber {
    text: Option<String>,
    delay: Duration,
}

impl ScriptedTranscriber {
    pub fn saying(text: &str) -> Self {
        Self::slow(text, Duration::ZERO)
    }

    /// Takes `delay` of tokio time before answering.
    pub fn slow(text: &str, delay: Duration) -> Self {
        Self {
            text: Some(text.to_string()),
            delay,
        }
    }

    pub fn failing() -> Self {
        Self {
            text: None,
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _audio: &AudioClip) -> Result<String, LlmError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.text.clone().ok_or(LlmError::Api {
            status: 503,
            message: "transcription unavailable".to_string(),
        })
    }
}

/// Replies in script order (repeating the last line) and answers forced-JSON
/// requests with `analysis`.
pub struct ScriptedChat {
    replies: Mutex<VecDeque<String>>,
    analysis: Option<String>,
    fail: bool,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedChat {
    pub fn replying(lines: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(lines.iter().map(|l| l.to_string()).collect()),
            analysis: Some(SCORED_ANALYSIS.to_string()),
            fail: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn with_analysis(lines: &[&str], analysis: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(lines.iter().map(|l| l.to_string()).collect()),
            analysis: Some(analysis.to_string()),
            fail: false,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            analysis: None,
            fail: true,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn analysis_calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.json_object)
            .count()
    }

    pub fn last_request(&self) -> CompletionRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no completion requests recorded")
    }
}

#[async_trait]
impl ChatCompleter for ScriptedChat {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let json_object = request.json_object;
        self.requests.lock().unwrap().push(request);
        if self.fail {
            return Err(LlmError::Api {
                status: 500,
                message: "completion unavailable".to_string(),
            });
        }
        if json_object {
            return self.analysis.clone().ok_or(LlmError::EmptyContent);
        }
        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        reply.ok_or(LlmError::EmptyContent)
    }
}

pub struct FixedSpeech(pub &'static str);

#[async_trait]
impl SpeechSynthesizer for FixedSpeech {
    async fn synthesize(&self, _text: &str) -> Result<String, SpeechError> {
        Ok(self.0.to_string())
    }
}

pub struct FailingSpeech;

#[async_trait]
impl SpeechSynthesizer for FailingSpeech {
    async fn synthesize(&self, _text: &str) -> Result<String, SpeechError> {
        Err(SpeechError::EmptyAudio)
    }
}
