//! Transcript Analyzer: turns a finished conversation into an `AnalysisReport`.
//!
//! The scoring model's output is treated as untrusted. Two fallback layers make
//! the report invariants hold unconditionally:
//! 1. parse failure: raw text → fence-stripped text → outermost `{...}` →
//!    zero-score report with empty feedback
//! 2. field failure: non-numeric score → `NEUTRAL_SCORE`; feedback that is not
//!    exactly three complete entries → generic fallback feedback
//!
//! Only a failed completion call (a hard outage) reaches the caller as an error.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::models::{AnalysisReport, FeedbackEntry, JobContext, Turn, FEEDBACK_ENTRIES};
use crate::interview::prompts::{build_analysis_prompt, render_transcript};
use crate::llm_client::{strip_json_fences, ChatCompleter, ChatMessage, CompletionRequest};

/// Low temperature keeps scores stable across repeated analyses.
pub const ANALYSIS_TEMPERATURE: f32 = 0.2;
/// Substituted for any score the model did not return as a number.
pub const NEUTRAL_SCORE: u8 = 70;

#[derive(Debug, Error)]
pub enum AnalysisParseError {
    #[error("analysis output is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("analysis output is not a JSON object")]
    NotAnObject,
}

/// Model output before validation. Every field is optional and loosely typed.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    technical_score: Value,
    #[serde(default)]
    communication_score: Value,
    #[serde(default)]
    confidence_score: Value,
    #[serde(default)]
    feedback: Value,
}

impl RawAnalysis {
    /// Stand-in when nothing parseable came back.
    fn zeroed() -> Self {
        Self {
            technical_score: Value::from(0),
            communication_score: Value::from(0),
            confidence_score: Value::from(0),
            feedback: Value::Array(Vec::new()),
        }
    }
}

#[derive(Clone)]
pub struct TranscriptAnalyzer {
    completer: Arc<dyn ChatCompleter>,
}

impl TranscriptAnalyzer {
    pub fn new(completer: Arc<dyn ChatCompleter>) -> Self {
        Self { completer }
    }

    /// Scores `history` (greeting already removed). Callers validate the
    /// minimum exchange count before calling.
    pub async fn analyze(
        &self,
        history: &[Turn],
        job: Option<&JobContext>,
    ) -> Result<AnalysisReport, AppError> {
        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(build_analysis_prompt(job)),
                ChatMessage::user(format!(
                    "Here is the transcript:\n\n{}",
                    render_transcript(history)
                )),
            ],
            temperature: ANALYSIS_TEMPERATURE,
            max_tokens: None,
            json_object: true,
        };

        let raw = self
            .completer
            .complete(request)
            .await
            .map_err(|e| AppError::Completion(format!("Interview analysis failed: {e}")))?;

        let report = interpret(&raw);
        info!(
            "Analysis complete: technical={}, communication={}, confidence={}",
            report.technical_score, report.communication_score, report.confidence_score
        );
        Ok(report)
    }
}

/// Applies both fallback layers to raw model output.
pub fn interpret(raw: &str) -> AnalysisReport {
    let parsed = parse_analysis(raw).unwrap_or_else(|e| {
        warn!("Falling back to zero-score analysis: {e}");
        RawAnalysis::zeroed()
    });
    normalize(parsed)
}

fn parse_analysis(raw: &str) -> Result<RawAnalysis, AnalysisParseError> {
    let object = parse_object(raw.trim())
        .or_else(|_| parse_object(strip_json_fences(raw)))
        .or_else(|e| match outermost_object(raw) {
            Some(candidate) => parse_object(candidate),
            None => Err(e),
        })?;
    Ok(serde_json::from_value(object)?)
}

fn parse_object(text: &str) -> Result<Value, AnalysisParseError> {
    let value: Value = serde_json::from_str(text)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(AnalysisParseError::NotAnObject)
    }
}

/// Slice from the first `{` to the last `}`, when the model wrapped its JSON in prose.
fn outermost_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

fn normalize(raw: RawAnalysis) -> AnalysisReport {
    AnalysisReport {
        technical_score: score(&raw.technical_score, "technical_score"),
        communication_score: score(&raw.communication_score, "communication_score"),
        confidence_score: score(&raw.confidence_score, "confidence_score"),
        feedback: feedback(raw.feedback),
    }
}

fn score(value: &Value, field: &str) -> u8 {
    match value.as_f64() {
        Some(n) => n.round().clamp(0.0, 100.0) as u8,
        None => {
            warn!("Analysis field {field} is not numeric ({value}); using {NEUTRAL_SCORE}");
            NEUTRAL_SCORE
        }
    }
}

fn feedback(value: Value) -> Vec<FeedbackEntry> {
    match serde_json::from_value::<Vec<FeedbackEntry>>(value) {
        Ok(entries)
            if entries.len() == FEEDBACK_ENTRIES && entries.iter().all(FeedbackEntry::is_complete) =>
        {
            entries
        }
        _ => {
            warn!("Analysis feedback unusable; substituting generic feedback");
            AnalysisReport::fallback_feedback()
        }
    }
}
