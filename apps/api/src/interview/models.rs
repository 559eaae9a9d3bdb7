//! Interview domain types shared by the prompt builder, turn processor,
//! timer, analyzer and controller.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interview::timer::SessionTimer;
use crate::llm_client::ChatMessage;

/// Who spoke a turn. Serialized with the chat wire names the browser already uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "assistant", alias = "interviewer")]
    Interviewer,
    #[serde(rename = "user", alias = "candidate")]
    Candidate,
}

impl Role {
    /// Label used when rendering a transcript for analysis.
    pub fn transcript_label(self) -> &'static str {
        match self {
            Role::Interviewer => "Interviewer",
            Role::Candidate => "Candidate",
        }
    }
}

/// One role-tagged utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(alias = "text")]
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn interviewer(content: impl Into<String>) -> Self {
        Self {
            role: Role::Interviewer,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn candidate(content: impl Into<String>) -> Self {
        Self {
            role: Role::Candidate,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn to_chat_message(&self) -> ChatMessage {
        match self.role {
            Role::Interviewer => ChatMessage::assistant(self.content.clone()),
            Role::Candidate => ChatMessage::user(self.content.clone()),
        }
    }
}

/// Drops the opening interviewer greeting, if present.
///
/// Browsers that manage their own history send it without the greeting;
/// server-held sessions always start with one.
pub fn without_greeting(turns: &[Turn]) -> &[Turn] {
    match turns.first() {
        Some(first) if first.role == Role::Interviewer => &turns[1..],
        _ => turns,
    }
}

/// Number of adjacent turns sharing a role. Upstream never enforced alternation.
pub fn count_role_repeats(turns: &[Turn]) -> usize {
    turns.windows(2).filter(|w| w[0].role == w[1].role).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_difficulty")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(label)
    }
}

/// Interview length as supplied by callers: either minutes, or a label
/// embedding a number such as "Standard (30 min)".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Minutes(f64),
    Label(String),
}

impl DurationInput {
    /// Minutes named by this input, if it names a positive whole number of them.
    pub fn minutes(&self) -> Option<u32> {
        let minutes = match self {
            DurationInput::Minutes(m) if m.is_finite() => m.trunc() as i64,
            DurationInput::Minutes(_) => return None,
            DurationInput::Label(label) => first_number(label)?,
        };
        u32::try_from(minutes).ok().filter(|m| *m > 0)
    }
}

impl fmt::Display for DurationInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationInput::Minutes(m) => write!(f, "{} minutes", m.trunc() as i64),
            DurationInput::Label(label) => f.write_str(label),
        }
    }
}

/// First run of ASCII digits in `text`, parsed.
fn first_number(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Recruiter-defined role parameters. Read-only for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobContext {
    pub role_title: String,
    pub job_description: String,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<DurationInput>,
}

/// Resume-derived facts about the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateContext {
    pub full_name: String,
    #[serde(default)]
    pub technical_skills: Vec<String>,
    #[serde(default)]
    pub most_impressive_project: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub topic: String,
    pub feedback: String,
    pub better_answer: String,
}

impl FeedbackEntry {
    fn new(topic: &str, feedback: &str, better_answer: &str) -> Self {
        Self {
            topic: topic.to_string(),
            feedback: feedback.to_string(),
            better_answer: better_answer.to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        [&self.topic, &self.feedback, &self.better_answer]
            .iter()
            .all(|s| !s.trim().is_empty())
    }
}

/// Scored outcome of a finished interview.
///
/// Invariant: every score is within 0..=100 and `feedback` holds exactly
/// `FEEDBACK_ENTRIES` complete entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub technical_score: u8,
    pub communication_score: u8,
    pub confidence_score: u8,
    pub feedback: Vec<FeedbackEntry>,
}

pub const FEEDBACK_ENTRIES: usize = 3;

impl AnalysisReport {
    /// Generic feedback used when the scoring service's feedback is unusable.
    pub fn fallback_feedback() -> Vec<FeedbackEntry> {
        vec![
            FeedbackEntry::new("General", "Interview completed.", "N/A"),
            FeedbackEntry::new("Communication", "Clear speech.", "N/A"),
            FeedbackEntry::new("Technical", "Good effort.", "N/A"),
        ]
    }
}

/// In-flight interview state, passed into and returned from every controller operation.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    /// Set when the session was started from a stored job posting.
    pub job_id: Option<Uuid>,
    pub job: Option<JobContext>,
    pub candidate: Option<CandidateContext>,
    /// Always begins with the interviewer's greeting.
    pub turns: Vec<Turn>,
    pub timer: SessionTimer,
    pub ended: bool,
}

impl Session {
    /// Turns after the opening greeting.
    pub fn conversation(&self) -> &[Turn] {
        &self.turns[1.min(self.turns.len())..]
    }

    /// Appends one candidate answer and the interviewer's reply to it.
    pub fn record_exchange(&mut self, candidate_text: String, interviewer_text: String) {
        self.turns.push(Turn::candidate(candidate_text));
        self.turns.push(Turn::interviewer(interviewer_text));
    }

    pub fn accepts_turns(&self) -> bool {
        !self.ended && !self.timer.is_expired()
    }

    pub fn candidate_name(&self) -> &str {
        self.candidate
            .as_ref()
            .map(|c| c.full_name.as_str())
            .unwrap_or("Anonymous")
    }
}
