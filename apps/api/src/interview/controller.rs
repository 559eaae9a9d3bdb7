//! Session Controller: sequencing and validation around the turn processor
//! and transcript analyzer. Holds no session state of its own.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::analyzer::TranscriptAnalyzer;
use crate::interview::models::{AnalysisReport, CandidateContext, JobContext, Session, Turn};
use crate::interview::prompts::build_greeting;
use crate::interview::timer::SessionTimer;
use crate::interview::turn::{TurnProcessor, TurnResult};
use crate::llm_client::AudioClip;
use crate::models::interview::{NewInterview, RecordMeta};
use crate::store::InterviewStore;

/// One candidate answer plus the interviewer's reply to it.
pub const MIN_CONVERSATION_TURNS: usize = 2;

#[derive(Clone)]
pub struct SessionController {
    turns: TurnProcessor,
    analyzer: TranscriptAnalyzer,
    store: Arc<dyn InterviewStore>,
}

impl SessionController {
    pub fn new(
        turns: TurnProcessor,
        analyzer: TranscriptAnalyzer,
        store: Arc<dyn InterviewStore>,
    ) -> Self {
        Self {
            turns,
            analyzer,
            store,
        }
    }

    /// Opens a session whose first turn is the interviewer's greeting.
    pub fn start(
        &self,
        job_id: Option<Uuid>,
        job: Option<JobContext>,
        candidate: Option<CandidateContext>,
    ) -> Session {
        let greeting = build_greeting(job.as_ref(), candidate.as_ref());
        let timer = SessionTimer::from_duration(job.as_ref().and_then(|j| j.duration.as_ref()));
        let session = Session {
            id: Uuid::new_v4(),
            job_id,
            job,
            candidate,
            turns: vec![Turn::interviewer(greeting)],
            timer,
            ended: false,
        };
        info!(
            "Started interview session {} ({}s budget)",
            session.id,
            session.timer.remaining_secs()
        );
        session
    }

    /// Runs one exchange and appends both turns to `session`.
    pub async fn submit_turn(
        &self,
        session: &mut Session,
        audio: &AudioClip,
    ) -> Result<TurnResult, AppError> {
        if !session.accepts_turns() {
            return Err(AppError::Validation(
                "This interview has ended and no longer accepts answers".to_string(),
            ));
        }

        let result = self
            .turns
            .process_turn(
                audio,
                &session.turns,
                session.job.as_ref(),
                session.candidate.as_ref(),
            )
            .await?;

        session.record_exchange(result.candidate_text.clone(), result.interviewer_text.clone());
        Ok(result)
    }

    /// Analyzes and records the session, then marks it ended and stops its clock.
    /// The session is left untouched when analysis fails so the caller can retry.
    pub async fn end_session(&self, session: &mut Session) -> Result<AnalysisReport, AppError> {
        if session.ended {
            return Err(AppError::Validation(
                "This interview has already ended".to_string(),
            ));
        }

        let report = self
            .conclude(session.conversation(), session.job.as_ref(), record_meta(session))
            .await?;

        session.ended = true;
        session.timer.stop();
        info!("Ended interview session {}", session.id);
        Ok(report)
    }

    /// Validates, analyzes and persists a conversation that no longer includes
    /// its opening greeting. A failed save is logged and the report still returned.
    pub async fn conclude(
        &self,
        conversation: &[Turn],
        job: Option<&JobContext>,
        meta: RecordMeta,
    ) -> Result<AnalysisReport, AppError> {
        if conversation.len() < MIN_CONVERSATION_TURNS {
            return Err(AppError::Validation(
                "Interview too short to analyze. Please answer at least one question.".to_string(),
            ));
        }

        let report = self.analyzer.analyze(conversation, job).await?;

        let candidate = meta.candidate_name.clone();
        match self
            .store
            .create_interview(NewInterview {
                meta,
                report: report.clone(),
            })
            .await
        {
            Ok(row) => info!("Recorded interview {} for {candidate}", row.id),
            Err(e) => error!("Failed to record interview for {candidate}: {e}"),
        }

        Ok(report)
    }
}

fn record_meta(session: &Session) -> RecordMeta {
    let defaults = RecordMeta::default();
    let job = session.job.as_ref();
    RecordMeta {
        candidate_name: session.candidate_name().to_string(),
        job_id: session.job_id,
        job_role: job.map_or(defaults.job_role, |j| j.role_title.clone()),
        difficulty: job.map_or(defaults.difficulty, |j| j.difficulty.to_string()),
        duration: job
            .and_then(|j| j.duration.as_ref())
            .map_or(defaults.duration, ToString::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::models::{Difficulty, DurationInput, FEEDBACK_ENTRIES};
    use crate::interview::testing::{ScriptedChat, ScriptedTranscriber};
    use crate::store::memory::MemoryStore;

    fn controller(
        transcriber: ScriptedTranscriber,
        chat: Arc<ScriptedChat>,
        store: Arc<MemoryStore>,
    ) -> SessionController {
        SessionController::new(
            TurnProcessor::new(Arc::new(transcriber), chat.clone(), None),
            TranscriptAnalyzer::new(chat),
            store,
        )
    }

    fn job() -> JobContext {
        JobContext {
            role_title: "Backend Engineer".to_string(),
            job_description: "Own the query layer.".to_string(),
            difficulty: Difficulty::Medium,
            duration: Some(DurationInput::Label("Standard (30 min)".to_string())),
        }
    }

    #[test]
    fn test_start_opens_with_greeting_and_job_budget() {
        let c = controller(
            ScriptedTranscriber::saying("x"),
            ScriptedChat::replying(&["x"]),
            Arc::new(MemoryStore::default()),
        );
        let session = c.start(None, Some(job()), None);
        assert_eq!(session.turns.len(), 1);
        assert!(session.turns[0].content.contains("role of Backend Engineer"));
        assert_eq!(session.timer.remaining_secs(), 1800);
        assert!(session.conversation().is_empty());
        assert!(session.accepts_turns());
    }

    #[tokio::test]
    async fn test_end_to_end_scenario_scores_and_records() {
        let store = Arc::new(MemoryStore::default());
        let chat = ScriptedChat::replying(&["unused"]);
        let c = controller(ScriptedTranscriber::saying("x"), chat.clone(), store.clone());

        let job_id = Uuid::new_v4();
        let mut session = c.start(Some(job_id), Some(job()), None);
        session
            .turns
            .push(Turn::candidate("I optimized a slow query using an index"));
        session.turns.push(Turn::interviewer("Can you elaborate?"));
        session
            .turns
            .push(Turn::candidate("Sure, I added a composite index reducing scan time"));

        let report = c.end_session(&mut session).await.unwrap();
        assert_eq!(report.technical_score, 78);
        assert_eq!(report.communication_score, 85);
        assert_eq!(report.confidence_score, 72);
        assert_eq!(report.feedback.len(), FEEDBACK_ENTRIES);
        assert!(session.ended);
        assert!(!session.timer.is_counting());

        let records = store.list_interviews().await.unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.technical_score, 78);
        assert_eq!(record.communication_score, 85);
        assert_eq!(record.confidence_score, 72);
        assert_eq!(record.job_id, Some(job_id));
        assert_eq!(record.job_role, "Backend Engineer");
        assert_eq!(record.difficulty, "Medium");
        assert_eq!(record.duration, "Standard (30 min)");
        assert_eq!(record.candidate_name, "Anonymous");

        let transcript = &chat.last_request().messages[1].content;
        assert!(!transcript.contains("Hello"));
        assert!(transcript.starts_with(
            "Here is the transcript:\n\nCandidate: I optimized a slow query using an index"
        ));
    }

    #[tokio::test]
    async fn test_submitted_turns_extend_the_session() {
        let chat = ScriptedChat::replying(&["Can you elaborate?", "Thanks."]);
        let c = controller(
            ScriptedTranscriber::saying("I optimized a slow query using an index"),
            chat.clone(),
            Arc::new(MemoryStore::default()),
        );
        let mut session = c.start(None, None, None);

        let first = c
            .submit_turn(&mut session, &AudioClip::webm(vec![1]))
            .await
            .unwrap();
        assert_eq!(first.interviewer_text, "Can you elaborate?");
        c.submit_turn(&mut session, &AudioClip::webm(vec![2]))
            .await
            .unwrap();

        assert_eq!(session.turns.len(), 5);
        assert_eq!(session.conversation().len(), 4);
        // The second request carried the greeting and the first exchange.
        assert_eq!(chat.last_request().messages.len(), 5);
    }

    #[tokio::test]
    async fn test_too_short_session_is_rejected_without_analysis() {
        let store = Arc::new(MemoryStore::default());
        let chat = ScriptedChat::replying(&["x"]);
        let c = controller(ScriptedTranscriber::saying("x"), chat.clone(), store.clone());

        let mut session = c.start(None, None, None);
        session.turns.push(Turn::candidate("Just one answer"));

        let err = c.end_session(&mut session).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(chat.analysis_calls(), 0);
        assert_eq!(store.interview_count(), 0);
        assert!(!session.ended);
    }

    #[tokio::test]
    async fn test_failed_save_still_returns_report() {
        let c = controller(
            ScriptedTranscriber::saying("x"),
            ScriptedChat::replying(&["x"]),
            Arc::new(MemoryStore::failing_writes()),
        );
        let history = vec![Turn::candidate("answer"), Turn::interviewer("follow-up")];
        let report = c
            .conclude(&history, None, RecordMeta::default())
            .await
            .unwrap();
        assert_eq!(report.technical_score, 78);
    }

    #[tokio::test]
    async fn test_analysis_outage_leaves_session_open() {
        let c = controller(
            ScriptedTranscriber::saying("x"),
            ScriptedChat::failing(),
            Arc::new(MemoryStore::default()),
        );
        let mut session = c.start(None, None, None);
        session.turns.push(Turn::candidate("a"));
        session.turns.push(Turn::interviewer("b"));

        let err = c.end_session(&mut session).await.unwrap_err();
        assert!(matches!(err, AppError::Completion(_)));
        assert!(!session.ended);
        assert!(session.timer.is_counting());
    }

    #[tokio::test]
    async fn test_ended_session_rejects_turns() {
        let chat = ScriptedChat::replying(&["x"]);
        let c = controller(
            ScriptedTranscriber::saying("x"),
            chat.clone(),
            Arc::new(MemoryStore::default()),
        );
        let mut session = c.start(None, None, None);
        session.ended = true;

        let err = c
            .submit_turn(&mut session, &AudioClip::webm(vec![1]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn test_fenced_loose_analysis_is_normalized_before_recording() {
        let store = Arc::new(MemoryStore::default());
        let chat = ScriptedChat::with_analysis(
            &["unused"],
            "Sure, here it is:\n```json\n{\"technical_score\": 84.6, \"communication_score\": \"good\", \"confidence_score\": 140, \"feedback\": []}\n```",
        );
        let c = controller(ScriptedTranscriber::saying("x"), chat, store.clone());

        let mut session = c.start(None, None, None);
        session.turns.push(Turn::candidate("I cached the hot rows"));
        session.turns.push(Turn::interviewer("How did you invalidate?"));

        let report = c.end_session(&mut session).await.unwrap();
        assert_eq!(report.technical_score, 85);
        assert_eq!(report.communication_score, 70);
        assert_eq!(report.confidence_score, 100);
        assert_eq!(report.feedback, AnalysisReport::fallback_feedback());

        let records = store.list_interviews().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].technical_score, 85);
        assert_eq!(records[0].communication_score, 70);
        assert_eq!(records[0].confidence_score, 100);
        assert_eq!(records[0].feedback.0, report.feedback);
        assert_eq!(records[0].job_role, "Practice Interview");
    }
}
