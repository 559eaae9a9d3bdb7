//! Server-held interview sessions.
//!
//! Each live session owns its `Session` value behind a mutex that is never held
//! across an await. A countdown task ticks the session clock, raises the
//! one-minute advisory and, on expiry, appends the closing message and ends the
//! session after `TERMINATION_DELAY`. External calls run on a snapshot; only one
//! turn or analysis may be in flight per session. A session leaves the registry
//! `COMPLETED_RETENTION` after it completes or expires, whichever comes first,
//! even if its automatic end failed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::controller::SessionController;
use crate::interview::models::{AnalysisReport, CandidateContext, JobContext, Session, Turn};
use crate::interview::prompts::CLOSING_MESSAGE;
use crate::interview::timer::{
    spawn_countdown, Countdown, CountdownHandle, Tick, TimerEvent, TimerPhase, ADVISORY_TTL,
    TERMINATION_DELAY, WARNING_MESSAGE,
};
use crate::interview::turn::TurnResult;
use crate::llm_client::AudioClip;

/// How long a finished session stays readable before it is dropped.
pub const COMPLETED_RETENTION: Duration = Duration::from_secs(600);

type SessionMap = Arc<Mutex<HashMap<Uuid, Arc<LiveSession>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Active,
    ProcessingTurn,
    Analyzing,
    Completed,
}

#[derive(Debug, Clone, Copy)]
struct Advisory {
    message: &'static str,
    raised_at: Instant,
}

impl Advisory {
    fn visible(&self) -> Option<&'static str> {
        (self.raised_at.elapsed() < ADVISORY_TTL).then_some(self.message)
    }
}

struct LiveState {
    session: Session,
    activity: Activity,
    advisory: Option<Advisory>,
    report: Option<AnalysisReport>,
    /// Expiry arrived while a turn was in flight; end once it lands.
    end_pending: bool,
    eviction_scheduled: bool,
    countdown: Option<CountdownHandle>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub job_id: Option<Uuid>,
    pub turns: Vec<Turn>,
    pub remaining_secs: u32,
    pub timer_phase: TimerPhase,
    pub advisory: Option<&'static str>,
    pub status: Activity,
    pub report: Option<AnalysisReport>,
}

pub struct LiveSession {
    id: Uuid,
    controller: SessionController,
    state: Mutex<LiveState>,
    sessions: SessionMap,
}

impl LiveSession {
    pub fn view(&self) -> SessionView {
        let state = lock(&self.state);
        SessionView {
            id: state.session.id,
            job_id: state.session.job_id,
            turns: state.session.turns.clone(),
            remaining_secs: state.session.timer.remaining_secs(),
            timer_phase: state.session.timer.phase(),
            advisory: state.advisory.and_then(|a| a.visible()),
            status: state.activity,
            report: state.report.clone(),
        }
    }

    pub async fn submit_turn(self: &Arc<Self>, audio: AudioClip) -> Result<TurnResult, AppError> {
        let (mut snapshot, base_len) = {
            let mut state = lock(&self.state);
            match state.activity {
                Activity::Active => {}
                Activity::ProcessingTurn => {
                    return Err(AppError::Conflict(
                        "Your previous answer is still being processed".to_string(),
                    ))
                }
                Activity::Analyzing | Activity::Completed => {
                    return Err(AppError::Validation("This interview has ended".to_string()))
                }
            }
            if !state.session.accepts_turns() {
                return Err(AppError::Validation("Interview time is over".to_string()));
            }
            state.activity = Activity::ProcessingTurn;
            (state.session.clone(), state.session.turns.len())
        };

        let outcome = self.controller.submit_turn(&mut snapshot, &audio).await;

        let end_pending = {
            let mut state = lock(&self.state);
            state.activity = Activity::Active;
            if outcome.is_ok() {
                // The closing message may have landed meanwhile; keep it last.
                let exchange = snapshot.turns.split_off(base_len);
                let tail = state.session.turns.split_off(base_len);
                state.session.turns.extend(exchange);
                state.session.turns.extend(tail);
            }
            std::mem::take(&mut state.end_pending)
        };

        if end_pending {
            let live = Arc::clone(self);
            tokio::spawn(async move { live.finish_on_expiry().await });
        }

        outcome
    }

    /// Ends the session and returns its report. Ending a completed session
    /// returns the report it already produced.
    pub async fn end(&self) -> Result<AnalysisReport, AppError> {
        self.end_after_turn(false).await
    }

    /// With `defer_to_turn`, a turn in flight marks the session to be ended
    /// as soon as that turn lands.
    async fn end_after_turn(&self, defer_to_turn: bool) -> Result<AnalysisReport, AppError> {
        let mut snapshot = {
            let mut state = lock(&self.state);
            match state.activity {
                Activity::Active => {}
                Activity::ProcessingTurn => {
                    state.end_pending |= defer_to_turn;
                    return Err(AppError::Conflict(
                        "Wait for the current answer to finish processing".to_string(),
                    ))
                }
                Activity::Analyzing => {
                    return Err(AppError::Conflict(
                        "This interview is already being analyzed".to_string(),
                    ))
                }
                Activity::Completed => {
                    return state.report.clone().ok_or_else(|| {
                        AppError::Validation(
                            "This interview ended before any answers were given".to_string(),
                        )
                    })
                }
            }
            state.activity = Activity::Analyzing;
            state.session.clone()
        };

        let outcome = self.controller.end_session(&mut snapshot).await;

        let mut state = lock(&self.state);
        match outcome {
            Ok(report) => {
                state.session.ended = true;
                state.session.timer.stop();
                state.report = Some(report.clone());
                self.complete(&mut state);
                Ok(report)
            }
            Err(e) => {
                state.activity = Activity::Active;
                Err(e)
            }
        }
    }

    async fn finish_on_expiry(&self) {
        match self.end_after_turn(true).await {
            Ok(_) => info!("Session {} ended automatically", self.id),
            Err(AppError::Validation(reason)) => {
                warn!("Session {} expired without a scorable conversation: {reason}", self.id);
                let mut state = lock(&self.state);
                state.session.ended = true;
                self.complete(&mut state);
            }
            Err(AppError::Conflict(reason)) => {
                info!("Automatic end of session {} deferred: {reason}", self.id)
            }
            Err(e) => warn!("Automatic end of session {} failed: {e}", self.id),
        }
    }

    fn complete(&self, state: &mut LiveState) {
        state.activity = Activity::Completed;
        if let Some(countdown) = state.countdown.take() {
            countdown.cancel();
        }
        self.schedule_eviction(state);
    }

    fn schedule_eviction(&self, state: &mut LiveState) {
        if std::mem::replace(&mut state.eviction_scheduled, true) {
            return;
        }
        let sessions = Arc::clone(&self.sessions);
        let id = self.id;
        tokio::spawn(async move {
            tokio::time::sleep(COMPLETED_RETENTION).await;
            lock(&sessions).remove(&id);
        });
    }
}

#[async_trait]
impl Countdown for LiveSession {
    async fn tick(&self) -> Tick {
        let mut state = lock(&self.state);
        if !state.session.timer.is_counting() {
            return Tick::Stopped;
        }
        match state.session.timer.tick() {
            Some(event) => Tick::Event(event),
            None => Tick::Counting,
        }
    }

    async fn on_event(&self, event: TimerEvent) {
        match event {
            TimerEvent::Warning => {
                lock(&self.state).advisory = Some(Advisory {
                    message: WARNING_MESSAGE,
                    raised_at: Instant::now(),
                });
                info!("Session {} has one minute left", self.id);
            }
            TimerEvent::Expired => {
                {
                    let mut state = lock(&self.state);
                    state.session.turns.push(Turn::interviewer(CLOSING_MESSAGE));
                    self.schedule_eviction(&mut state);
                }
                info!("Session {} ran out of time", self.id);
                tokio::time::sleep(TERMINATION_DELAY).await;
                self.finish_on_expiry().await;
            }
        }
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    controller: SessionController,
    sessions: SessionMap,
}

impl SessionRegistry {
    pub fn new(controller: SessionController) -> Self {
        Self {
            controller,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Starts a session and its countdown.
    pub fn start(
        &self,
        job_id: Option<Uuid>,
        job: Option<JobContext>,
        candidate: Option<CandidateContext>,
    ) -> SessionView {
        let mut session = self.controller.start(job_id, job, candidate);
        let advisory = (session.timer.begin() == Some(TimerEvent::Warning)).then(|| Advisory {
            message: WARNING_MESSAGE,
            raised_at: Instant::now(),
        });
        let id = session.id;

        let live = Arc::new(LiveSession {
            id,
            controller: self.controller.clone(),
            state: Mutex::new(LiveState {
                session,
                activity: Activity::Active,
                advisory,
                report: None,
                end_pending: false,
                eviction_scheduled: false,
                countdown: None,
            }),
            sessions: Arc::clone(&self.sessions),
        });
        let countdown = spawn_countdown(Arc::clone(&live));
        lock(&live.state).countdown = Some(countdown);

        lock(&self.sessions).insert(id, Arc::clone(&live));
        live.view()
    }

    pub fn get(&self, id: Uuid) -> Result<Arc<LiveSession>, AppError> {
        lock(&self.sessions)
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Interview session {id} not found")))
    }

    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }
}
