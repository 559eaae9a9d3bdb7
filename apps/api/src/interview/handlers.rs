use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::{
    without_greeting, AnalysisReport, CandidateContext, DurationInput, JobContext, Turn,
};
use crate::interview::registry::SessionView;
use crate::interview::turn::TurnResult;
use crate::llm_client::AudioClip;
use crate::models::interview::{InterviewRow, RecordMeta};
use crate::routes::Envelope;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub analysis: AnalysisReport,
}

impl From<AnalysisReport> for AnalysisResponse {
    fn from(analysis: AnalysisReport) -> Self {
        Self {
            success: true,
            analysis,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub history: Vec<Turn>,
    pub candidate_name: Option<String>,
    pub job_id: Option<Uuid>,
    pub job_role: Option<String>,
    pub difficulty: Option<String>,
    pub duration: Option<DurationInput>,
    pub job_context: Option<JobContext>,
}

impl AnalyzeRequest {
    fn record_meta(&self) -> RecordMeta {
        fn present(value: &Option<String>) -> Option<String> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
        }
        let defaults = RecordMeta::default();
        RecordMeta {
            candidate_name: present(&self.candidate_name).unwrap_or(defaults.candidate_name),
            job_id: self.job_id,
            job_role: present(&self.job_role).unwrap_or(defaults.job_role),
            difficulty: present(&self.difficulty).unwrap_or(defaults.difficulty),
            duration: self
                .duration
                .as_ref()
                .map_or(defaults.duration, ToString::to_string),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub job_id: Option<Uuid>,
    pub job: Option<JobContext>,
    pub candidate: Option<CandidateContext>,
}

/// Multipart fields of one submitted turn.
#[derive(Default)]
struct TurnForm {
    audio: Option<AudioClip>,
    history: Vec<Turn>,
    candidate: Option<CandidateContext>,
    job: Option<JobContext>,
}

fn bad_form(e: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("Malformed form data: {e}"))
}

async fn read_audio(field: Field<'_>) -> Result<AudioClip, AppError> {
    let file_name = field.file_name().unwrap_or("answer.webm").to_string();
    let mime_type = field.content_type().unwrap_or("audio/webm").to_string();
    let bytes: Bytes = field.bytes().await.map_err(bad_form)?;
    Ok(AudioClip {
        bytes,
        file_name,
        mime_type,
    })
}

/// Parses a JSON form field; blank or `null` means absent.
fn json_field<T: DeserializeOwned>(name: &str, raw: &str) -> Result<Option<T>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Option<T>>(raw)
        .map_err(|e| AppError::Validation(format!("Field '{name}' is not valid JSON: {e}")))
}

async fn read_turn_form(mut multipart: Multipart) -> Result<TurnForm, AppError> {
    let mut form = TurnForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => form.audio = Some(read_audio(field).await?),
            "history" => {
                let text = field.text().await.map_err(bad_form)?;
                form.history = json_field(&name, &text)?.unwrap_or_default();
            }
            "context" => {
                let text = field.text().await.map_err(bad_form)?;
                form.candidate = json_field(&name, &text)?;
            }
            "jobContext" => {
                let text = field.text().await.map_err(bad_form)?;
                form.job = json_field(&name, &text)?;
            }
            _ => {}
        }
    }
    Ok(form)
}

fn require_audio(audio: Option<AudioClip>) -> Result<AudioClip, AppError> {
    audio.ok_or_else(|| AppError::Validation("No audio file provided".to_string()))
}

/// POST /api/interview/process
///
/// One exchange against caller-held history.
pub async fn handle_process_turn(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TurnResult>, AppError> {
    let form = read_turn_form(multipart).await?;
    let audio = require_audio(form.audio)?;
    let result = state
        .turns
        .process_turn(&audio, &form.history, form.job.as_ref(), form.candidate.as_ref())
        .await?;
    Ok(Json(result))
}

/// POST /api/interview/analyze
///
/// Scores caller-held history and records the result.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let meta = req.record_meta();
    info!("Analyzing interview for {} ({})", meta.candidate_name, meta.job_role);
    let report = state
        .controller
        .conclude(without_greeting(&req.history), req.job_context.as_ref(), meta)
        .await?;
    Ok(Json(report.into()))
}

/// GET /api/interview/all
pub async fn handle_list_interviews(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<InterviewRow>>>, AppError> {
    Ok(Json(Envelope::ok(state.store.list_interviews().await?)))
}

/// GET /api/interview/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<InterviewRow>>, AppError> {
    let record = state
        .store
        .get_interview(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;
    Ok(Json(Envelope::ok(record)))
}

/// POST /api/sessions
///
/// A stored job, when referenced, takes precedence over an inline one.
pub async fn handle_start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let job = match req.job_id {
        Some(id) => Some(
            state
                .store
                .get_job(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?
                .context(),
        ),
        None => req.job,
    };
    let view = state.registry.start(req.job_id, job, req.candidate);
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.registry.get(id)?.view()))
}

/// POST /api/sessions/:id/turns
pub async fn handle_session_turn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<TurnResult>, AppError> {
    let live = state.registry.get(id)?;
    let form = read_turn_form(multipart).await?;
    let audio = require_audio(form.audio)?;
    Ok(Json(live.submit_turn(audio).await?))
}

/// POST /api/sessions/:id/end
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let report = state.registry.get(id)?.end().await?;
    Ok(Json(report.into()))
}
