use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::{
    CreateJobRequest, JobInterviewResponse, JobListQuery, JobResponse, JobSummaryResponse,
    UpdateJobRequest,
};
use crate::routes::Envelope;
use crate::state::AppState;

fn job_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Job {id} not found"))
}

/// POST /api/jobs/create
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Envelope<JobResponse>>), AppError> {
    let job = state.store.create_job(req.validate()?).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok(job.into()))))
}

/// GET /api/jobs/all
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<Json<Envelope<Vec<JobSummaryResponse>>>, AppError> {
    let jobs = state.store.list_jobs(query.recruiter_id.as_deref()).await?;
    Ok(Json(Envelope::ok(
        jobs.into_iter().map(JobSummaryResponse::from).collect(),
    )))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<JobResponse>>, AppError> {
    let job = state.store.get_job(id).await?.ok_or_else(|| job_not_found(id))?;
    Ok(Json(Envelope::ok(job.into())))
}

/// PUT /api/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<Envelope<JobResponse>>, AppError> {
    let job = state
        .store
        .update_job(id, req.validate()?)
        .await?
        .ok_or_else(|| job_not_found(id))?;
    info!("Updated job {id}");
    Ok(Json(Envelope::ok(job.into())))
}

/// DELETE /api/jobs/:id
///
/// Also deletes every interview recorded against the job.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let removed = state
        .store
        .delete_job(id)
        .await?
        .ok_or_else(|| job_not_found(id))?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Job deleted along with {removed} interviews")
    })))
}

/// GET /api/jobs/:id/interviews
pub async fn handle_job_interviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<JobInterviewResponse>>>, AppError> {
    let interviews = state.store.list_job_interviews(id).await?;
    Ok(Json(Envelope::ok(
        interviews.into_iter().map(JobInterviewResponse::from).collect(),
    )))
}
