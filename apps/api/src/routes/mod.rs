pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::interview::handlers as interview;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

/// `{"success": true, "data": ...}` wrapper used by the dashboard endpoints.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Caller-held interviews
        .route("/api/interview/process", post(interview::handle_process_turn))
        .route("/api/interview/analyze", post(interview::handle_analyze))
        .route("/api/interview/all", get(interview::handle_list_interviews))
        .route("/api/interview/:id", get(interview::handle_get_interview))
        // Server-held sessions
        .route("/api/sessions", post(interview::handle_start_session))
        .route("/api/sessions/:id", get(interview::handle_get_session))
        .route("/api/sessions/:id/turns", post(interview::handle_session_turn))
        .route("/api/sessions/:id/end", post(interview::handle_end_session))
        // Recruiter jobs
        .route("/api/jobs/all", get(jobs::handle_list_jobs))
        .route("/api/jobs/create", post(jobs::handle_create_job))
        .route(
            "/api/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/api/jobs/:id/interviews", get(jobs::handle_job_interviews))
        .with_state(state)
}
