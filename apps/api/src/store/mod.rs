//! Persistence collaborator for jobs and interview records.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{InterviewRow, NewInterview};
use crate::models::job::{JobRow, JobSummaryRow, JobUpdate, NewJob};

#[async_trait]
pub trait InterviewStore: Send + Sync {
    async fn create_job(&self, job: NewJob) -> Result<JobRow, AppError>;

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, AppError>;

    /// Newest first, optionally restricted to one recruiter.
    async fn list_jobs(&self, recruiter_id: Option<&str>) -> Result<Vec<JobSummaryRow>, AppError>;

    /// Returns `None` when no job has `id`.
    async fn update_job(&self, id: Uuid, update: JobUpdate) -> Result<Option<JobRow>, AppError>;

    /// Deletes the job and every interview recorded against it. Returns the
    /// number of interviews removed, or `None` when no job has `id`.
    async fn delete_job(&self, id: Uuid) -> Result<Option<u64>, AppError>;

    async fn create_interview(&self, record: NewInterview) -> Result<InterviewRow, AppError>;

    async fn get_interview(&self, id: Uuid) -> Result<Option<InterviewRow>, AppError>;

    /// Newest first.
    async fn list_interviews(&self) -> Result<Vec<InterviewRow>, AppError>;

    /// Newest first.
    async fn list_job_interviews(&self, job_id: Uuid) -> Result<Vec<InterviewRow>, AppError>;
}
