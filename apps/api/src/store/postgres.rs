use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{InterviewRow, NewInterview};
use crate::models::job::{JobRow, JobSummaryRow, JobUpdate, NewJob};
use crate::store::InterviewStore;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterviewStore for PgStore {
    async fn create_job(&self, job: NewJob) -> Result<JobRow, AppError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, recruiter_id, role_title, job_description, difficulty, duration)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&job.recruiter_id)
        .bind(&job.role_title)
        .bind(&job.job_description)
        .bind(job.difficulty)
        .bind(job.duration)
        .fetch_one(&self.pool)
        .await?;

        info!("Created job {} for recruiter {}", row.id, row.recruiter_id);
        Ok(row)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, AppError> {
        Ok(sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_jobs(&self, recruiter_id: Option<&str>) -> Result<Vec<JobSummaryRow>, AppError> {
        Ok(sqlx::query_as::<_, JobSummaryRow>(
            r#"
            SELECT j.*,
                   COUNT(i.id) AS interview_count,
                   COALESCE(
                       ROUND(AVG((i.technical_score + i.communication_score + i.confidence_score) / 3.0)),
                       0
                   )::BIGINT AS avg_score
            FROM jobs j
            LEFT JOIN interviews i ON i.job_id = j.id
            WHERE $1::TEXT IS NULL OR j.recruiter_id = $1
            GROUP BY j.id
            ORDER BY j.created_at DESC
            "#,
        )
        .bind(recruiter_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_job(&self, id: Uuid, update: JobUpdate) -> Result<Option<JobRow>, AppError> {
        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs SET
                role_title      = COALESCE($2, role_title),
                job_description = COALESCE($3, job_description),
                difficulty      = COALESCE($4, difficulty),
                duration        = COALESCE($5, duration)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.role_title)
        .bind(update.job_description)
        .bind(update.difficulty)
        .bind(update.duration)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_job(&self, id: Uuid) -> Result<Option<u64>, AppError> {
        let deleted = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Ok(None);
        }

        // Not transactional: a failure here leaves orphaned interviews behind.
        let removed = sqlx::query("DELETE FROM interviews WHERE job_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        info!("Deleted job {id} and {removed} interview(s)");
        Ok(Some(removed))
    }

    async fn create_interview(&self, record: NewInterview) -> Result<InterviewRow, AppError> {
        let NewInterview { meta, report } = record;
        let row = sqlx::query_as::<_, InterviewRow>(
            r#"
            INSERT INTO interviews
                (id, candidate_name, job_id, job_role, difficulty, duration,
                 technical_score, communication_score, confidence_score, feedback)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&meta.candidate_name)
        .bind(meta.job_id)
        .bind(&meta.job_role)
        .bind(&meta.difficulty)
        .bind(&meta.duration)
        .bind(i32::from(report.technical_score))
        .bind(i32::from(report.communication_score))
        .bind(i32::from(report.confidence_score))
        .bind(Json(&report.feedback))
        .fetch_one(&self.pool)
        .await?;

        info!("Saved interview {} for {}", row.id, row.candidate_name);
        Ok(row)
    }

    async fn get_interview(&self, id: Uuid) -> Result<Option<InterviewRow>, AppError> {
        Ok(sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_interviews(&self) -> Result<Vec<InterviewRow>, AppError> {
        Ok(sqlx::query_as::<_, InterviewRow>(
            "SELECT * FROM interviews ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_job_interviews(&self, job_id: Uuid) -> Result<Vec<InterviewRow>, AppError> {
        Ok(sqlx::query_as::<_, InterviewRow>(
            "SELECT * FROM interviews WHERE job_id = $1 ORDER BY created_at DESC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
