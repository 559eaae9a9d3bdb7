use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::interview::models::{Difficulty, DurationInput, JobContext};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub recruiter_id: String,
    pub role_title: String,
    pub job_description: String,
    pub difficulty: Difficulty,
    /// Minutes, 1–120.
    pub duration: i32,
    pub created_at: DateTime<Utc>,
}

impl JobRow {
    /// The read-only view of this posting that drives an interview session.
    pub fn context(&self) -> JobContext {
        JobContext {
            role_title: self.role_title.clone(),
            job_description: self.job_description.clone(),
            difficulty: self.difficulty,
            duration: Some(DurationInput::Minutes(f64::from(self.duration))),
        }
    }
}

/// A job with aggregate interview stats for the recruiter dashboard.
#[derive(Debug, Clone, FromRow)]
pub struct JobSummaryRow {
    #[sqlx(flatten)]
    pub job: JobRow,
    pub interview_count: i64,
    /// Mean of the per-interview mean scores, rounded; 0 when there are none.
    pub avg_score: i64,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub recruiter_id: String,
    pub role_title: String,
    pub job_description: String,
    pub difficulty: Difficulty,
    pub duration: i32,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub role_title: Option<String>,
    pub job_description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub duration: Option<i32>,
}
