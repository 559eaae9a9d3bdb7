use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::interview::models::{AnalysisReport, FeedbackEntry};

/// A persisted interview outcome. Immutable once created; removed only when
/// its job is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRow {
    pub id: Uuid,
    pub candidate_name: String,
    pub job_id: Option<Uuid>,
    pub job_role: String,
    pub difficulty: String,
    pub duration: String,
    pub technical_score: i32,
    pub communication_score: i32,
    pub confidence_score: i32,
    pub feedback: Json<Vec<FeedbackEntry>>,
    pub created_at: DateTime<Utc>,
}

impl InterviewRow {
    pub fn mean_score(&self) -> f64 {
        f64::from(self.technical_score + self.communication_score + self.confidence_score) / 3.0
    }

    pub fn average_score(&self) -> i64 {
        self.mean_score().round() as i64
    }
}

/// Metadata recorded alongside a report.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMeta {
    pub candidate_name: String,
    pub job_id: Option<Uuid>,
    pub job_role: String,
    pub difficulty: String,
    pub duration: String,
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self {
            candidate_name: "Anonymous".to_string(),
            job_id: None,
            job_role: "Practice Interview".to_string(),
            difficulty: "N/A".to_string(),
            duration: "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub meta: RecordMeta,
    pub report: AnalysisReport,
}
