//! Recruiter job postings: request validation and response shapes.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::{Difficulty, FeedbackEntry};
use crate::models::interview::InterviewRow;
use crate::models::job::{JobRow, JobSummaryRow, JobUpdate, NewJob};

pub const DEFAULT_DURATION_MINUTES: i32 = 15;
pub const MIN_DURATION_MINUTES: i32 = 1;
pub const MAX_DURATION_MINUTES: i32 = 120;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub recruiter_id: Option<String>,
    pub role_title: Option<String>,
    pub job_description: Option<String>,
    pub difficulty: Option<String>,
    /// Minutes as a number or a numeric string.
    pub duration: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub role_title: Option<String>,
    pub job_description: Option<String>,
    pub difficulty: Option<String>,
    pub duration: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListQuery {
    pub recruiter_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: Uuid,
    pub recruiter_id: String,
    pub role_title: String,
    pub job_description: String,
    pub difficulty: Difficulty,
    pub duration: i32,
    pub created_at: DateTime<Utc>,
}

impl From<JobRow> for JobResponse {
    fn from(row: JobRow) -> Self {
        Self {
            id: row.id,
            recruiter_id: row.recruiter_id,
            role_title: row.role_title,
            job_description: row.job_description,
            difficulty: row.difficulty,
            duration: row.duration,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummaryResponse {
    #[serde(flatten)]
    pub job: JobResponse,
    pub interview_count: i64,
    pub avg_score: i64,
}

impl From<JobSummaryRow> for JobSummaryResponse {
    fn from(row: JobSummaryRow) -> Self {
        Self {
            job: row.job.into(),
            interview_count: row.interview_count,
            avg_score: row.avg_score,
        }
    }
}

/// One candidate's result as shown on a job's page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInterviewResponse {
    pub id: Uuid,
    pub candidate_name: String,
    pub technical_score: i32,
    pub communication_score: i32,
    pub confidence_score: i32,
    pub average_score: i64,
    pub feedback: Vec<FeedbackEntry>,
    pub created_at: DateTime<Utc>,
}

impl From<InterviewRow> for JobInterviewResponse {
    fn from(row: InterviewRow) -> Self {
        let average_score = row.average_score();
        Self {
            id: row.id,
            candidate_name: row.candidate_name,
            technical_score: row.technical_score,
            communication_score: row.communication_score,
            confidence_score: row.confidence_score,
            average_score,
            feedback: row.feedback.0,
            created_at: row.created_at,
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing required field: {field}")))
}

fn parse_difficulty(raw: &str) -> Result<Difficulty, AppError> {
    match raw {
        "Easy" => Ok(Difficulty::Easy),
        "Medium" => Ok(Difficulty::Medium),
        "Hard" => Ok(Difficulty::Hard),
        _ => Err(AppError::Validation(
            "Difficulty must be Easy, Medium, or Hard".to_string(),
        )),
    }
}

/// Leading integer of `text` after optional whitespace and sign, e.g. "30 min" -> 30.
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<i64>().ok().map(|n| sign * n)
}

fn duration_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64),
        Value::String(s) => leading_int(s),
        _ => None,
    }
}

fn check_duration_bounds(minutes: i64) -> Result<i32, AppError> {
    if (i64::from(MIN_DURATION_MINUTES)..=i64::from(MAX_DURATION_MINUTES)).contains(&minutes) {
        // Bounded above, so the cast is lossless.
        Ok(minutes as i32)
    } else {
        Err(AppError::Validation(format!(
            "Duration must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES} minutes"
        )))
    }
}

/// Missing, unparseable or zero durations become the default; anything else
/// must fall within bounds.
fn parse_create_duration(value: Option<&Value>) -> Result<i32, AppError> {
    let minutes = value
        .and_then(duration_value)
        .filter(|m| *m != 0)
        .unwrap_or(i64::from(DEFAULT_DURATION_MINUTES));
    check_duration_bounds(minutes)
}

impl CreateJobRequest {
    pub fn validate(self) -> Result<NewJob, AppError> {
        let recruiter_id = required(self.recruiter_id, "recruiterId")?;
        let role_title = required(self.role_title, "roleTitle")?;
        let job_description = required(self.job_description, "jobDescription")?;
        let difficulty = parse_difficulty(&required(self.difficulty, "difficulty")?)?;
        let duration = parse_create_duration(self.duration.as_ref())?;

        Ok(NewJob {
            recruiter_id,
            role_title,
            job_description,
            difficulty,
            duration,
        })
    }
}

impl UpdateJobRequest {
    /// Absent fields are left unchanged; present fields are validated like on create.
    pub fn validate(self) -> Result<JobUpdate, AppError> {
        let role_title = self
            .role_title
            .map(|v| required(Some(v), "roleTitle"))
            .transpose()?;
        let job_description = self
            .job_description
            .map(|v| required(Some(v), "jobDescription"))
            .transpose()?;
        let difficulty = self
            .difficulty
            .as_deref()
            .map(parse_difficulty)
            .transpose()?;
        let duration = self
            .duration
            .as_ref()
            .map(|v| {
                duration_value(v)
                    .ok_or_else(|| AppError::Validation("Duration must be a number".to_string()))
                    .and_then(check_duration_bounds)
            })
            .transpose()?;

        Ok(JobUpdate {
            role_title,
            job_description,
            difficulty,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> CreateJobRequest {
        serde_json::from_value(body).unwrap()
    }

    fn valid() -> Value {
        json!({
            "recruiterId": "user_123",
            "roleTitle": "Backend Engineer",
            "jobDescription": "Rust and Postgres",
            "difficulty": "Hard",
            "duration": 30
        })
    }

    #[test]
    fn test_valid_job_passes() {
        let job = request(valid()).validate().unwrap();
        assert_eq!(job.difficulty, Difficulty::Hard);
        assert_eq!(job.duration, 30);
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        for field in ["recruiterId", "roleTitle", "jobDescription", "difficulty"] {
            let mut body = valid();
            body.as_object_mut().unwrap().remove(field);
            let err = request(body).validate().unwrap_err();
            assert!(
                matches!(&err, AppError::Validation(msg) if msg.contains(field)),
                "{field}: {err}"
            );
        }
    }

    #[test]
    fn test_unknown_difficulty_is_rejected() {
        let mut body = valid();
        body["difficulty"] = json!("Extreme");
        assert!(matches!(
            request(body).validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_duration_defaults_and_bounds() {
        let with = |d: Value| {
            let mut body = valid();
            body["duration"] = d;
            request(body).validate()
        };
        assert_eq!(with(Value::Null).unwrap().duration, 15);
        assert_eq!(with(json!("45 minutes")).unwrap().duration, 45);
        assert_eq!(with(json!("soon")).unwrap().duration, 15);
        assert_eq!(with(json!(0)).unwrap().duration, 15);
        assert_eq!(with(json!(120)).unwrap().duration, 120);
        assert!(with(json!(121)).is_err());
        assert!(with(json!(-5)).is_err());
    }

    #[test]
    fn test_update_validates_only_present_fields() {
        let update: UpdateJobRequest =
            serde_json::from_value(json!({"difficulty": "Easy", "duration": "20"})).unwrap();
        let update = update.validate().unwrap();
        assert_eq!(update.difficulty, Some(Difficulty::Easy));
        assert_eq!(update.duration, Some(20));
        assert!(update.role_title.is_none());

        let bad: UpdateJobRequest = serde_json::from_value(json!({"duration": 500})).unwrap();
        assert!(bad.validate().is_err());
        let blank: UpdateJobRequest = serde_json::from_value(json!({"roleTitle": "  "})).unwrap();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_summary_flattens_stats_into_job() {
        let row = JobSummaryRow {
            job: JobRow {
                id: Uuid::new_v4(),
                recruiter_id: "user_123".to_string(),
                role_title: "Backend Engineer".to_string(),
                job_description: "Rust".to_string(),
                difficulty: Difficulty::Medium,
                duration: 15,
                created_at: Utc::now(),
            },
            interview_count: 2,
            avg_score: 73,
        };
        let json = serde_json::to_value(JobSummaryResponse::from(row)).unwrap();
        assert_eq!(json["roleTitle"], "Backend Engineer");
        assert_eq!(json["interviewCount"], 2);
        assert_eq!(json["avgScore"], 73);
    }
}
