//! In-process store for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{InterviewRow, NewInterview};
use crate::models::job::{JobRow, JobSummaryRow, JobUpdate, NewJob};
use crate::store::InterviewStore;

#[derive(Default)]
pub struct MemoryStore {
    jobs: Mutex<Vec<JobRow>>,
    interviews: Mutex<Vec<InterviewRow>>,
    fail_writes: bool,
}

impl MemoryStore {
    /// A store whose interview inserts always fail.
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn interview_count(&self) -> usize {
        self.interviews.lock().unwrap().len()
    }
}

fn newest_first<T>(mut rows: Vec<T>) -> Vec<T> {
    rows.reverse();
    rows
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn create_job(&self, job: NewJob) -> Result<JobRow, AppError> {
        let row = JobRow {
            id: Uuid::new_v4(),
            recruiter_id: job.recruiter_id,
            role_title: job.role_title,
            job_description: job.job_description,
            difficulty: job.difficulty,
            duration: job.duration,
            created_at: Utc::now(),
        };
        self.jobs.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRow>, AppError> {
        Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
    }

    async fn list_jobs(&self, recruiter_id: Option<&str>) -> Result<Vec<JobSummaryRow>, AppError> {
        let jobs = self.jobs.lock().unwrap().clone();
        let interviews = self.interviews.lock().unwrap();
        let summaries = jobs
            .into_iter()
            .filter(|j| recruiter_id.map_or(true, |r| j.recruiter_id == r))
            .map(|job| {
                let scores: Vec<f64> = interviews
                    .iter()
                    .filter(|i| i.job_id == Some(job.id))
                    .map(InterviewRow::mean_score)
                    .collect();
                let avg_score = if scores.is_empty() {
                    0
                } else {
                    (scores.iter().sum::<f64>() / scores.len() as f64).round() as i64
                };
                JobSummaryRow {
                    job,
                    interview_count: scores.len() as i64,
                    avg_score,
                }
            })
            .collect();
        Ok(newest_first(summaries))
    }

    async fn update_job(&self, id: Uuid, update: JobUpdate) -> Result<Option<JobRow>, AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.iter_mut().find(|j| j.id == id) else {
            return Ok(None);
        };
        if let Some(title) = update.role_title {
            job.role_title = title;
        }
        if let Some(description) = update.job_description {
            job.job_description = description;
        }
        if let Some(difficulty) = update.difficulty {
            job.difficulty = difficulty;
        }
        if let Some(duration) = update.duration {
            job.duration = duration;
        }
        Ok(Some(job.clone()))
    }

    async fn delete_job(&self, id: Uuid) -> Result<Option<u64>, AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        if jobs.len() == before {
            return Ok(None);
        }
        let mut interviews = self.interviews.lock().unwrap();
        let before = interviews.len();
        interviews.retain(|i| i.job_id != Some(id));
        Ok(Some((before - interviews.len()) as u64))
    }

    async fn create_interview(&self, record: NewInterview) -> Result<InterviewRow, AppError> {
        if self.fail_writes {
            return Err(AppError::Database(sqlx::Error::PoolClosed));
        }
        let NewInterview { meta, report } = record;
        let row = InterviewRow {
            id: Uuid::new_v4(),
            candidate_name: meta.candidate_name,
            job_id: meta.job_id,
            job_role: meta.job_role,
            difficulty: meta.difficulty,
            duration: meta.duration,
            technical_score: i32::from(report.technical_score),
            communication_score: i32::from(report.communication_score),
            confidence_score: i32::from(report.confidence_score),
            feedback: Json(report.feedback),
            created_at: Utc::now(),
        };
        self.interviews.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn get_interview(&self, id: Uuid) -> Result<Option<InterviewRow>, AppError> {
        Ok(self
            .interviews
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn list_interviews(&self) -> Result<Vec<InterviewRow>, AppError> {
        Ok(newest_first(self.interviews.lock().unwrap().clone()))
    }

    async fn list_job_interviews(&self, job_id: Uuid) -> Result<Vec<InterviewRow>, AppError> {
        let rows = self
            .interviews
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.job_id == Some(job_id))
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::models::{AnalysisReport, Difficulty};
    use crate::models::interview::RecordMeta;

    fn new_job(recruiter: &str) -> NewJob {
        NewJob {
            recruiter_id: recruiter.to_string(),
            role_title: "Backend Engineer".to_string(),
            job_description: "Rust services".to_string(),
            difficulty: Difficulty::Medium,
            duration: 30,
        }
    }

    fn record(job_id: Option<Uuid>, score: u8) -> NewInterview {
        NewInterview {
            meta: RecordMeta {
                job_id,
                ..RecordMeta::default()
            },
            report: AnalysisReport {
                technical_score: score,
                communication_score: score,
                confidence_score: score,
                feedback: AnalysisReport::fallback_feedback(),
            },
        }
    }

    #[tokio::test]
    async fn test_delete_job_cascades_to_its_interviews_only() {
        let store = MemoryStore::default();
        let job = store.create_job(new_job("r1")).await.unwrap();
        let other = store.create_job(new_job("r1")).await.unwrap();
        store.create_interview(record(Some(job.id), 80)).await.unwrap();
        store.create_interview(record(Some(job.id), 60)).await.unwrap();
        store.create_interview(record(Some(other.id), 50)).await.unwrap();
        store.create_interview(record(None, 40)).await.unwrap();

        assert_eq!(store.delete_job(job.id).await.unwrap(), Some(2));
        assert!(store.get_job(job.id).await.unwrap().is_none());
        assert!(store.list_job_interviews(job.id).await.unwrap().is_empty());
        assert_eq!(store.interview_count(), 2);

        assert_eq!(store.delete_job(job.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_jobs_reports_count_and_average() {
        let store = MemoryStore::default();
        let job = store.create_job(new_job("r1")).await.unwrap();
        store.create_job(new_job("r2")).await.unwrap();
        store.create_interview(record(Some(job.id), 80)).await.unwrap();
        store.create_interview(record(Some(job.id), 65)).await.unwrap();

        let mine = store.list_jobs(Some("r1")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].interview_count, 2);
        assert_eq!(mine[0].avg_score, 73);

        let all = store.list_jobs(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].job.recruiter_id, "r2");
        assert_eq!(all[0].avg_score, 0);
    }
}
