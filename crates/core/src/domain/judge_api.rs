use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

use super::{
    Contest, ContestId, Language, LeaderboardEntry, ProblemDetail, ProblemId, SubmissionId,
    SubmissionStatus, Username,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub username: Username,
    pub contest_id: ContestId,
    pub problem_id: ProblemId,
    pub language: Language,
    pub source_code: String,
}

/// One answer to a status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: SubmissionStatus,
    pub verdict: Option<String>,
    pub output: Option<String>,
    pub execution_time_ms: Option<u32>,
    pub memory_used_kb: Option<u32>,
    pub submitted_at: Option<NaiveDateTime>,
}

impl StatusReport {
    pub fn new(status: SubmissionStatus) -> Self {
        Self {
            status,
            verdict: None,
            output: None,
            execution_time_ms: None,
            memory_used_kb: None,
            submitted_at: None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JudgeApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("judge service unreachable: {0}")]
    Transport(String),
    #[error("judge service responded with status {0}")]
    Status(u16),
    #[error("invalid response from judge service: {0}")]
    InvalidResponse(String),
}

/// Contract of the remote judging service and its read endpoints.
#[async_trait]
pub trait JudgeApi: Send + Sync {
    async fn get_contest(&self, contest_id: &ContestId) -> Result<Contest, JudgeApiError>;

    async fn get_problem(&self, problem_id: &ProblemId) -> Result<ProblemDetail, JudgeApiError>;

    /// Entries in service order.
    async fn get_leaderboard(
        &self,
        contest_id: &ContestId,
    ) -> Result<Vec<LeaderboardEntry>, JudgeApiError>;

    async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionId, JudgeApiError>;

    async fn submission_status(
        &self,
        submission_id: SubmissionId,
    ) -> Result<StatusReport, JudgeApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_report_has_no_details() {
        let report = StatusReport::new(SubmissionStatus::Pending);

        assert_eq!(report.status, SubmissionStatus::Pending);
        assert!(report.verdict.is_none());
        assert!(report.execution_time_ms.is_none());
    }

    #[test]
    fn api_errors_render_for_logs() {
        assert_eq!(
            JudgeApiError::NotFound("contest nope".to_string()).to_string(),
            "not found: contest nope"
        );
        assert_eq!(
            JudgeApiError::Status(503).to_string(),
            "judge service responded with status 503"
        );
    }
}
