//! Wire types of the contest platform HTTP API.
//!
//! Field names follow the service's camelCase JSON. Date-times are naive local
//! timestamps such as `2024-05-01T10:00:00`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemSummary {
    pub id: String,
    pub title: String,
}

/// `GET /contests/{contestId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub problems: Vec<ProblemSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleTestCase {
    pub input: String,
    pub expected_output: String,
}

/// `GET /problems/{problemId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResponse {
    pub id: String,
    #[serde(default)]
    pub contest_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub statement: Option<String>,
    #[serde(default)]
    pub input_format: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub sample_test_cases: Vec<SampleTestCase>,
}

/// One row of `GET /contests/{contestId}/leaderboard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u32,
    #[serde(default)]
    pub problems_solved: u32,
    pub rank: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_submission_time: Option<NaiveDateTime>,
}

/// `POST /submissions` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub username: String,
    pub contest_id: String,
    pub problem_id: String,
    pub code: String,
    pub language: String,
}

/// Returned by both `POST /submissions` and `GET /submissions/{submissionId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_used: Option<u32>,
}

impl SubmissionResponse {
    #[must_use]
    pub fn accepted(submission_id: u64) -> Self {
        Self {
            submission_id: Some(submission_id),
            status: Some("PENDING".to_string()),
            verdict: None,
            output: None,
            submitted_at: None,
            execution_time: None,
            memory_used: None,
        }
    }

    #[must_use]
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            submission_id: None,
            status: Some(status.into()),
            verdict: None,
            output: None,
            submitted_at: None,
            execution_time: None,
            memory_used: None,
        }
    }
}
