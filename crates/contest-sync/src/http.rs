//! 基于 HTTP + JSON 的评测服务客户端。

use std::time::Duration;

use async_trait::async_trait;
use contest_api_types as wire;
use contest_core::domain::{
    Contest, ContestId, JudgeApi, JudgeApiError, LeaderboardEntry, ProblemDetail, ProblemId,
    ProblemSummary, SampleTestCase, StatusReport, SubmissionId, SubmissionRequest,
    SubmissionStatus,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::Result;

/// 评测服务 HTTP 客户端。
#[derive(Debug, Clone)]
pub struct HttpJudgeApi {
    client: Client,
    base_url: String,
}

impl HttpJudgeApi {
    /// 使用配置中的服务地址与请求超时创建客户端。
    pub fn new(config: &SyncConfig) -> Result<Self> {
        Self::with_timeout(&config.api_base_url, config.request_timeout())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> std::result::Result<T, JudgeApiError> {
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status();
        debug!(resource, status = status.as_u16(), "judge service responded");

        if status == StatusCode::NOT_FOUND {
            return Err(JudgeApiError::NotFound(resource.to_string()));
        }
        if !status.is_success() {
            return Err(JudgeApiError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| JudgeApiError::InvalidResponse(err.to_string()))
    }
}

#[async_trait]
impl JudgeApi for HttpJudgeApi {
    async fn get_contest(
        &self,
        contest_id: &ContestId,
    ) -> std::result::Result<Contest, JudgeApiError> {
        let request = self.client.get(self.url(&format!("/contests/{contest_id}")));
        let contest: wire::ContestResponse =
            self.fetch(request, &format!("contest {contest_id}")).await?;
        Ok(map_contest(contest))
    }

    async fn get_problem(
        &self,
        problem_id: &ProblemId,
    ) -> std::result::Result<ProblemDetail, JudgeApiError> {
        let request = self.client.get(self.url(&format!("/problems/{problem_id}")));
        let problem: wire::ProblemResponse =
            self.fetch(request, &format!("problem {problem_id}")).await?;
        Ok(map_problem(problem))
    }

    async fn get_leaderboard(
        &self,
        contest_id: &ContestId,
    ) -> std::result::Result<Vec<LeaderboardEntry>, JudgeApiError> {
        let request = self
            .client
            .get(self.url(&format!("/contests/{contest_id}/leaderboard")));
        let entries: Vec<wire::LeaderboardEntry> = self
            .fetch(request, &format!("leaderboard of contest {contest_id}"))
            .await?;
        Ok(entries.into_iter().map(map_leaderboard_entry).collect())
    }

    async fn submit(
        &self,
        request: SubmissionRequest,
    ) -> std::result::Result<SubmissionId, JudgeApiError> {
        let body = wire::SubmissionRequest {
            username: request.username.as_str().to_string(),
            contest_id: request.contest_id.into_inner(),
            problem_id: request.problem_id.into_inner(),
            code: request.source_code,
            language: request.language.as_str().to_string(),
        };
        let http_request = self.client.post(self.url("/submissions")).json(&body);
        let response: wire::SubmissionResponse = self.fetch(http_request, "submissions").await?;

        response.submission_id.map(SubmissionId::new).ok_or_else(|| {
            JudgeApiError::InvalidResponse("submit response has no submissionId".to_string())
        })
    }

    async fn submission_status(
        &self,
        submission_id: SubmissionId,
    ) -> std::result::Result<StatusReport, JudgeApiError> {
        let request = self
            .client
            .get(self.url(&format!("/submissions/{submission_id}")));
        let response: wire::SubmissionResponse = self
            .fetch(request, &format!("submission {submission_id}"))
            .await?;
        map_status_report(response)
    }
}

fn map_transport(err: reqwest::Error) -> JudgeApiError {
    JudgeApiError::Transport(err.to_string())
}

fn map_contest(contest: wire::ContestResponse) -> Contest {
    Contest {
        id: ContestId::from(contest.id),
        name: contest.name,
        description: contest.description.unwrap_or_default(),
        start_time: contest.start_time,
        end_time: contest.end_time,
        problems: contest
            .problems
            .into_iter()
            .map(|problem| ProblemSummary {
                id: ProblemId::from(problem.id),
                title: problem.title,
            })
            .collect(),
    }
}

fn map_problem(problem: wire::ProblemResponse) -> ProblemDetail {
    ProblemDetail {
        id: ProblemId::from(problem.id),
        contest_id: problem.contest_id.map(ContestId::from),
        title: problem.title,
        statement: problem.statement.unwrap_or_default(),
        input_format: problem.input_format.unwrap_or_default(),
        output_format: problem.output_format.unwrap_or_default(),
        sample_test_cases: problem
            .sample_test_cases
            .into_iter()
            .map(|case| SampleTestCase {
                input: case.input,
                expected_output: case.expected_output,
            })
            .collect(),
    }
}

fn map_leaderboard_entry(entry: wire::LeaderboardEntry) -> LeaderboardEntry {
    LeaderboardEntry {
        username: entry.username,
        score: entry.score,
        problems_solved: entry.problems_solved,
        rank: entry.rank,
        last_submission_time: entry.last_submission_time,
    }
}

fn map_status_report(
    response: wire::SubmissionResponse,
) -> std::result::Result<StatusReport, JudgeApiError> {
    let code = response.status.ok_or_else(|| {
        JudgeApiError::InvalidResponse("status response has no status".to_string())
    })?;
    let status = SubmissionStatus::from_wire(&code)
        .map_err(|err| JudgeApiError::InvalidResponse(err.to_string()))?;

    Ok(StatusReport {
        status,
        verdict: response.verdict,
        output: response.output,
        execution_time_ms: response.execution_time,
        memory_used_kb: response.memory_used,
        submitted_at: response.submitted_at,
    })
}
