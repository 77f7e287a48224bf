#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use contest_core::domain::{
    Contest, ContestId, JudgeApi, JudgeApiError, LeaderboardEntry, ProblemDetail, ProblemId,
    ProblemSummary, StatusReport, SubmissionId, SubmissionRequest, SubmissionStatus,
};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Contest(ContestId),
    Problem(ProblemId),
    Leaderboard(ContestId),
    Submit(SubmissionRequest),
    Status(SubmissionId),
}

struct Scripted<T> {
    delay: Duration,
    result: Result<T, JudgeApiError>,
}

#[derive(Default)]
struct Script {
    contests: HashMap<ContestId, Contest>,
    problems: HashMap<ProblemId, ProblemDetail>,
    problem_delays: HashMap<ProblemId, Duration>,
    leaderboard: Vec<LeaderboardEntry>,
    leaderboard_failures: VecDeque<JudgeApiError>,
    submits: VecDeque<Scripted<SubmissionId>>,
    statuses: HashMap<SubmissionId, VecDeque<Scripted<StatusReport>>>,
    calls: Vec<(Instant, Call)>,
}

/// In-memory judging service answering from a script.
///
/// Status queries with an exhausted script answer `PENDING`.
#[derive(Clone, Default)]
pub struct ScriptedJudgeApi {
    script: Arc<Mutex<Script>>,
}

impl ScriptedJudgeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        let mut script = self.script.lock().expect("script lock");
        f(&mut script)
    }

    pub fn with_contest(self, contest: Contest) -> Self {
        self.with_script(|s| s.contests.insert(contest.id.clone(), contest));
        self
    }

    pub fn with_problem(self, problem: ProblemDetail) -> Self {
        self.with_script(|s| s.problems.insert(problem.id.clone(), problem));
        self
    }

    pub fn delay_problem(&self, problem_id: &str, delay: Duration) {
        self.with_script(|s| s.problem_delays.insert(ProblemId::from(problem_id), delay));
    }

    pub fn set_leaderboard(&self, entries: Vec<LeaderboardEntry>) {
        self.with_script(|s| s.leaderboard = entries);
    }

    pub fn fail_next_leaderboard(&self, err: JudgeApiError) {
        self.with_script(|s| s.leaderboard_failures.push_back(err));
    }

    pub fn push_submit(&self, result: Result<u64, JudgeApiError>) {
        self.push_submit_after(Duration::ZERO, result);
    }

    pub fn push_submit_after(&self, delay: Duration, result: Result<u64, JudgeApiError>) {
        self.with_script(|s| {
            s.submits.push_back(Scripted {
                delay,
                result: result.map(SubmissionId::new),
            })
        });
    }

    pub fn push_status(&self, id: u64, status: SubmissionStatus) {
        self.push_status_after(id, Duration::ZERO, Ok(StatusReport::new(status)));
    }

    pub fn push_status_error(&self, id: u64, err: JudgeApiError) {
        self.push_status_after(id, Duration::ZERO, Err(err));
    }

    pub fn push_status_after(
        &self,
        id: u64,
        delay: Duration,
        result: Result<StatusReport, JudgeApiError>,
    ) {
        self.with_script(|s| {
            s.statuses
                .entry(SubmissionId::new(id))
                .or_default()
                .push_back(Scripted { delay, result })
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with_script(|s| s.calls.iter().map(|(_, call)| call.clone()).collect())
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.with_script(|s| s.calls.clone())
    }

    pub fn status_queries(&self) -> Vec<SubmissionId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Status(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn leaderboard_queries(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Leaderboard(_)))
            .count()
    }

    pub fn submit_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Submit(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.with_script(|s| s.calls.push((Instant::now(), call)));
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl JudgeApi for ScriptedJudgeApi {
    async fn get_contest(&self, contest_id: &ContestId) -> Result<Contest, JudgeApiError> {
        self.record(Call::Contest(contest_id.clone()));
        self.with_script(|s| s.contests.get(contest_id).cloned())
            .ok_or_else(|| JudgeApiError::NotFound(format!("contest {contest_id}")))
    }

    async fn get_problem(&self, problem_id: &ProblemId) -> Result<ProblemDetail, JudgeApiError> {
        self.record(Call::Problem(problem_id.clone()));
        let (delay, problem) = self.with_script(|s| {
            (
                s.problem_delays.get(problem_id).copied().unwrap_or_default(),
                s.problems.get(problem_id).cloned(),
            )
        });
        pause(delay).await;
        problem.ok_or_else(|| JudgeApiError::NotFound(format!("problem {problem_id}")))
    }

    async fn get_leaderboard(
        &self,
        contest_id: &ContestId,
    ) -> Result<Vec<LeaderboardEntry>, JudgeApiError> {
        self.record(Call::Leaderboard(contest_id.clone()));
        self.with_script(|s| match s.leaderboard_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(s.leaderboard.clone()),
        })
    }

    async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionId, JudgeApiError> {
        self.record(Call::Submit(request));
        let scripted = self
            .with_script(|s| s.submits.pop_front())
            .unwrap_or(Scripted {
                delay: Duration::ZERO,
                result: Err(JudgeApiError::Transport("no scripted submit".to_string())),
            });
        pause(scripted.delay).await;
        scripted.result
    }

    async fn submission_status(
        &self,
        submission_id: SubmissionId,
    ) -> Result<StatusReport, JudgeApiError> {
        self.record(Call::Status(submission_id));
        let scripted = self
            .with_script(|s| {
                s.statuses
                    .get_mut(&submission_id)
                    .and_then(VecDeque::pop_front)
            })
            .unwrap_or(Scripted {
                delay: Duration::ZERO,
                result: Ok(StatusReport::new(SubmissionStatus::Pending)),
            });
        pause(scripted.delay).await;
        scripted.result
    }
}

pub fn contest(id: &str, problem_ids: &[&str]) -> Contest {
    Contest {
        id: ContestId::from(id),
        name: format!("Contest {id}"),
        description: "Weekly round".to_string(),
        start_time: None,
        end_time: None,
        problems: problem_ids
            .iter()
            .map(|problem_id| ProblemSummary {
                id: ProblemId::from(*problem_id),
                title: format!("Problem {problem_id}"),
            })
            .collect(),
    }
}

pub fn problem(id: &str) -> ProblemDetail {
    ProblemDetail {
        id: ProblemId::from(id),
        contest_id: None,
        title: format!("Problem {id}"),
        statement: "Add two numbers".to_string(),
        input_format: "a b".to_string(),
        output_format: "a+b".to_string(),
        sample_test_cases: Vec::new(),
    }
}

pub fn entry(username: &str, rank: u32, score: u32) -> LeaderboardEntry {
    LeaderboardEntry {
        username: username.to_string(),
        score,
        problems_solved: score / 100,
        rank,
        last_submission_time: None,
    }
}
