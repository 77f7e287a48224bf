//! 提交生命周期跟踪器。
//!
//! 同一时刻只跟踪一个提交。每次提交都会分配新的代数（generation），
//! 所有异步返回的结果都带着发出时的代数，与当前代数不一致即被丢弃，
//! 因此旧提交的轮询结果无论何时到达都不会覆盖新提交的状态。

use std::sync::{Arc, Weak};

use contest_core::domain::{
    ContestId, JudgeApi, Language, ProblemId, StatusReport, Submission, SubmissionId,
    SubmissionOutcome, SubmissionRequest, SubmissionStatus, Username,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PollPolicy;
use crate::error::SyncError;
use crate::events::{EventBroadcaster, ViewEvent};
use crate::leaderboard::LeaderboardRefresher;
use crate::schedule::PeriodicTask;

/// 用户发起提交时的输入。
///
/// `problem_id` 或 `username` 缺失时提交被忽略。
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub contest_id: ContestId,
    pub problem_id: Option<ProblemId>,
    pub username: Option<Username>,
    pub language: Language,
    pub source_code: String,
}

/// 一次 `submit` 调用的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 未选择题目或没有用户名，状态未改变，也没有发出请求。
    Ignored,
    /// 评测服务已受理，轮询已开始。
    Submitted(SubmissionId),
    /// 提交请求失败，状态为 `SubmitError`。
    Rejected,
    /// 请求返回前已被更新的提交取代，结果被丢弃。
    Superseded,
    /// 视图已销毁，跟踪器不再接受提交。
    Detached,
}

/// 跟踪器状态快照。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub generation: u64,
    pub status: SubmissionStatus,
    pub active_submission_id: Option<SubmissionId>,
    pub submission: Option<Submission>,
    pub last_report: Option<StatusReport>,
    pub outcome: Option<SubmissionOutcome>,
}

/// 提交生命周期跟踪器，可廉价克隆。
#[derive(Clone)]
pub struct SubmissionTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    api: Arc<dyn JudgeApi>,
    policy: PollPolicy,
    events: Arc<EventBroadcaster>,
    leaderboard: LeaderboardRefresher,
    lifetime: CancellationToken,
    state: Mutex<TrackerState>,
}

#[derive(Default)]
struct TrackerState {
    generation: u64,
    status: SubmissionStatus,
    active: Option<ActiveSubmission>,
    last_submission: Option<Submission>,
    last_report: Option<StatusReport>,
    outcome: Option<SubmissionOutcome>,
}

struct ActiveSubmission {
    generation: u64,
    submission: Submission,
    poller: Option<PeriodicTask>,
    attempts: u32,
    applied_seq: u32,
}

impl ActiveSubmission {
    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }
}

impl SubmissionTracker {
    /// 创建跟踪器。
    ///
    /// `lifetime` 为视图生命周期令牌，取消后所有轮询随之停止。
    pub fn new(
        api: Arc<dyn JudgeApi>,
        policy: PollPolicy,
        events: Arc<EventBroadcaster>,
        leaderboard: LeaderboardRefresher,
        lifetime: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                api,
                policy,
                events,
                leaderboard,
                lifetime,
                state: Mutex::new(TrackerState::default()),
            }),
        }
    }

    /// 提交代码并开始轮询评测结果。
    ///
    /// 新提交会立即取代当前跟踪的提交：旧的轮询被取消，
    /// 之后到达的旧结果全部丢弃。
    #[tracing::instrument(skip(self, draft), fields(language = %draft.language))]
    pub async fn submit(&self, draft: SubmissionDraft) -> SubmitOutcome {
        let (Some(problem_id), Some(username)) = (draft.problem_id, draft.username) else {
            debug!("submit ignored: no problem selected or no username");
            return SubmitOutcome::Ignored;
        };

        if self.inner.lifetime.is_cancelled() {
            debug!("submit ignored: view has been torn down");
            return SubmitOutcome::Detached;
        }

        let request = SubmissionRequest {
            username: username.clone(),
            contest_id: draft.contest_id.clone(),
            problem_id: problem_id.clone(),
            language: draft.language,
            source_code: draft.source_code.clone(),
        };
        let submission = Submission {
            id: None,
            username,
            contest_id: draft.contest_id,
            problem_id,
            language: draft.language,
            source_code: draft.source_code,
            status: SubmissionStatus::Submitting,
        };

        let generation = {
            let mut state = self.inner.state.lock().await;
            state.generation += 1;
            let generation = state.generation;

            if let Some(mut previous) = state.active.take() {
                previous.stop_polling();
                info!(
                    previous_generation = previous.generation,
                    previous_submission_id = ?previous.submission.id,
                    "superseding tracked submission"
                );
                self.inner.events.emit(ViewEvent::SubmissionSuperseded {
                    generation: previous.generation,
                    submission_id: previous.submission.id,
                });
                state.last_submission = Some(previous.submission);
            }

            state.active = Some(ActiveSubmission {
                generation,
                submission,
                poller: None,
                attempts: 0,
                applied_seq: 0,
            });
            state.last_report = None;
            self.inner.set_status(&mut state, SubmissionStatus::Submitting);
            generation
        };

        info!(generation, problem_id = %request.problem_id, "submitting code");
        let result = self.inner.api.submit(request).await;

        let mut state = self.inner.state.lock().await;
        if !state.is_current(generation) {
            if self.inner.lifetime.is_cancelled() {
                debug!(generation, "discarding submit response after detach");
                return SubmitOutcome::Detached;
            }
            debug!(generation, "discarding submit response of superseded submission");
            return SubmitOutcome::Superseded;
        }

        match result {
            Ok(submission_id) => {
                let poller = spawn_poller(&self.inner, generation);
                if let Some(active) = state.active.as_mut() {
                    active.submission.id = Some(submission_id);
                    active.poller = Some(poller);
                }
                info!(generation, %submission_id, "submission accepted, polling for verdict");
                self.inner.set_status(&mut state, SubmissionStatus::Pending);
                SubmitOutcome::Submitted(submission_id)
            }
            Err(source) => {
                let err = SyncError::Submit(source);
                warn!(generation, error = %err, "submission request failed");
                self.inner.finish(
                    &mut state,
                    SubmissionStatus::SubmitError,
                    None,
                    Some(err.to_string()),
                );
                SubmitOutcome::Rejected
            }
        }
    }

    /// 停止跟踪当前提交（视图离开时调用）。显示状态保持不变。
    pub async fn detach(&self) {
        let mut state = self.inner.state.lock().await;
        if let Some(mut active) = state.active.take() {
            active.stop_polling();
            info!(
                generation = active.generation,
                submission_id = ?active.submission.id,
                "detached from tracked submission"
            );
            state.last_submission = Some(active.submission);
        }
    }

    pub async fn status(&self) -> SubmissionStatus {
        self.inner.state.lock().await.status
    }

    pub async fn active_submission_id(&self) -> Option<SubmissionId> {
        let state = self.inner.state.lock().await;
        state.active.as_ref().and_then(|active| active.submission.id)
    }

    pub async fn is_polling(&self) -> bool {
        let state = self.inner.state.lock().await;
        state
            .active
            .as_ref()
            .and_then(|active| active.poller.as_ref())
            .is_some_and(PeriodicTask::is_running)
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        let state = self.inner.state.lock().await;
        TrackerSnapshot {
            generation: state.generation,
            status: state.status,
            active_submission_id: state.active.as_ref().and_then(|active| active.submission.id),
            submission: state
                .active
                .as_ref()
                .map(|active| active.submission.clone())
                .or_else(|| state.last_submission.clone()),
            last_report: state.last_report.clone(),
            outcome: state.outcome.clone(),
        }
    }
}

impl TrackerState {
    fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }
}

impl TrackerInner {
    fn set_status(&self, state: &mut TrackerState, status: SubmissionStatus) {
        if let Some(active) = state.active.as_mut() {
            active.submission.status = status;
        }
        if state.status == status {
            return;
        }
        state.status = status;
        self.events.emit(ViewEvent::SubmissionStatusChanged {
            generation: state.generation,
            submission_id: state.active.as_ref().and_then(|active| active.submission.id),
            status,
        });
    }

    /// 进入终态：停止轮询、清除跟踪的提交并记录结果。
    fn finish(
        &self,
        state: &mut TrackerState,
        status: SubmissionStatus,
        report: Option<StatusReport>,
        failure: Option<String>,
    ) {
        self.set_status(state, status);
        let Some(mut active) = state.active.take() else {
            return;
        };
        active.stop_polling();

        let submission_id = active.submission.id;
        state.outcome = Some(SubmissionOutcome {
            submission_id,
            problem_id: active.submission.problem_id.clone(),
            status,
            report: report.clone(),
            failure,
        });
        if report.is_some() {
            state.last_report = report;
        }
        state.last_submission = Some(active.submission);

        self.events.emit(ViewEvent::SubmissionFinished {
            generation: active.generation,
            submission_id,
            status,
        });
    }
}

fn spawn_poller(inner: &Arc<TrackerInner>, generation: u64) -> PeriodicTask {
    let weak: Weak<TrackerInner> = Arc::downgrade(inner);
    PeriodicTask::spawn(
        "submission-poll",
        inner.policy.schedule(),
        inner.lifetime.child_token(),
        move |_cause| {
            if let Some(inner) = weak.upgrade() {
                tokio::spawn(poll_once(inner, generation));
            }
        },
    )
}

async fn poll_once(inner: Arc<TrackerInner>, generation: u64) {
    let (submission_id, seq) = {
        let mut state = inner.state.lock().await;
        let Some(active) = state
            .active
            .as_mut()
            .filter(|active| active.generation == generation)
        else {
            return;
        };
        let Some(submission_id) = active.submission.id else {
            return;
        };

        if let Some(max_attempts) = inner.policy.max_attempts {
            if active.attempts >= max_attempts {
                let attempts = active.attempts;
                warn!(%submission_id, attempts, "no verdict within the poll attempt limit");
                inner.finish(
                    &mut state,
                    SubmissionStatus::PollTimeout,
                    None,
                    Some(format!("no verdict after {attempts} status queries")),
                );
                return;
            }
        }

        active.attempts += 1;
        (submission_id, active.attempts)
    };

    let result = inner.api.submission_status(submission_id).await;

    let mut state = inner.state.lock().await;
    let Some(active) = state
        .active
        .as_mut()
        .filter(|active| active.generation == generation)
    else {
        debug!(%submission_id, "discarding status response of detached submission");
        return;
    };

    let report = match result {
        Ok(report) => report,
        Err(source) => {
            let err = SyncError::Poll {
                id: submission_id,
                source,
            };
            warn!(error = %err, "status poll failed, will retry on next tick");
            return;
        }
    };

    // a verdict is final no matter which query delivered it
    let status = report.status;
    if !status.is_verdict() && seq <= active.applied_seq {
        debug!(
            %submission_id,
            seq,
            applied = active.applied_seq,
            "discarding out-of-order status response"
        );
        return;
    }
    active.applied_seq = active.applied_seq.max(seq);

    if status.is_verdict() {
        info!(%submission_id, %status, "verdict received");
        inner.finish(&mut state, status, Some(report), None);
        drop(state);
        inner.leaderboard.refresh_now().await;
    } else {
        debug!(%submission_id, %status, "submission still being judged");
        state.last_report = Some(report);
        inner.set_status(&mut state, status);
    }
}
