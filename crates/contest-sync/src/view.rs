//! 比赛页面的同步外观。
//!
//! 视图层通过 [`ContestView`] 驱动全部同步逻辑：挂载时加载比赛、自动选择第一题、
//! 启动排行榜刷新；用户操作时选择题目或提交代码；卸载时取消所有周期任务。

use std::sync::Arc;

use contest_core::domain::{
    Contest, ContestId, JudgeApi, Language, Leaderboard, LeaderboardEntry, ProblemDetail,
    ProblemId, SubmissionStatus, Username,
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::events::{EventBroadcaster, EventStream, ViewEvent};
use crate::identity::IdentityStore;
use crate::leaderboard::LeaderboardRefresher;
use crate::tracker::{SubmissionDraft, SubmissionTracker, SubmitOutcome, TrackerSnapshot};

/// 视图层渲染所需的全部状态。
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub contest_id: ContestId,
    pub username: Option<Username>,
    pub contest: Option<Contest>,
    pub problem: Option<ProblemDetail>,
    pub leaderboard: Leaderboard,
    pub display_limit: usize,
    pub submission: TrackerSnapshot,
}

impl ViewSnapshot {
    /// 排行榜展示部分，保持服务端顺序。
    pub fn leaderboard_top(&self) -> &[LeaderboardEntry] {
        self.leaderboard.top(self.display_limit)
    }

    pub fn my_rank(&self) -> Option<u32> {
        let username = self.username.as_ref()?;
        self.leaderboard.rank_of(username.as_str())
    }

    pub fn status(&self) -> SubmissionStatus {
        self.submission.status
    }
}

#[derive(Default)]
struct Selection {
    generation: u64,
    problem: Option<ProblemDetail>,
}

pub struct ContestView {
    contest_id: ContestId,
    display_limit: usize,
    api: Arc<dyn JudgeApi>,
    identity: Arc<dyn IdentityStore>,
    event_broadcaster: Arc<EventBroadcaster>,
    lifetime: CancellationToken,
    username: RwLock<Option<Username>>,
    contest: RwLock<Option<Contest>>,
    selection: RwLock<Selection>,
    leaderboard: LeaderboardRefresher,
    tracker: SubmissionTracker,
}

impl ContestView {
    pub fn new(
        config: &SyncConfig,
        contest_id: ContestId,
        api: Arc<dyn JudgeApi>,
        identity: Arc<dyn IdentityStore>,
    ) -> Self {
        info!(
            contest_id = %contest_id,
            poll_interval_ms = config.poll.interval_ms,
            leaderboard_interval_ms = config.leaderboard.refresh_interval_ms,
            "initializing contest view"
        );

        let event_broadcaster = Arc::new(EventBroadcaster::new(config.event_buffer_size));
        let lifetime = CancellationToken::new();
        let leaderboard = LeaderboardRefresher::new(
            contest_id.clone(),
            api.clone(),
            event_broadcaster.clone(),
            config.leaderboard_interval(),
        );
        let tracker = SubmissionTracker::new(
            api.clone(),
            config.poll_policy(),
            event_broadcaster.clone(),
            leaderboard.clone(),
            lifetime.clone(),
        );

        Self {
            contest_id,
            display_limit: config.leaderboard.display_limit,
            api,
            identity,
            event_broadcaster,
            lifetime,
            username: RwLock::new(None),
            contest: RwLock::new(None),
            selection: RwLock::new(Selection::default()),
            leaderboard,
            tracker,
        }
    }

    pub fn contest_id(&self) -> &ContestId {
        &self.contest_id
    }

    /// 进入比赛页面。
    ///
    /// 读取本地保存的用户名、加载比赛并自动选择第一题，然后启动排行榜刷新。
    /// 加载失败只记录日志，视图保持无数据状态。
    #[tracing::instrument(skip(self), fields(contest_id = %self.contest_id))]
    pub async fn mount(&self) {
        if self.lifetime.is_cancelled() {
            warn!("cannot mount a view that has been unmounted");
            return;
        }

        match self.identity.load().await {
            Ok(username) => *self.username.write().await = username,
            Err(err) => warn!(error = %err, "failed to read stored username"),
        }

        self.leaderboard.start(self.lifetime.child_token()).await;
        self.load_contest().await;
    }

    /// 离开比赛页面：停止排行榜刷新与提交轮询。
    pub async fn unmount(&self) {
        info!(contest_id = %self.contest_id, "unmounting contest view");
        self.lifetime.cancel();
        self.tracker.detach().await;
        self.leaderboard.stop().await;
    }

    pub fn is_mounted(&self) -> bool {
        !self.lifetime.is_cancelled()
    }

    async fn load_contest(&self) {
        let contest = match self.api.get_contest(&self.contest_id).await {
            Ok(contest) => contest,
            Err(source) => {
                let err = SyncError::Api(source);
                warn!(contest_id = %self.contest_id, error = %err, "failed to fetch contest");
                return;
            }
        };

        let first_problem = contest.first_problem().map(|problem| problem.id.clone());
        info!(
            contest_id = %contest.id,
            problems = contest.problems.len(),
            "contest loaded"
        );
        self.event_broadcaster.emit(ViewEvent::ContestLoaded {
            contest_id: contest.id.clone(),
            problem_count: contest.problems.len(),
        });
        *self.contest.write().await = Some(contest);

        match first_problem {
            Some(problem_id) => self.select_problem(&problem_id).await,
            None => debug!("contest has no problems, nothing to select"),
        }
    }

    /// 选择题目并加载详情，整体替换当前题目。
    ///
    /// 较早发起的选择请求晚于较新的请求返回时被丢弃。
    #[tracing::instrument(skip(self))]
    pub async fn select_problem(&self, problem_id: &ProblemId) {
        let generation = {
            let mut selection = self.selection.write().await;
            selection.generation += 1;
            selection.generation
        };

        let problem = match self.api.get_problem(problem_id).await {
            Ok(problem) => problem,
            Err(source) => {
                let err = SyncError::Api(source);
                warn!(problem_id = %problem_id, error = %err, "failed to fetch problem");
                return;
            }
        };

        let mut selection = self.selection.write().await;
        if selection.generation != generation {
            debug!(problem_id = %problem_id, "discarding problem detail of an older selection");
            return;
        }
        selection.problem = Some(problem);
        drop(selection);

        self.event_broadcaster.emit(ViewEvent::ProblemSelected {
            problem_id: problem_id.clone(),
        });
    }

    /// 以当前选中的题目与用户名提交代码。
    pub async fn submit(
        &self,
        source_code: impl Into<String>,
        language: Language,
    ) -> SubmitOutcome {
        let problem_id = self
            .selection
            .read()
            .await
            .problem
            .as_ref()
            .map(|problem| problem.id.clone());
        let username = self.username.read().await.clone();

        self.tracker
            .submit(SubmissionDraft {
                contest_id: self.contest_id.clone(),
                problem_id,
                username,
                language,
                source_code: source_code.into(),
            })
            .await
    }

    pub async fn username(&self) -> Option<Username> {
        self.username.read().await.clone()
    }

    pub async fn contest(&self) -> Option<Contest> {
        self.contest.read().await.clone()
    }

    pub async fn selected_problem(&self) -> Option<ProblemDetail> {
        self.selection.read().await.problem.clone()
    }

    pub async fn leaderboard(&self) -> Leaderboard {
        self.leaderboard.leaderboard().await
    }

    pub fn tracker(&self) -> &SubmissionTracker {
        &self.tracker
    }

    pub fn leaderboard_refresher(&self) -> &LeaderboardRefresher {
        &self.leaderboard
    }

    pub fn subscribe_events(&self) -> EventStream {
        self.event_broadcaster.subscribe()
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            contest_id: self.contest_id.clone(),
            username: self.username().await,
            contest: self.contest().await,
            problem: self.selected_problem().await,
            leaderboard: self.leaderboard().await,
            display_limit: self.display_limit,
            submission: self.tracker.snapshot().await,
        }
    }
}

impl Drop for ContestView {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}
