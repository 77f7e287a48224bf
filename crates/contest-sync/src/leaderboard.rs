//! 排行榜周期刷新。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use contest_core::domain::{ContestId, JudgeApi, Leaderboard};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::{EventBroadcaster, RefreshCause, ViewEvent};
use crate::schedule::{PeriodicTask, Schedule, TickCause};

/// 维护排行榜的最新成功结果，并在视图存续期间周期刷新。
///
/// 刷新失败只记录日志，保留上一次成功的数据。
#[derive(Clone)]
pub struct LeaderboardRefresher {
    inner: Arc<RefresherInner>,
}

struct RefresherInner {
    contest_id: ContestId,
    api: Arc<dyn JudgeApi>,
    events: Arc<EventBroadcaster>,
    interval: Duration,
    issued: AtomicU64,
    board: RwLock<BoardState>,
    task: Mutex<Option<PeriodicTask>>,
}

#[derive(Default)]
struct BoardState {
    leaderboard: Leaderboard,
    applied_seq: u64,
    refreshes: u64,
}

impl LeaderboardRefresher {
    pub fn new(
        contest_id: ContestId,
        api: Arc<dyn JudgeApi>,
        events: Arc<EventBroadcaster>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(RefresherInner {
                contest_id,
                api,
                events,
                interval,
                issued: AtomicU64::new(0),
                board: RwLock::new(BoardState::default()),
                task: Mutex::new(None),
            }),
        }
    }

    /// 启动周期刷新，首次刷新立即发生。已在运行时不做任何事。
    pub async fn start(&self, token: CancellationToken) {
        let mut task = self.inner.task.lock().await;
        if task.as_ref().is_some_and(PeriodicTask::is_running) {
            debug!(contest_id = %self.inner.contest_id, "leaderboard loop already running");
            return;
        }

        info!(
            contest_id = %self.inner.contest_id,
            interval_ms = self.inner.interval.as_millis() as u64,
            "starting leaderboard refresh loop"
        );

        let weak: Weak<RefresherInner> = Arc::downgrade(&self.inner);
        let request_token = token.clone();
        *task = Some(PeriodicTask::spawn(
            "leaderboard-refresh",
            Schedule::immediate(self.inner.interval),
            token,
            move |cause| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let cause = match cause {
                    TickCause::Scheduled { .. } => RefreshCause::Scheduled,
                    TickCause::Triggered => RefreshCause::Verdict,
                };
                tokio::spawn(refresh(inner, cause, request_token.clone()));
            },
        ));
    }

    pub async fn stop(&self) {
        if let Some(task) = self.inner.task.lock().await.take() {
            task.stop();
            info!(contest_id = %self.inner.contest_id, "leaderboard refresh loop stopped");
        }
    }

    /// 在周期之外立即刷新一次，不重置周期计时。
    ///
    /// 循环未运行时返回 `false`。
    pub async fn refresh_now(&self) -> bool {
        let task = self.inner.task.lock().await;
        match task.as_ref() {
            Some(task) if task.is_running() => task.fire_now(),
            _ => {
                debug!(
                    contest_id = %self.inner.contest_id,
                    "refresh requested while loop is stopped"
                );
                false
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.inner
            .task
            .lock()
            .await
            .as_ref()
            .is_some_and(PeriodicTask::is_running)
    }

    pub async fn leaderboard(&self) -> Leaderboard {
        self.inner.board.read().await.leaderboard.clone()
    }

    /// 已成功应用的刷新次数。
    pub async fn refresh_count(&self) -> u64 {
        self.inner.board.read().await.refreshes
    }
}

async fn refresh(inner: Arc<RefresherInner>, cause: RefreshCause, token: CancellationToken) {
    let seq = inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
    let result = inner.api.get_leaderboard(&inner.contest_id).await;

    if token.is_cancelled() {
        debug!(seq, "discarding leaderboard response after view teardown");
        return;
    }

    match result {
        Ok(entries) => {
            let mut board = inner.board.write().await;
            if seq <= board.applied_seq {
                debug!(seq, applied = board.applied_seq, "discarding stale leaderboard response");
                return;
            }
            board.applied_seq = seq;
            board.refreshes += 1;
            board.leaderboard = Leaderboard::new(entries);
            let len = board.leaderboard.len();
            drop(board);

            debug!(contest_id = %inner.contest_id, entries = len, ?cause, "leaderboard refreshed");
            inner.events.emit(ViewEvent::LeaderboardUpdated {
                entries: len,
                cause,
            });
        }
        Err(err) => {
            warn!(
                contest_id = %inner.contest_id,
                error = %err,
                ?cause,
                "failed to refresh leaderboard, keeping last ranking"
            );
        }
    }
}
