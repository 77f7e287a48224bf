use anyhow::Result;
use contest_core::domain::{ContestId, ProblemId, SubmissionId, SubmissionStatus};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

/// 排行榜刷新的触发来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshCause {
    /// 周期节拍。
    Scheduled,
    /// 评测结果产生后的额外刷新。
    Verdict,
}

/// 视图层订阅的状态变更事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// 比赛信息加载完成。
    ContestLoaded {
        contest_id: ContestId,
        problem_count: usize,
    },
    /// 选中题目的详情已替换。
    ProblemSelected { problem_id: ProblemId },
    /// 排行榜数据已更新。
    LeaderboardUpdated { entries: usize, cause: RefreshCause },
    /// 当前提交的显示状态变化。
    SubmissionStatusChanged {
        generation: u64,
        submission_id: Option<SubmissionId>,
        status: SubmissionStatus,
    },
    /// 旧提交被新提交取代，其轮询已取消。
    SubmissionSuperseded {
        generation: u64,
        submission_id: Option<SubmissionId>,
    },
    /// 提交进入终态，跟踪器已脱离。
    SubmissionFinished {
        generation: u64,
        submission_id: Option<SubmissionId>,
        status: SubmissionStatus,
    },
}

/// 基于 `tokio::broadcast` 的事件广播器。
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<ViewEvent>,
}

impl EventBroadcaster {
    /// 创建事件广播器。
    ///
    /// `capacity` 表示内部广播队列容量。
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 广播一个事件，没有订阅者时直接丢弃。
    pub fn emit(&self, event: ViewEvent) {
        let _ = self.sender.send(event);
    }

    /// 订阅事件流。
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
        }
    }
}

/// 事件接收流包装器。
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<ViewEvent>,
}

impl EventStream {
    /// 异步接收下一条事件。
    ///
    /// 消费过慢时跳过被覆盖的事件继续接收，只有广播器关闭才返回错误。
    pub async fn recv(&mut self) -> Result<ViewEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Ok(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged, skipping missed events");
                }
                Err(err @ RecvError::Closed) => return Err(err.into()),
            }
        }
    }

    /// 非阻塞尝试接收一条事件。
    pub fn try_recv(&mut self) -> Result<ViewEvent> {
        Ok(self.receiver.try_recv()?)
    }

    /// 取出当前已到达的全部事件。
    pub fn drain(&mut self) -> Vec<ViewEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }
}
