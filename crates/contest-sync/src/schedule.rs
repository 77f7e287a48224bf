//! 可取消的周期任务。
//!
//! 提交状态轮询与排行榜刷新都建立在 [`PeriodicTask`] 之上：
//! 节拍按固定的挂钟时间推进，不受单次请求耗时影响；任务可以显式停止，
//! 也可以通过 [`PeriodicTask::fire_now`] 在节拍之外立即触发一次。

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 节拍间隔的增长策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    #[default]
    Fixed,
    Exponential { factor: u32, max_interval: Duration },
}

/// 周期任务的节拍计划。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// 启动到第一次节拍的延迟。
    pub first_delay: Duration,
    /// 基础间隔。
    pub interval: Duration,
    pub backoff: Backoff,
}

impl Schedule {
    /// 启动后立即触发，之后按固定间隔。
    pub fn immediate(interval: Duration) -> Self {
        Self {
            first_delay: Duration::ZERO,
            interval,
            backoff: Backoff::Fixed,
        }
    }

    /// 第 `tick` 次节拍（从 1 开始）之后到下一次节拍的间隔。
    pub fn delay_after(&self, tick: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential {
                factor,
                max_interval,
            } => {
                let exponent = tick.saturating_sub(1);
                let multiplier = factor.max(1).saturating_pow(exponent);
                self.interval
                    .checked_mul(multiplier)
                    .unwrap_or(max_interval)
                    .min(max_interval)
            }
        }
    }
}

/// 节拍来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickCause {
    /// 计划内节拍，`tick` 从 1 开始计数。
    Scheduled { tick: u32 },
    /// 通过 [`PeriodicTask::fire_now`] 触发的额外节拍。
    Triggered,
}

/// 运行在独立 tokio 任务上的周期任务。
///
/// 回调是同步的，需要发起网络请求时应自行 `spawn`，
/// 以免请求耗时拖慢节拍。被丢弃时任务自动停止。
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    token: CancellationToken,
    trigger: mpsc::UnboundedSender<()>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// 启动周期任务。
    ///
    /// `token` 取消时任务随之停止，通常传入视图生命周期令牌的子令牌。
    pub fn spawn<F>(
        name: &'static str,
        schedule: Schedule,
        token: CancellationToken,
        mut on_tick: F,
    ) -> Self
    where
        F: FnMut(TickCause) + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let loop_token = token.clone();

        let handle = tokio::spawn(async move {
            debug!(task = name, ?schedule, "periodic task started");
            let mut deadline = Instant::now() + schedule.first_delay;
            let mut tick = 0u32;

            loop {
                tokio::select! {
                    biased;
                    _ = loop_token.cancelled() => break,
                    Some(()) = receiver.recv() => on_tick(TickCause::Triggered),
                    _ = time::sleep_until(deadline) => {
                        tick = tick.saturating_add(1);
                        on_tick(TickCause::Scheduled { tick });
                        deadline += schedule.delay_after(tick);
                    }
                }
            }

            debug!(task = name, ticks = tick, "periodic task stopped");
        });

        Self {
            name,
            token,
            trigger: sender,
            handle,
        }
    }

    /// 请求一次额外节拍，不影响计划节拍的时间。
    ///
    /// 任务已停止时返回 `false`。
    pub fn fire_now(&self) -> bool {
        self.trigger.send(()).is_ok()
    }

    /// 停止任务。已经发出的请求不受影响，由调用方丢弃其结果。
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            debug!(task = self.name, "stopping periodic task");
        }
        self.token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<(TickCause, Instant)>>>, impl FnMut(TickCause) + Send) {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let sink = ticks.clone();
        (ticks, move |cause| {
            sink.lock().expect("tick log").push((cause, Instant::now()))
        })
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let schedule = Schedule {
            first_delay: Duration::from_secs(2),
            interval: Duration::from_secs(2),
            backoff: Backoff::Exponential {
                factor: 2,
                max_interval: Duration::from_secs(10),
            },
        };

        assert_eq!(schedule.delay_after(1), Duration::from_secs(2));
        assert_eq!(schedule.delay_after(2), Duration::from_secs(4));
        assert_eq!(schedule.delay_after(3), Duration::from_secs(8));
        assert_eq!(schedule.delay_after(4), Duration::from_secs(10));
        assert_eq!(schedule.delay_after(40), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_follow_fixed_wall_clock_cadence() {
        let (ticks, on_tick) = recorder();
        let start = Instant::now();
        let task = PeriodicTask::spawn(
            "test",
            Schedule {
                first_delay: Duration::from_secs(2),
                interval: Duration::from_secs(2),
                backoff: Backoff::Fixed,
            },
            CancellationToken::new(),
            on_tick,
        );

        time::sleep(Duration::from_millis(6_500)).await;
        task.stop();

        let ticks = ticks.lock().expect("tick log").clone();
        let offsets: Vec<u64> = ticks
            .iter()
            .map(|(_, at)| at.duration_since(start).as_secs())
            .collect();
        assert_eq!(offsets, vec![2, 4, 6]);
        assert_eq!(ticks[2].0, TickCause::Scheduled { tick: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_does_not_shift_schedule() {
        let (ticks, on_tick) = recorder();
        let start = Instant::now();
        let task = PeriodicTask::spawn(
            "test",
            Schedule::immediate(Duration::from_secs(20)),
            CancellationToken::new(),
            on_tick,
        );

        time::sleep(Duration::from_secs(5)).await;
        assert!(task.fire_now());
        time::sleep(Duration::from_secs(20)).await;

        let ticks = ticks.lock().expect("tick log").clone();
        let observed: Vec<(TickCause, u64)> = ticks
            .iter()
            .map(|(cause, at)| (*cause, at.duration_since(start).as_secs()))
            .collect();
        assert_eq!(
            observed,
            vec![
                (TickCause::Scheduled { tick: 1 }, 0),
                (TickCause::Triggered, 5),
                (TickCause::Scheduled { tick: 2 }, 20),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_parent_stops_ticks() {
        let (ticks, on_tick) = recorder();
        let parent = CancellationToken::new();
        let task = PeriodicTask::spawn(
            "test",
            Schedule::immediate(Duration::from_secs(1)),
            parent.child_token(),
            on_tick,
        );

        time::sleep(Duration::from_millis(1_500)).await;
        parent.cancel();
        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(ticks.lock().expect("tick log").len(), 2);
        assert!(!task.is_running());
        assert!(!task.fire_now());
    }
}
