//! 定时刷新任务
//!
//! 任务句柄归启动方所有，调用 `cancel` 或句柄被丢弃时任务停止

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// 定时刷新任务句柄
pub struct RefreshTask {
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTask {
    /// 启动任务：立即执行一次，之后每隔 `period` 执行一次
    ///
    /// 同一任务内的执行串行进行，上一次未完成时不会开始下一次
    pub fn spawn<F, Fut>(name: &str, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task_name = name.to_string();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                log::debug!("执行定时任务: {}", task_name);
                job().await;
            }
        });

        log::info!("定时任务 {} 已启动，周期 {:?}", name, period);
        Self {
            name: name.to_string(),
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 停止任务，可重复调用
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            log::info!("定时任务 {} 已停止", self.name);
        }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_and_periodically() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let task = RefreshTask::spawn("counter", Duration::from_secs(60), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let mut task = RefreshTask::spawn("cancel", Duration::from_secs(1), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(1)).await;
        task.cancel();
        task.cancel();
        assert!(!task.is_running());

        let seen = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let task = RefreshTask::spawn("drop", Duration::from_secs(1), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        drop(task);

        let seen = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
    }
}
