//! 按优先级划分的工作池

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use super::TaskService;
use crate::types::Priority;

/// 各优先级的并发数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSplit {
    pub critical: usize,
    pub default: usize,
    pub low: usize,
}

impl WorkerSplit {
    /// critical 60%，default 30%，low 取剩余，每类至少 1 个
    ///
    /// `total` 不小于 [`MIN_CONCURRENCY`](crate::config::MIN_CONCURRENCY) 时各类之和恰为 `total`。
    #[must_use]
    pub fn from_total(total: usize) -> Self {
        let critical = (total * 6 / 10).max(1);
        let default = (total * 3 / 10).max(1);
        let low = total.saturating_sub(critical + default).max(1);
        Self {
            critical,
            default,
            low,
        }
    }

    #[must_use]
    pub fn workers(&self, priority: Priority) -> usize {
        match priority {
            Priority::Critical => self.critical,
            Priority::Default => self.default,
            Priority::Low => self.low,
        }
    }
}

/// 队列接收端，由 [`TaskService::new`] 创建
pub struct TaskReceivers {
    pub(super) critical: UnboundedReceiver<String>,
    pub(super) default: UnboundedReceiver<String>,
    pub(super) low: UnboundedReceiver<String>,
}

pub struct WorkerPool {
    split: WorkerSplit,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// 为每个优先级启动一个分发循环
    pub fn start(service: Arc<TaskService>, receivers: TaskReceivers, concurrency: usize) -> Self {
        let split = WorkerSplit::from_total(concurrency);
        let TaskReceivers {
            critical,
            default,
            low,
        } = receivers;

        let handles = [
            (Priority::Critical, critical),
            (Priority::Default, default),
            (Priority::Low, low),
        ]
        .into_iter()
        .map(|(priority, rx)| {
            let workers = split.workers(priority);
            log::info!("Starting {workers} {priority} worker(s)");
            tokio::spawn(dispatch(Arc::clone(&service), priority, rx, workers))
        })
        .collect();

        Self { split, handles }
    }

    pub fn split(&self) -> WorkerSplit {
        self.split
    }

    /// 等待所有队列关闭且在途任务完成
    pub async fn join(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                log::error!("Worker dispatcher stopped abnormally: {e}");
            }
        }
    }
}

async fn dispatch(
    service: Arc<TaskService>,
    priority: Priority,
    mut rx: UnboundedReceiver<String>,
    workers: usize,
) {
    let semaphore = Arc::new(Semaphore::new(workers));

    while let Some(raw) = rx.recv().await {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service.run_raw(&raw).await;
            drop(permit);
        });
    }

    // 队列已关闭，拿回全部名额即表示在途任务都已结束
    let all = u32::try_from(workers).unwrap_or(u32::MAX);
    if semaphore.acquire_many(all).await.is_err() {
        log::warn!("{priority} worker semaphore closed early");
    }
    log::info!("{priority} workers drained");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_follows_ratio() {
        assert_eq!(
            WorkerSplit::from_total(10),
            WorkerSplit {
                critical: 6,
                default: 3,
                low: 1
            }
        );
        assert_eq!(
            WorkerSplit::from_total(20),
            WorkerSplit {
                critical: 12,
                default: 6,
                low: 2
            }
        );
    }

    #[test]
    fn every_class_gets_a_worker() {
        for total in 0..4 {
            let split = WorkerSplit::from_total(total);
            assert!(Priority::ALL.iter().all(|p| split.workers(*p) >= 1), "{split:?}");
        }
        assert_eq!(WorkerSplit::from_total(3).critical, 1);
    }

    #[test]
    fn split_never_exceeds_valid_total() {
        for total in crate::config::MIN_CONCURRENCY..=40 {
            let split = WorkerSplit::from_total(total);
            assert_eq!(split.critical + split.default + split.low, total, "{split:?}");
        }
    }
}
