//! 任务日志
//!
//! 每个任务一个日志文件，同时转发到 `log` 门面。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::CoreResult;

#[derive(Clone)]
pub struct TaskLogger {
    task_id: String,
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl TaskLogger {
    /// 以追加模式打开日志文件，父目录不存在时创建
    pub async fn open(task_id: &str, path: &Path) -> CoreResult<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        options.mode(0o644);
        let file = options.open(path).await?;

        Ok(Self {
            task_id: task_id.to_string(),
            path: path.to_path_buf(),
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn info(&self, message: &str) {
        self.write(log::Level::Info, message).await;
    }

    pub async fn warn(&self, message: &str) {
        self.write(log::Level::Warn, message).await;
    }

    pub async fn error(&self, message: &str) {
        self.write(log::Level::Error, message).await;
    }

    async fn write(&self, level: log::Level, message: &str) {
        log::log!(level, "[task {}] {message}", self.task_id);

        let line = format!("{} {level} {message}\n", Utc::now().to_rfc3339());
        let mut file = self.file.lock().await;
        // 日志写失败不影响任务本身
        if let Err(e) = file.write_all(line.as_bytes()).await {
            log::warn!("Failed to write task log {}: {e}", self.path.display());
            return;
        }
        if let Err(e) = file.flush().await {
            log::warn!("Failed to flush task log {}: {e}", self.path.display());
        }
    }
}
