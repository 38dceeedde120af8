//! 证书与任务持久化抽象 Trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::types::{Certificate, CertificateTask, Page};

/// 证书仓库 Trait
///
/// 任务记录以 `task_id` 为键，证书记录以证书 `id` 为键。
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// 创建任务记录
    async fn create_certificate_task(&self, task: &CertificateTask) -> CoreResult<()>;

    /// 更新任务记录
    ///
    /// # Errors
    /// 记录不存在时返回 `TaskNotFound`
    async fn update_certificate_task(&self, task: &CertificateTask) -> CoreResult<()>;

    async fn get_certificate_task(&self, task_id: &str) -> CoreResult<Option<CertificateTask>>;

    /// 创建证书记录
    async fn create_certificate_record(&self, certificate: &Certificate) -> CoreResult<()>;

    /// 更新证书记录
    ///
    /// # Errors
    /// 记录不存在时返回 `CertificateNotFound`
    async fn update_certificate_record(&self, certificate: &Certificate) -> CoreResult<()>;

    async fn get_certificate_by_id(&self, id: &str) -> CoreResult<Option<Certificate>>;

    /// 分页列出证书，按创建时间倒序
    ///
    /// # Arguments
    /// * `page` - 页码，从 1 开始
    /// * `page_size` - 每页数量
    async fn list_certificates(&self, page: u32, page_size: u32) -> CoreResult<Page<Certificate>>;
}

/// In-memory certificate repository
#[derive(Clone, Default)]
pub struct InMemoryCertificateRepository {
    tasks: Arc<RwLock<HashMap<String, CertificateTask>>>,
    certificates: Arc<RwLock<HashMap<String, Certificate>>>,
}

impl InMemoryCertificateRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CertificateRepository for InMemoryCertificateRepository {
    async fn create_certificate_task(&self, task: &CertificateTask) -> CoreResult<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.task_id) {
            return Err(CoreError::StorageError(format!(
                "task {} already exists",
                task.task_id
            )));
        }
        tasks.insert(task.task_id.clone(), task.clone());
        Ok(())
    }

    async fn update_certificate_task(&self, task: &CertificateTask) -> CoreResult<()> {
        let mut tasks = self.tasks.write().await;
        let slot = tasks
            .get_mut(&task.task_id)
            .ok_or_else(|| CoreError::TaskNotFound(task.task_id.clone()))?;
        *slot = task.clone();
        Ok(())
    }

    async fn get_certificate_task(&self, task_id: &str) -> CoreResult<Option<CertificateTask>> {
        Ok(self.tasks.read().await.get(task_id).cloned())
    }

    async fn create_certificate_record(&self, certificate: &Certificate) -> CoreResult<()> {
        let mut certificates = self.certificates.write().await;
        if certificates.contains_key(&certificate.id) {
            return Err(CoreError::StorageError(format!(
                "certificate {} already exists",
                certificate.id
            )));
        }
        certificates.insert(certificate.id.clone(), certificate.clone());
        Ok(())
    }

    async fn update_certificate_record(&self, certificate: &Certificate) -> CoreResult<()> {
        let mut certificates = self.certificates.write().await;
        let slot = certificates
            .get_mut(&certificate.id)
            .ok_or_else(|| CoreError::CertificateNotFound(certificate.id.clone()))?;
        *slot = certificate.clone();
        Ok(())
    }

    async fn get_certificate_by_id(&self, id: &str) -> CoreResult<Option<Certificate>> {
        Ok(self.certificates.read().await.get(id).cloned())
    }

    async fn list_certificates(&self, page: u32, page_size: u32) -> CoreResult<Page<Certificate>> {
        let mut all: Vec<Certificate> = self.certificates.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(Page::slice(all, page, page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskState;

    #[tokio::test]
    async fn task_round_trip() {
        let repo = InMemoryCertificateRepository::new();
        let mut task = CertificateTask::new("t-1", "c-1", "/tmp/t-1.log".into());
        repo.create_certificate_task(&task).await.unwrap();

        task.state = TaskState::Fail;
        task.result = "boom".into();
        repo.update_certificate_task(&task).await.unwrap();

        let stored = repo.get_certificate_task("t-1").await.unwrap().unwrap();
        assert_eq!(stored.state, TaskState::Fail);
        assert_eq!(stored.result, "boom");
    }

    #[tokio::test]
    async fn update_missing_task_fails() {
        let repo = InMemoryCertificateRepository::new();
        let task = CertificateTask::new("missing", "c", "/tmp/x.log".into());
        assert!(matches!(
            repo.update_certificate_task(&task).await,
            Err(CoreError::TaskNotFound(id)) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn duplicate_certificate_rejected() {
        let repo = InMemoryCertificateRepository::new();
        let cert = Certificate::pending("t-1");
        repo.create_certificate_record(&cert).await.unwrap();
        assert!(repo.create_certificate_record(&cert).await.is_err());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let repo = InMemoryCertificateRepository::new();
        let mut older = Certificate::pending("t-1");
        older.created_at -= chrono::Duration::hours(1);
        let newer = Certificate::pending("t-2");
        repo.create_certificate_record(&older).await.unwrap();
        repo.create_certificate_record(&newer).await.unwrap();

        let page = repo.list_certificates(1, 10).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].task_id, "t-2");
    }
}
