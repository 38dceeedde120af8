//! 证书查询服务

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{Certificate, CertificateTask, Page, TaskState};

/// `find_matching` 扫描证书时的分页大小
const SCAN_PAGE_SIZE: u32 = 200;

pub struct CertificateService {
    ctx: Arc<ServiceContext>,
}

impl CertificateService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    pub async fn get_certificate(&self, id: &str) -> CoreResult<Certificate> {
        self.ctx
            .certificate_repository
            .get_certificate_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CertificateNotFound(id.to_string()))
    }

    /// 分页列出证书（新的在前）
    pub async fn list_certificates(
        &self,
        page: u32,
        page_size: u32,
    ) -> CoreResult<Page<Certificate>> {
        self.ctx
            .certificate_repository
            .list_certificates(page, page_size)
            .await
    }

    /// 登记一张已签发的证书（例如从磁盘导入）
    pub async fn register(&self, certificate: &Certificate) -> CoreResult<()> {
        self.ctx
            .certificate_repository
            .create_certificate_record(certificate)
            .await
    }

    pub async fn get_task(&self, task_id: &str) -> CoreResult<CertificateTask> {
        self.ctx
            .certificate_repository
            .get_certificate_task(task_id)
            .await?
            .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))
    }

    /// 读取任务日志原文，任务尚未开始写日志时返回空字符串
    pub async fn read_task_log(&self, task_id: &str) -> CoreResult<String> {
        let task = self.get_task(task_id).await?;
        match tokio::fs::read_to_string(&task.log_path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// 已签发且覆盖 `domain` 的证书
    pub async fn find_matching(&self, domain: &str) -> CoreResult<Vec<Certificate>> {
        let mut matched = Vec::new();
        let mut seen = 0;
        let mut page = 1;
        loop {
            let batch = self
                .ctx
                .certificate_repository
                .list_certificates(page, SCAN_PAGE_SIZE)
                .await?;
            seen += batch.items.len();
            let done = batch.items.is_empty() || seen >= batch.total;

            matched.extend(
                batch
                    .items
                    .into_iter()
                    .filter(|c| c.state == TaskState::Success && c.matches_domain(domain)),
            );
            if done {
                break;
            }
            page += 1;
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_context;

    fn issued(names: &str) -> Certificate {
        let mut cert = Certificate::pending(&uuid::Uuid::new_v4().to_string());
        cert.state = TaskState::Success;
        cert.dns_names = names.to_string();
        cert.domain_list = names.to_string();
        cert
    }

    #[tokio::test]
    async fn finds_wildcard_and_exact_matches() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = create_test_context(dir.path());
        let repo = &ctx.certificate_repository;

        let wildcard = issued("*.example.com,example.com");
        let other = issued("example.org");
        let mut pending = issued("*.example.com");
        pending.state = TaskState::Apply;
        for cert in [&wildcard, &other, &pending] {
            repo.create_certificate_record(cert).await.unwrap();
        }

        let service = CertificateService::new(ctx.clone());
        let found = service.find_matching("www.example.com").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, wildcard.id);

        assert!(service.find_matching("a.b.example.com").await.unwrap().is_empty());
        assert_eq!(service.find_matching("EXAMPLE.org").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_records_are_typed_errors() {
        let dir = tempfile::tempdir().unwrap();
        let service = CertificateService::new(create_test_context(dir.path()));
        assert!(matches!(
            service.get_certificate("nope").await,
            Err(CoreError::CertificateNotFound(_))
        ));
        assert!(matches!(
            service.read_task_log("nope").await,
            Err(CoreError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn task_log_is_returned_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = create_test_context(dir.path());
        let log_path = dir.path().join("t.log");
        let task = CertificateTask::new("t-1", "c-1", log_path.clone());
        ctx.certificate_repository
            .create_certificate_task(&task)
            .await
            .unwrap();

        let service = CertificateService::new(ctx);
        assert_eq!(service.read_task_log("t-1").await.unwrap(), "");

        tokio::fs::write(&log_path, "line one\nline two\n").await.unwrap();
        assert_eq!(
            service.read_task_log("t-1").await.unwrap(),
            "line one\nline two\n"
        );
    }
}
