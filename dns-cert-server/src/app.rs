//! 根据配置装配服务

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use dns_cert_core::acme::InstantAcmeEngine;
use dns_cert_core::services::{
    CertificateService, CertificateStorage, DomainService, HickoryCnameVerifier, SessionManager,
    TaskReceivers, TaskService, WorkerPool, parse_certificate,
};
use dns_cert_core::traits::{InMemoryCertificateRepository, InMemoryDomainRepository};
use dns_cert_core::types::{
    Certificate, CertificateTask, IssueKind, IssueRequest, Priority, TaskState,
};
use dns_cert_core::{AppConfig, ConfigProviderRegistry, ServiceContext};
use serde::Serialize;

/// 一次签发的结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueOutcome {
    pub task: CertificateTask,
    pub certificate: Certificate,
}

impl IssueOutcome {
    pub fn succeeded(&self) -> bool {
        self.task.state == TaskState::Success
    }
}

pub struct App {
    config: AppConfig,
    pub domains: DomainService,
    pub certificates: CertificateService,
    tasks: Arc<TaskService>,
    receivers: Option<TaskReceivers>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let ctx = Arc::new(ServiceContext::new(
            config.certificate.clone(),
            Arc::new(ConfigProviderRegistry::new(
                &config.accounts,
                &config.certificate.apply_account,
            )),
            Arc::new(InMemoryDomainRepository::new()),
            Arc::new(InMemoryCertificateRepository::new()),
            Arc::new(HickoryCnameVerifier::new()),
        ));

        let engine = Arc::new(InstantAcmeEngine::new(
            config.certificate.directory_url.clone(),
        ));
        let session = Arc::new(SessionManager::new(
            engine,
            config.certificate.email_list.clone(),
            config.certificate.max_requests,
        ));
        let (tasks, receivers) = TaskService::new(Arc::clone(&ctx), session);

        Self {
            domains: DomainService::new(Arc::clone(&ctx)),
            certificates: CertificateService::new(ctx),
            tasks: Arc::new(tasks),
            receivers: Some(receivers),
            config,
        }
    }

    /// 签发前同步账户下的域名，用于区分托管域名与委派域名
    pub async fn prepare(&self, account: &str) -> Result<()> {
        let count = self
            .domains
            .sync_domains(account)
            .await
            .with_context(|| format!("failed to sync domains of account {account}"))?;
        tracing::info!("Account {account}: {count} domain(s) available");
        Ok(())
    }

    /// 登记磁盘上已有的证书，供续期使用
    pub async fn import_saved(&self, save_path: &Path) -> Result<Certificate> {
        let resource = CertificateStorage::load(save_path)
            .await
            .with_context(|| format!("failed to load {}", save_path.display()))?;
        let parsed = parse_certificate(&resource.certificate)?;

        let mut certificate = Certificate::pending("imported");
        certificate.state = TaskState::Success;
        certificate.save_path = resource.save_path;
        certificate.apply_parsed(parsed);
        self.certificates.register(&certificate).await?;
        Ok(certificate)
    }

    /// 提交任务并等待完成
    pub async fn issue(
        &mut self,
        account: &str,
        domains: Vec<String>,
        kind: IssueKind,
        priority: Priority,
    ) -> Result<IssueOutcome> {
        let Some(receivers) = self.receivers.take() else {
            bail!("worker pool already used");
        };

        let request = IssueRequest {
            account: account.to_string(),
            domains,
            kind,
            priority,
        };
        let submitted = self.tasks.submit(request).await?;
        tracing::info!(
            "Task {} submitted, log at {}",
            submitted.task_id,
            submitted.log_path.display()
        );

        let pool = WorkerPool::start(
            Arc::clone(&self.tasks),
            receivers,
            self.config.certificate.concurrency,
        );
        self.tasks.close().await;
        pool.join().await;

        Ok(IssueOutcome {
            task: self.certificates.get_task(&submitted.task_id).await?,
            certificate: self
                .certificates
                .get_certificate(&submitted.certificate_id)
                .await?,
        })
    }
}
