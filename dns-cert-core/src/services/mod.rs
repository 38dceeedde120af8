//! 业务逻辑服务层

pub mod certificate;
pub mod challenge;
mod certificate_service;
mod domain_service;
pub mod session;
pub mod task;

pub use certificate::{CertificateStorage, parse_certificate};
pub use certificate_service::CertificateService;
pub use challenge::{
    ApplyDomain, ChallengeBridge, CnameInfo, CnameVerifier, HickoryCnameVerifier,
    cname_delegation_info,
};
pub use domain_service::DomainService;
pub use session::SessionManager;
pub use task::{TaskLogger, TaskReceivers, TaskService, WorkerPool, WorkerSplit};

use std::sync::Arc;

use dns_cert_provider::{ProviderError, RecordProvider};

use crate::config::CertificateConfig;
use crate::error::{CoreError, CoreResult};
use crate::traits::{CertificateRepository, DomainRepository, ProviderRegistry};

/// 服务上下文 - 持有所有依赖
///
/// 二进制入口根据配置创建此上下文，并注入存储实现。
pub struct ServiceContext {
    pub certificate_config: CertificateConfig,
    /// Provider 注册表
    pub provider_registry: Arc<dyn ProviderRegistry>,
    pub domain_repository: Arc<dyn DomainRepository>,
    pub certificate_repository: Arc<dyn CertificateRepository>,
    /// 委派域名的 CNAME 校验
    pub cname_verifier: Arc<dyn CnameVerifier>,
    /// 证书文件存储，根目录为 `certificate_config.save_path`
    pub storage: CertificateStorage,
}

impl ServiceContext {
    #[must_use]
    pub fn new(
        certificate_config: CertificateConfig,
        provider_registry: Arc<dyn ProviderRegistry>,
        domain_repository: Arc<dyn DomainRepository>,
        certificate_repository: Arc<dyn CertificateRepository>,
        cname_verifier: Arc<dyn CnameVerifier>,
    ) -> Self {
        let storage = CertificateStorage::new(certificate_config.save_path.clone());
        Self {
            certificate_config,
            provider_registry,
            domain_repository,
            certificate_repository,
            cname_verifier,
            storage,
        }
    }

    /// 获取 Provider 实例
    pub async fn get_provider(&self, account_name: &str) -> CoreResult<Arc<dyn RecordProvider>> {
        self.provider_registry.resolve(account_name).await
    }

    /// 转换 Provider 错误，凭证失效时单独告警
    pub fn handle_provider_error(&self, account_name: &str, err: ProviderError) -> CoreError {
        if let ProviderError::InvalidCredentials { .. } = &err {
            log::warn!("Credentials of account {account_name} were rejected: {err}");
        }
        CoreError::Provider(err)
    }
}
