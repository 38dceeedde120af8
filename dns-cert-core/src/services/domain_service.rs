//! 域名管理服务

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::services::challenge::{CnameInfo, cname_delegation_info};
use crate::types::{DnsSearch, Domain, DomainRecord, DomainsSearch, RecordStatus};

/// 同步时每页拉取的域名数
const SYNC_PAGE_SIZE: u32 = 100;

/// 域名管理服务
pub struct DomainService {
    ctx: Arc<ServiceContext>,
}

impl DomainService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// 从服务商拉取账户下全部域名并写入仓库
    ///
    /// 已关联的证书 ID 保留不变。返回同步的域名数。
    pub async fn sync_domains(&self, account_name: &str) -> CoreResult<usize> {
        let provider = self.ctx.get_provider(account_name).await?;

        let mut synced = 0;
        let mut page = 1;
        loop {
            let list = match provider
                .get_domain_list(&DomainsSearch::page(page, SYNC_PAGE_SIZE))
                .await
            {
                Ok(list) => list,
                Err(e) => return Err(self.ctx.handle_provider_error(account_name, e)),
            };

            for info in list.domains.iter().cloned() {
                let mut domain = Domain::from_provider(info, account_name);
                if let Some(existing) = self.ctx.domain_repository.get_domain_by_id(&domain.id).await? {
                    domain.certificate_id = existing.certificate_id;
                }
                self.ctx.domain_repository.upsert_domain(&domain).await?;
                synced += 1;
            }

            if !list.has_more() || list.domains.is_empty() {
                break;
            }
            page += 1;
        }

        log::info!("Synced {synced} domain(s) for account {account_name}");
        Ok(synced)
    }

    /// 仓库中的域名
    pub async fn list_domains(&self, account_name: Option<&str>) -> CoreResult<Vec<Domain>> {
        self.ctx.domain_repository.list_domains(account_name).await
    }

    /// 查询域名下的解析记录
    pub async fn records(
        &self,
        account_name: &str,
        search: &DnsSearch,
    ) -> CoreResult<Vec<DomainRecord>> {
        let provider = self.ctx.get_provider(account_name).await?;
        provider
            .get_record_list(search)
            .await
            .map_err(|e| self.ctx.handle_provider_error(account_name, e))
    }

    /// 启用 / 暂停解析记录
    pub async fn set_record_status(
        &self,
        account_name: &str,
        domain_name: &str,
        record_id: &str,
        status: RecordStatus,
    ) -> CoreResult<DomainRecord> {
        let provider = self.ctx.get_provider(account_name).await?;
        provider
            .set_record_status(domain_name, record_id, status)
            .await
            .map_err(|e| self.ctx.handle_provider_error(account_name, e))
    }

    /// 非托管域名需要添加的 CNAME 委派记录
    pub fn cname_info(&self, domains: &[String]) -> CoreResult<Vec<CnameInfo>> {
        let config = &self.ctx.certificate_config;
        if !config.has_apply_domain() {
            return Err(CoreError::Config(
                "certificate.apply_domain_name is not configured".to_string(),
            ));
        }
        Ok(cname_delegation_info(domains, &config.apply_domain_name))
    }
}
