use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::types::{
    DnsSearch, DomainInfo, DomainList, DomainRecord, DomainsSearch, ProviderType, RecordStatus,
};

/// 原始 API 错误（内部使用）
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// 错误码（各 Provider 格式不同）
    pub code: Option<String>,
    /// 原始错误消息
    pub message: String,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// 错误上下文信息（内部使用）
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    pub record_name: Option<String>,
    pub record_id: Option<String>,
    pub domain: Option<String>,
}

impl ErrorContext {
    pub fn record(domain: &str, record_id: &str) -> Self {
        Self {
            record_id: Some(record_id.to_string()),
            domain: Some(domain.to_string()),
            ..Self::default()
        }
    }

    pub fn record_name(domain: &str, record_name: &str) -> Self {
        Self {
            record_name: Some(record_name.to_string()),
            domain: Some(domain.to_string()),
            ..Self::default()
        }
    }

    pub fn domain(domain: &str) -> Self {
        Self {
            domain: Some(domain.to_string()),
            ..Self::default()
        }
    }
}

/// Provider 错误映射 Trait（内部使用）
/// 各 Provider 实现此 trait 以将原始 API 错误映射到统一错误类型
pub(crate) trait ProviderErrorMapper {
    fn provider_name(&self) -> &'static str;

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }

    fn invalid_id(&self, id: &str) -> ProviderError {
        ProviderError::InvalidIdentifier {
            provider: self.provider_name().to_string(),
            id: id.to_string(),
        }
    }
}

/// Uniform record-provider contract implemented by every vendor adapter.
///
/// All identifiers are strings. Results carry `dns_from` set to the adapter's
/// [`ProviderType`]. Errors are returned without retrying.
#[async_trait]
pub trait RecordProvider: Send + Sync {
    /// 提供商标识符
    fn id(&self) -> &'static str;

    fn provider_type(&self) -> ProviderType;

    /// 获取域名列表 (分页)
    async fn get_domain_list(&self, search: &DomainsSearch) -> Result<DomainList>;

    /// 获取 DNS 记录列表 (分页 + 搜索)
    async fn get_record_list(&self, search: &DnsSearch) -> Result<Vec<DomainRecord>>;

    async fn add_record(&self, record: &DomainRecord) -> Result<DomainRecord>;

    async fn update_record(&self, record: &DomainRecord) -> Result<DomainRecord>;

    /// Delete a record, returning the last known state of it.
    async fn delete_record(&self, domain_name: &str, record_id: &str) -> Result<DomainRecord>;

    async fn set_record_status(
        &self,
        domain_name: &str,
        record_id: &str,
        status: RecordStatus,
    ) -> Result<DomainRecord>;

    async fn get_record_info(&self, domain_name: &str, record_id: &str) -> Result<DomainRecord>;

    /// Find a domain by exact name, walking the domain list page by page.
    async fn find_domain(&self, domain_name: &str) -> Result<Option<DomainInfo>> {
        let mut search = DomainsSearch::page(1, 100);
        search.keyword = domain_name.to_string();
        loop {
            let list = self.get_domain_list(&search).await?;
            if let Some(found) = list
                .domains
                .iter()
                .find(|d| d.name.eq_ignore_ascii_case(domain_name))
            {
                return Ok(Some(found.clone()));
            }
            if !list.has_more() || list.domains.is_empty() {
                return Ok(None);
            }
            search.page += 1;
        }
    }
}
