//! 域名持久化抽象 Trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::CoreResult;
use crate::types::Domain;

/// 域名仓库 Trait
///
/// 由 `DomainService::sync_domains` 写入，Challenge Bridge 据此判断域名是否由本系统托管。
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// 按服务商域名 ID 查询
    async fn get_domain_by_id(&self, id: &str) -> CoreResult<Option<Domain>>;

    /// 按域名查询（忽略大小写与末尾的点）
    async fn find_domain_by_name(&self, name: &str) -> CoreResult<Option<Domain>>;

    /// 域名是否已托管
    async fn domain_exists_by_name(&self, name: &str) -> CoreResult<bool> {
        Ok(self.find_domain_by_name(name).await?.is_some())
    }

    /// 保存或覆盖域名（以 ID 为键）
    ///
    /// # Arguments
    /// * `domain` - 完整的域名记录
    async fn upsert_domain(&self, domain: &Domain) -> CoreResult<()>;

    /// 列出域名
    ///
    /// # Arguments
    /// * `account_name` - `Some` 时只返回该账户下的域名
    async fn list_domains(&self, account_name: Option<&str>) -> CoreResult<Vec<Domain>>;
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// In-memory domain repository
#[derive(Clone, Default)]
pub struct InMemoryDomainRepository {
    domains: Arc<RwLock<HashMap<String, Domain>>>,
}

impl InMemoryDomainRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DomainRepository for InMemoryDomainRepository {
    async fn get_domain_by_id(&self, id: &str) -> CoreResult<Option<Domain>> {
        Ok(self.domains.read().await.get(id).cloned())
    }

    async fn find_domain_by_name(&self, name: &str) -> CoreResult<Option<Domain>> {
        let name = normalize_name(name);
        Ok(self
            .domains
            .read()
            .await
            .values()
            .find(|d| normalize_name(&d.domain_name) == name)
            .cloned())
    }

    async fn upsert_domain(&self, domain: &Domain) -> CoreResult<()> {
        self.domains
            .write()
            .await
            .insert(domain.id.clone(), domain.clone());
        Ok(())
    }

    async fn list_domains(&self, account_name: Option<&str>) -> CoreResult<Vec<Domain>> {
        let mut domains: Vec<Domain> = self
            .domains
            .read()
            .await
            .values()
            .filter(|d| account_name.is_none_or(|a| d.account_name == a))
            .cloned()
            .collect();
        domains.sort_by(|a, b| a.domain_name.cmp(&b.domain_name));
        Ok(domains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(id: &str, name: &str, account: &str) -> Domain {
        Domain {
            id: id.into(),
            domain_name: name.into(),
            account_name: account.into(),
            ..Domain::default()
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_by_id() {
        let repo = InMemoryDomainRepository::new();
        repo.upsert_domain(&domain("1", "example.com", "a")).await.unwrap();
        let mut updated = domain("1", "example.com", "a");
        updated.status = "ENABLE".into();
        repo.upsert_domain(&updated).await.unwrap();

        let all = repo.list_domains(None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, "ENABLE");
    }

    #[tokio::test]
    async fn name_lookup_is_normalized() {
        let repo = InMemoryDomainRepository::new();
        repo.upsert_domain(&domain("1", "Example.com", "a")).await.unwrap();

        assert!(repo.domain_exists_by_name("example.com.").await.unwrap());
        assert!(!repo.domain_exists_by_name("example.org").await.unwrap());
    }

    #[tokio::test]
    async fn list_filters_by_account() {
        let repo = InMemoryDomainRepository::new();
        repo.upsert_domain(&domain("1", "b.com", "a")).await.unwrap();
        repo.upsert_domain(&domain("2", "a.com", "a")).await.unwrap();
        repo.upsert_domain(&domain("3", "c.com", "other")).await.unwrap();

        let names: Vec<String> = repo
            .list_domains(Some("a"))
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.domain_name)
            .collect();
        assert_eq!(names, vec!["a.com", "b.com"]);
    }
}
