//! 基于配置的 Provider 注册表
//!
//! 账户首次被解析时按配置创建 Provider，之后在进程生命周期内复用同一实例。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dns_cert_provider::{ProviderError, RecordProvider, create_provider};

use crate::config::AccountConfig;
use crate::error::{CoreError, CoreResult};
use crate::traits::ProviderRegistry;

pub struct ConfigProviderRegistry {
    accounts: HashMap<String, AccountConfig>,
    apply_account: Option<String>,
    providers: RwLock<HashMap<String, Arc<dyn RecordProvider>>>,
}

impl ConfigProviderRegistry {
    /// # Arguments
    /// * `accounts` - 配置中的账户列表
    /// * `apply_account` - CNAME 委派目标所在账户，空字符串表示未配置
    #[must_use]
    pub fn new(accounts: &[AccountConfig], apply_account: &str) -> Self {
        Self {
            accounts: accounts
                .iter()
                .map(|a| (a.name.clone(), a.clone()))
                .collect(),
            apply_account: (!apply_account.is_empty()).then(|| apply_account.to_string()),
            providers: RwLock::new(HashMap::new()),
        }
    }

    fn build(&self, account_name: &str) -> CoreResult<Arc<dyn RecordProvider>> {
        let account = self
            .accounts
            .get(account_name)
            .ok_or_else(|| CoreError::AccountNotFound(account_name.to_string()))?;

        create_provider(account.credentials()?).map_err(|e| match e {
            ProviderError::UnsupportedProvider { provider } => {
                CoreError::UnsupportedProvider(provider)
            }
            other => CoreError::Provider(other),
        })
    }
}

#[async_trait]
impl ProviderRegistry for ConfigProviderRegistry {
    async fn resolve(&self, account_name: &str) -> CoreResult<Arc<dyn RecordProvider>> {
        if let Some(provider) = self.providers.read().await.get(account_name) {
            return Ok(Arc::clone(provider));
        }

        let mut providers = self.providers.write().await;
        // 等待写锁期间可能已被其他调用方创建
        if let Some(provider) = providers.get(account_name) {
            return Ok(Arc::clone(provider));
        }
        let provider = self.build(account_name)?;
        log::info!(
            "Provider {} created for account {account_name}",
            provider.id()
        );
        providers.insert(account_name.to_string(), Arc::clone(&provider));
        Ok(provider)
    }

    async fn register(&self, account_name: String, provider: Arc<dyn RecordProvider>) {
        self.providers.write().await.insert(account_name, provider);
    }

    fn apply_account(&self) -> Option<&str> {
        self.apply_account.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str, provider: &str) -> AccountConfig {
        AccountConfig {
            name: name.into(),
            provider: provider.into(),
            access_key_id: "id".into(),
            access_key_secret: "secret".into(),
        }
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let registry = ConfigProviderRegistry::new(&[account("main", "aliyun")], "");
        assert!(matches!(
            registry.resolve("other").await,
            Err(CoreError::AccountNotFound(name)) if name == "other"
        ));
    }

    #[tokio::test]
    async fn unknown_vendor_is_unsupported() {
        let registry = ConfigProviderRegistry::new(&[account("main", "route53")], "");
        assert!(matches!(
            registry.resolve("main").await,
            Err(CoreError::UnsupportedProvider(p)) if p == "route53"
        ));
    }

    #[tokio::test]
    async fn resolved_provider_is_cached() {
        let registry = ConfigProviderRegistry::new(&[account("main", "dnspod")], "main");
        let first = registry.resolve("main").await.unwrap();
        let second = registry.resolve("main").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id(), "dnspod");

        let apply = registry.apply_provider().await.unwrap();
        assert!(Arc::ptr_eq(&first, &apply));
    }

    #[tokio::test]
    async fn apply_provider_requires_configuration() {
        let registry = ConfigProviderRegistry::new(&[account("main", "aliyun")], "");
        assert!(matches!(
            registry.apply_provider().await,
            Err(CoreError::Config(_))
        ));
    }
}
