//! Provider registry abstract Trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use dns_cert_provider::RecordProvider;

use crate::error::{CoreError, CoreResult};

/// Provider Registry Trait
///
/// Resolves `RecordProvider` instances by account name. The same instance is
/// returned for an account for the lifetime of the registry, so adapter caches
/// are shared by every caller.
#[async_trait]
pub trait ProviderRegistry: Send + Sync {
    /// Get the Provider for an account
    ///
    /// # Arguments
    /// * `account_name` - Account name from configuration
    ///
    /// # Errors
    /// * `AccountNotFound` - unknown account
    /// * `UnsupportedProvider` - vendor not compiled in
    async fn resolve(&self, account_name: &str) -> CoreResult<Arc<dyn RecordProvider>>;

    /// Register a Provider instance, replacing any cached one
    async fn register(&self, account_name: String, provider: Arc<dyn RecordProvider>);

    /// Account that hosts delegated challenge records, if configured
    fn apply_account(&self) -> Option<&str>;

    /// Get the Provider of the apply account
    async fn apply_provider(&self) -> CoreResult<Arc<dyn RecordProvider>> {
        let account = self.apply_account().ok_or_else(|| {
            CoreError::Config("certificate.apply_account is not configured".to_string())
        })?;
        self.resolve(account).await
    }
}

/// In-memory Provider registry
///
/// Only serves explicitly registered providers.
#[derive(Clone, Default)]
pub struct InMemoryProviderRegistry {
    providers: Arc<RwLock<HashMap<String, Arc<dyn RecordProvider>>>>,
    apply_account: Option<String>,
}

impl InMemoryProviderRegistry {
    /// Create a new memory registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_apply_account(mut self, account_name: impl Into<String>) -> Self {
        self.apply_account = Some(account_name.into());
        self
    }
}

#[async_trait]
impl ProviderRegistry for InMemoryProviderRegistry {
    async fn resolve(&self, account_name: &str) -> CoreResult<Arc<dyn RecordProvider>> {
        self.providers
            .read()
            .await
            .get(account_name)
            .cloned()
            .ok_or_else(|| CoreError::AccountNotFound(account_name.to_string()))
    }

    async fn register(&self, account_name: String, provider: Arc<dyn RecordProvider>) {
        self.providers.write().await.insert(account_name, provider);
    }

    fn apply_account(&self) -> Option<&str> {
        self.apply_account.as_deref()
    }
}
