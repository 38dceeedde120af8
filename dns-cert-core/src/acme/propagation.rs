//! TXT 记录传播检查
//!
//! 服务商 API 返回成功并不代表权威服务器已经能解析到新记录，
//! 在通知 CA 校验前轮询公共 DNS，直到查到期望的挑战值或超时。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use tokio::time::Instant;

use crate::error::{CoreError, CoreResult};
use crate::services::challenge::challenge_record;

/// 传播检查参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationConfig {
    /// 首次查询前等待
    pub initial_delay: Duration,
    pub check_interval: Duration,
    pub timeout: Duration,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(10),
            check_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(120),
        }
    }
}

/// TXT 查询
#[async_trait]
pub trait TxtLookup: Send + Sync {
    /// 查询 `name` 的全部 TXT 值，没有记录时返回空列表
    async fn lookup_txt(&self, name: &str) -> CoreResult<Vec<String>>;
}

/// 不带缓存的 hickory 解析器，每次查询都会真正发出请求
pub struct HickoryTxtLookup {
    resolver: TokioResolver,
}

impl HickoryTxtLookup {
    #[must_use]
    pub fn new() -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_secs(5);
        opts.attempts = 3;
        opts.cache_size = 0;

        let resolver = TokioResolver::builder_with_config(
            ResolverConfig::default(),
            TokioConnectionProvider::default(),
        )
        .with_options(opts)
        .build();
        Self { resolver }
    }
}

impl Default for HickoryTxtLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TxtLookup for HickoryTxtLookup {
    async fn lookup_txt(&self, name: &str) -> CoreResult<Vec<String>> {
        match self.resolver.txt_lookup(name).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|txt| {
                    txt.txt_data()
                        .iter()
                        .map(|data| String::from_utf8_lossy(data))
                        .collect::<String>()
                })
                .collect()),
            // NXDOMAIN / 空应答在传播期间是正常的
            Err(e) => {
                log::debug!("TXT lookup for {name} failed: {e}");
                Ok(Vec::new())
            }
        }
    }
}

/// 等待挑战记录在公共 DNS 上可见
#[derive(Clone)]
pub struct PropagationChecker {
    config: PropagationConfig,
    lookup: Arc<dyn TxtLookup>,
}

impl PropagationChecker {
    #[must_use]
    pub fn new(config: PropagationConfig, lookup: Arc<dyn TxtLookup>) -> Self {
        Self { config, lookup }
    }

    pub fn config(&self) -> PropagationConfig {
        self.config
    }

    /// 轮询 `_acme-challenge.<domain>` 直到出现 `key_auth` 对应的值
    pub async fn wait_for(&self, domain: &str, key_auth: &str) -> CoreResult<()> {
        let record = challenge_record(domain, key_auth);
        let deadline = Instant::now() + self.config.timeout;
        log::debug!(
            "[propagation] waiting up to {}s for {}",
            self.config.timeout.as_secs(),
            record.fqdn
        );

        tokio::time::sleep(self.config.initial_delay).await;
        loop {
            let values = self.lookup.lookup_txt(&record.fqdn).await?;
            if values.iter().any(|v| *v == record.value) {
                log::info!("[propagation] {} is visible", record.fqdn);
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(CoreError::Challenge {
                    domain: domain.to_string(),
                    message: format!(
                        "TXT record {} not propagated after {}s",
                        record.fqdn,
                        self.config.timeout.as_secs()
                    ),
                });
            }
            tokio::time::sleep(self.config.check_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    /// 第 `visible_after` 次查询起返回记录
    struct DelayedLookup {
        visible_after: usize,
        value: String,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl TxtLookup for DelayedLookup {
        async fn lookup_txt(&self, _name: &str) -> CoreResult<Vec<String>> {
            let mut calls = self.calls.lock().await;
            *calls += 1;
            if *calls >= self.visible_after {
                Ok(vec!["unrelated".to_string(), self.value.clone()])
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn fast() -> PropagationConfig {
        PropagationConfig {
            initial_delay: Duration::from_millis(1),
            check_interval: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn waits_until_value_is_visible() {
        let lookup = Arc::new(DelayedLookup {
            visible_after: 3,
            value: challenge_record("example.com", "token.thumb").value,
            calls: Mutex::new(0),
        });
        let checker = PropagationChecker::new(fast(), lookup.clone());

        checker.wait_for("example.com", "token.thumb").await.unwrap();
        assert_eq!(*lookup.calls.lock().await, 3);
    }

    #[tokio::test]
    async fn other_values_time_out() {
        let lookup = Arc::new(DelayedLookup {
            visible_after: 1,
            value: challenge_record("example.com", "stale.thumb").value,
            calls: Mutex::new(0),
        });
        let checker = PropagationChecker::new(fast(), lookup);

        let err = checker
            .wait_for("example.com", "token.thumb")
            .await
            .unwrap_err();
        assert!(
            matches!(&err, CoreError::Challenge { domain, message }
                if domain == "example.com" && message.contains("_acme-challenge.example.com.")),
            "{err}"
        );
    }

    #[test]
    fn default_config() {
        let config = PropagationConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(10));
        assert_eq!(config.check_interval, Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(120));
    }
}
