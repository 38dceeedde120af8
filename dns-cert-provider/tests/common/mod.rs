//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::env;
use std::sync::Arc;

use dns_cert_provider::{
    DnsSearch, DomainRecord, ProviderCredentials, RecordProvider, create_provider,
};

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("跳过测试: 缺少环境变量 {}", $var);
                return;
            }
        )+
    };
}

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 生成唯一的测试记录名称
pub fn generate_test_record_name() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("_test-{}", &uuid.to_string()[..8])
}

/// 测试上下文 - 封装 Provider 和测试域名
pub struct TestContext {
    pub provider: Arc<dyn RecordProvider>,
    pub domain: String,
    pub domain_id: String,
}

impl TestContext {
    fn build(credentials: ProviderCredentials) -> Option<Self> {
        let domain = env::var("TEST_DOMAIN").ok()?;
        let provider = create_provider(credentials).ok()?;
        Some(Self {
            provider,
            domain,
            domain_id: String::new(),
        })
    }

    /// 创建 Cloudflare 测试上下文
    pub fn cloudflare() -> Option<Self> {
        Self::build(ProviderCredentials::Cloudflare {
            api_token: env::var("CLOUDFLARE_API_TOKEN").ok()?,
        })
    }

    /// 创建 Aliyun 测试上下文
    pub fn aliyun() -> Option<Self> {
        Self::build(ProviderCredentials::Aliyun {
            access_key_id: env::var("ALIYUN_ACCESS_KEY_ID").ok()?,
            access_key_secret: env::var("ALIYUN_ACCESS_KEY_SECRET").ok()?,
        })
    }

    /// 创建 `DNSPod` 测试上下文
    pub fn dnspod() -> Option<Self> {
        Self::build(ProviderCredentials::Dnspod {
            secret_id: env::var("DNSPOD_SECRET_ID").ok()?,
            secret_key: env::var("DNSPOD_SECRET_KEY").ok()?,
        })
    }

    /// 查找测试域名的 `domain_id`
    pub async fn find_domain_id(&mut self) -> Option<String> {
        if !self.domain_id.is_empty() {
            return Some(self.domain_id.clone());
        }
        let domain = self.provider.find_domain(&self.domain).await.ok()??;
        self.domain_id.clone_from(&domain.id);
        Some(domain.id)
    }

    /// 在测试域名下构造一条 TXT 记录
    pub fn txt(&self, host: &str, value: &str) -> DomainRecord {
        DomainRecord {
            ttl: 600,
            ..DomainRecord::txt(&self.domain_id, &self.domain, host, value)
        }
    }

    /// 按主机记录查询 TXT
    pub async fn find_txt(&self, host: &str) -> Vec<DomainRecord> {
        let search = DnsSearch::for_domain(&self.domain_id, &self.domain)
            .with_host(host)
            .with_type("TXT");
        self.provider
            .get_record_list(&search)
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.record_name == host)
            .collect()
    }

    /// 查找并清理所有测试记录（以 _test- 开头的记录）
    pub async fn cleanup_all_test_records(&self) {
        let mut search = DnsSearch::for_domain(&self.domain_id, &self.domain);
        search.keyword = "_test-".to_string();
        search.page = 1;
        search.page_size = 100;

        if let Ok(records) = self.provider.get_record_list(&search).await {
            for record in records {
                if record.record_name.starts_with("_test-") {
                    let _ = self.provider.delete_record(&self.domain, &record.id).await;
                }
            }
        }
    }
}
