//! TOML 配置
//!
//! 配置由可执行程序加载一次，之后通过构造函数注入各服务，不存在全局状态。
//!
//! ```toml
//! [server]
//! log_level = "info"
//!
//! [certificate]
//! email_list = ["ops@example.com", "acme@example.com"]
//! max_requests = 50
//! save_path = "/var/lib/dns-cert"
//! apply_account = "main"
//! apply_domain_id = "123456"
//! apply_domain_name = "acme-proxy.example.com"
//!
//! [[accounts]]
//! name = "main"
//! provider = "aliyun"
//! access_key_id = "LTAI..."
//! access_key_secret = "..."
//! ```
//!
//! 旧版配置中的 `certificateConfig` / `account` / `EmailList` 等键名同样可以识别。

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use dns_cert_provider::{ProviderCredentials, ProviderType};

use crate::error::{CoreError, CoreResult};

/// Let's Encrypt 生产环境目录
pub const LETS_ENCRYPT_PRODUCTION: &str = "https://acme-v02.api.letsencrypt.org/directory";

/// Let's Encrypt 测试环境目录
pub const LETS_ENCRYPT_STAGING: &str = "https://acme-staging-v02.api.letsencrypt.org/directory";

/// 三个优先级各至少一个 worker
pub const MIN_CONCURRENCY: usize = 3;

/// 根配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, alias = "baseConfig")]
    pub server: ServerConfig,
    #[serde(alias = "certificateConfig")]
    pub certificate: CertificateConfig,
    #[serde(default, alias = "account")]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 未设置 `RUST_LOG` 时使用的日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// 证书签发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateConfig {
    /// ACME 账户邮箱池，按轮询方式使用
    #[serde(alias = "EmailList")]
    pub email_list: Vec<String>,

    /// 单个 ACME 会话允许签发的证书数量
    #[serde(alias = "MaxRequest")]
    pub max_requests: u32,

    /// 证书文件与任务日志的根目录
    #[serde(alias = "SavePath")]
    pub save_path: PathBuf,

    /// 承载 CNAME 委派 TXT 记录的账户
    #[serde(default, alias = "ApplyAccount")]
    pub apply_account: String,

    #[serde(default, alias = "ApplyDomainId")]
    pub apply_domain_id: String,

    #[serde(default, alias = "ApplyDomainName")]
    pub apply_domain_name: String,

    /// 任务并发总数，按优先级拆分
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_directory_url")]
    pub directory_url: String,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            email_list: Vec::new(),
            max_requests: 0,
            save_path: PathBuf::new(),
            apply_account: String::new(),
            apply_domain_id: String::new(),
            apply_domain_name: String::new(),
            concurrency: default_concurrency(),
            directory_url: default_directory_url(),
        }
    }
}

impl CertificateConfig {
    /// 是否配置了 CNAME 委派目标域名
    pub fn has_apply_domain(&self) -> bool {
        !self.apply_account.is_empty() && !self.apply_domain_name.is_empty()
    }
}

/// DNS 服务商账户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(alias = "Name")]
    pub name: String,

    /// `aliyun` / `cloudflare` / `dnspod`
    #[serde(alias = "Type")]
    pub provider: String,

    #[serde(default, alias = "AccessKeyId")]
    pub access_key_id: String,

    /// Cloudflare 的 API Token 也放在这里
    #[serde(default, alias = "AccessKeySecret")]
    pub access_key_secret: String,
}

impl AccountConfig {
    /// 解析服务商类型
    pub fn provider_type(&self) -> CoreResult<ProviderType> {
        self.provider
            .parse()
            .map_err(|_| CoreError::UnsupportedProvider(self.provider.clone()))
    }

    /// 转换为 provider 库的凭证
    pub fn credentials(&self) -> CoreResult<ProviderCredentials> {
        Ok(ProviderCredentials::from_key_pair(
            self.provider_type()?,
            &self.access_key_id,
            &self.access_key_secret,
        ))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_concurrency() -> usize {
    10
}

fn default_directory_url() -> String {
    LETS_ENCRYPT_PRODUCTION.to_string()
}

impl AppConfig {
    /// 从文件加载并校验
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::parse(&content)
    }

    /// 从 TOML 字符串解析并校验
    pub fn parse(content: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置，失败立即返回
    pub fn validate(&self) -> CoreResult<()> {
        let cert = &self.certificate;
        if cert.email_list.iter().all(|e| e.trim().is_empty()) {
            return Err(CoreError::Config(
                "certificate.email_list must contain at least one email".to_string(),
            ));
        }
        if cert.max_requests == 0 {
            return Err(CoreError::Config(
                "certificate.max_requests must be greater than 0".to_string(),
            ));
        }
        if cert.concurrency < MIN_CONCURRENCY {
            return Err(CoreError::Config(format!(
                "certificate.concurrency must be at least {MIN_CONCURRENCY}"
            )));
        }

        let mut names = HashSet::new();
        for account in &self.accounts {
            if account.name.is_empty() {
                return Err(CoreError::Config("account name must not be empty".to_string()));
            }
            if !names.insert(account.name.as_str()) {
                return Err(CoreError::Config(format!(
                    "duplicate account name: {}",
                    account.name
                )));
            }
        }

        if !cert.apply_account.is_empty() && !names.contains(cert.apply_account.as_str()) {
            return Err(CoreError::Config(format!(
                "certificate.apply_account `{}` is not a configured account",
                cert.apply_account
            )));
        }
        Ok(())
    }

    /// 按名称查找账户
    pub fn account(&self, name: &str) -> Option<&AccountConfig> {
        self.accounts.iter().find(|a| a.name == name)
    }
}
