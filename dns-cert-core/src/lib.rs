//! DNS Certificate Core Library
//!
//! 多服务商 DNS 记录之上的 ACME DNS-01 证书签发：
//! - Provider 注册表（按账户名解析 `RecordProvider`）
//! - Challenge Bridge（TXT 记录的发布与清理，支持 CNAME 委派）
//! - 会话管理（ACME 账户邮箱轮换）
//! - 签发任务流水线（优先级队列 + 工作池）
//! - 证书落盘与解析
//!
//! 存储层通过 trait 抽象，内置内存实现。

pub mod acme;
pub mod config;
pub mod error;
pub mod registry;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export common types
pub use config::AppConfig;
pub use error::{CoreError, CoreResult};
pub use registry::ConfigProviderRegistry;
pub use services::ServiceContext;
pub use traits::{CertificateRepository, DomainRepository, ProviderRegistry};
