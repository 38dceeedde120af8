//! Certificate / task type definitions

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::acme::CertificateBundle;

/// 证书与任务共用的状态
///
/// `wait` 等待中 → `apply` 申请中 → `success` / `fail`，终态不可回退。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    #[default]
    Wait,
    Apply,
    Success,
    Fail,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wait => "wait",
            Self::Apply => "apply",
            Self::Success => "success",
            Self::Fail => "fail",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Fail)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata extracted from an issued certificate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCertificate {
    pub issuer: String,
    pub subject: String,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
    /// SAN 中的 DNS 名称
    pub dns_names: Vec<String>,
    pub common_name: String,
    /// CN + SAN，去重后保持首次出现的顺序
    pub domain_list: Vec<String>,
}

/// Persisted certificate metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: String,
    pub state: TaskState,
    pub task_id: String,
    pub save_path: PathBuf,
    pub issuer: String,
    pub subject: String,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
    /// 逗号分隔
    #[serde(rename = "DNSNames")]
    pub dns_names: String,
    pub common_name: String,
    /// 逗号分隔
    pub domain_list: String,
    pub created_at: DateTime<Utc>,
}

impl Certificate {
    /// 提交任务时创建的占位记录
    #[must_use]
    pub fn pending(task_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            state: TaskState::Wait,
            task_id: task_id.to_string(),
            save_path: PathBuf::new(),
            issuer: String::new(),
            subject: String::new(),
            not_before: None,
            not_after: None,
            dns_names: String::new(),
            common_name: String::new(),
            domain_list: String::new(),
            created_at: Utc::now(),
        }
    }

    /// 写入解析出的证书信息
    pub fn apply_parsed(&mut self, parsed: ParsedCertificate) {
        self.issuer = parsed.issuer;
        self.subject = parsed.subject;
        self.not_before = parsed.not_before;
        self.not_after = parsed.not_after;
        self.dns_names = parsed.dns_names.join(",");
        self.common_name = parsed.common_name;
        self.domain_list = parsed.domain_list.join(",");
    }

    /// 证书覆盖的域名
    pub fn domains(&self) -> Vec<&str> {
        split_names(&self.domain_list).collect()
    }

    /// 检查给定域名是否被证书的 CN 或 SAN 覆盖
    pub fn matches_domain(&self, domain: &str) -> bool {
        matches_name(domain, &self.common_name)
            || split_names(&self.dns_names).any(|name| matches_name(domain, name))
    }
}

fn split_names(joined: &str) -> impl Iterator<Item = &str> {
    joined.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// 域名与证书名称匹配，支持单级通配符
///
/// `*.example.com` 匹配 `sub.example.com`，不匹配 `a.b.example.com` 和 `example.com`。
pub fn matches_name(domain: &str, cert_name: &str) -> bool {
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    let cert_name = cert_name.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() || cert_name.is_empty() {
        return false;
    }
    if domain == cert_name {
        return true;
    }

    let Some(suffix) = cert_name.strip_prefix("*.") else {
        return false;
    };
    domain
        .strip_suffix(suffix)
        .and_then(|rest| rest.strip_suffix('.'))
        .is_some_and(|label| !label.is_empty() && !label.contains('.'))
}

/// 证书申请任务记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateTask {
    pub id: String,
    pub task_id: String,
    #[serde(rename = "certId")]
    pub certificate_id: String,
    pub created_at: DateTime<Utc>,
    pub log_path: PathBuf,
    pub state: TaskState,
    /// 失败时的错误信息，成功为空
    pub result: String,
}

impl CertificateTask {
    #[must_use]
    pub fn new(task_id: &str, certificate_id: &str, log_path: PathBuf) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            certificate_id: certificate_id.to_string(),
            created_at: Utc::now(),
            log_path,
            state: TaskState::Wait,
            result: String::new(),
        }
    }
}

/// 落盘的证书资源
///
/// 字节内容不进入 `resource.json`，加载时根据路径重新读取。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResource {
    /// 主域名
    pub domain: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(skip)]
    pub certificate: Vec<u8>,
    #[serde(skip)]
    pub private_key: Vec<u8>,
    #[serde(skip)]
    pub issuer_certificate: Vec<u8>,
    #[serde(skip)]
    pub csr: Vec<u8>,
    pub certificate_path: PathBuf,
    pub private_key_path: PathBuf,
    pub issuer_cert_path: PathBuf,
    #[serde(rename = "csrPath")]
    pub csr_path: PathBuf,
    pub save_path: PathBuf,
}

impl CertificateResource {
    /// 续期时交给 ACME 引擎的证书包
    pub fn to_bundle(&self) -> CertificateBundle {
        CertificateBundle {
            domain: self.domain.clone(),
            domains: self.domains.clone(),
            certificate: self.certificate.clone(),
            private_key: self.private_key.clone(),
            issuer_certificate: self.issuer_certificate.clone(),
            csr: self.csr.clone(),
        }
    }
}
