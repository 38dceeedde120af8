//! Uniform record model shared by every adapter.
//!
//! Adapters translate these types to and from each vendor's native request and
//! response shapes. Fields a vendor does not understand stay at their zero value
//! and are never sent upstream (see [`crate::field_mapper`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============ Provider Type ============

/// Identifies which vendor adapter produced or consumes a value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Cloudflare DNS.
    Cloudflare,
    /// Aliyun (Alibaba Cloud) DNS.
    Aliyun,
    /// Tencent Cloud `DNSPod`.
    Dnspod,
}

impl ProviderType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cloudflare => "cloudflare",
            Self::Aliyun => "aliyun",
            Self::Dnspod => "dnspod",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    /// Accepts the canonical names plus the vendor aliases used in older configs
    /// (`ali`, `tencent`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cloudflare" => Ok(Self::Cloudflare),
            "aliyun" | "ali" => Ok(Self::Aliyun),
            "dnspod" | "tencent" => Ok(Self::Dnspod),
            other => Err(other.to_string()),
        }
    }
}

// ============ Record Status ============

/// Uniform enable/disable vocabulary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordStatus {
    Enable,
    Disable,
}

impl RecordStatus {
    /// Uppercase wire form (`ENABLE` / `DISABLE`), shared by Aliyun and `DNSPod`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enable => "ENABLE",
            Self::Disable => "DISABLE",
        }
    }

    /// Parse a vendor status string, case-insensitively. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "ENABLE" | "ENABLED" | "TRUE" | "1" => Some(Self::Enable),
            "DISABLE" | "DISABLED" | "FALSE" | "0" => Some(Self::Disable),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Record ============

/// Vendor-agnostic DNS resource record.
///
/// `record_name` is the host relative to the zone (`@` for the apex), `value` the
/// record content. Identifiers are strings whatever the vendor's native id type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub id: String,
    pub domain_id: String,
    pub domain_name: String,
    pub record_name: String,
    pub record_type: String,
    pub value: String,
    /// Routing line / policy (Aliyun `Line`, `DNSPod` `RecordLine`).
    pub line: String,
    pub status: Option<RecordStatus>,
    pub ttl: u32,
    /// Weight, or MX priority for vendors that share the field.
    pub weight: u32,
    pub proxied: bool,
    pub locked: bool,
    /// Adapter that produced this record.
    pub dns_from: Option<ProviderType>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DomainRecord {
    /// A TXT record under `domain_name`, as used for DNS-01 challenges.
    pub fn txt(
        domain_id: impl Into<String>,
        domain_name: impl Into<String>,
        host: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            domain_id: domain_id.into(),
            domain_name: domain_name.into(),
            record_name: host.into(),
            record_type: "TXT".to_string(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Whether the record is of the given type, compared case-insensitively.
    pub fn is_type(&self, record_type: &str) -> bool {
        self.record_type.eq_ignore_ascii_case(record_type)
    }
}

// ============ Domain ============

/// Uniform domain / zone description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainInfo {
    pub id: String,
    pub name: String,
    pub status: String,
    pub record_count: u32,
    pub group_id: String,
    pub group_name: String,
    pub dns_from: Option<ProviderType>,
    /// Name servers currently assigned by the vendor.
    pub name_servers: Vec<String>,
    /// Name servers the domain used before being delegated to the vendor.
    pub original_name_servers: Vec<String>,
    pub paused: bool,
}

/// One page of domains.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainList {
    pub domains: Vec<DomainInfo>,
    pub page: u32,
    pub page_size: u32,
    pub total: u32,
    pub dns_from: Option<ProviderType>,
}

impl DomainList {
    /// Whether another page exists after this one.
    pub fn has_more(&self) -> bool {
        let seen = u64::from(self.page.max(1)) * u64::from(self.page_size);
        self.page_size > 0 && seen < u64::from(self.total)
    }
}

// ============ Search ============

/// Domain list query. Zero-valued fields are omitted from vendor requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainsSearch {
    pub keyword: String,
    pub page: u32,
    pub page_size: u32,
    pub group_id: String,
}

impl DomainsSearch {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            ..Self::default()
        }
    }
}

/// Record list query. Zero-valued fields are omitted from vendor requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsSearch {
    pub domain_id: String,
    pub domain_name: String,
    pub page: u32,
    pub page_size: u32,
    /// Matches host, type or value.
    pub keyword: String,
    pub rr_keyword: String,
    pub type_keyword: String,
    pub value_keyword: String,
    pub line: String,
    pub group_id: String,
    pub order_by: String,
    /// `ASC` or `DESC`.
    pub direction: String,
    pub status: Option<RecordStatus>,
}

impl DnsSearch {
    pub fn for_domain(domain_id: impl Into<String>, domain_name: impl Into<String>) -> Self {
        Self {
            domain_id: domain_id.into(),
            domain_name: domain_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.rr_keyword = host.into();
        self
    }

    #[must_use]
    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.type_keyword = record_type.into();
        self
    }
}

// ============ Credentials ============

/// Provider credentials, tagged by provider.
///
/// ```json
/// { "provider": "cloudflare", "credentials": { "api_token": "..." } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", content = "credentials")]
pub enum ProviderCredentials {
    #[serde(rename = "cloudflare")]
    Cloudflare { api_token: String },

    #[serde(rename = "aliyun")]
    Aliyun {
        access_key_id: String,
        access_key_secret: String,
    },

    #[serde(rename = "dnspod")]
    Dnspod {
        secret_id: String,
        secret_key: String,
    },
}

impl ProviderCredentials {
    /// Build credentials from a key pair as stored in account configuration.
    ///
    /// Cloudflare authenticates with a single API token, taken from `secret`.
    pub fn from_key_pair(provider: ProviderType, key_id: &str, secret: &str) -> Self {
        match provider {
            ProviderType::Cloudflare => Self::Cloudflare {
                api_token: secret.to_string(),
            },
            ProviderType::Aliyun => Self::Aliyun {
                access_key_id: key_id.to_string(),
                access_key_secret: secret.to_string(),
            },
            ProviderType::Dnspod => Self::Dnspod {
                secret_id: key_id.to_string(),
                secret_key: secret.to_string(),
            },
        }
    }

    pub fn provider_type(&self) -> ProviderType {
        match self {
            Self::Cloudflare { .. } => ProviderType::Cloudflare,
            Self::Aliyun { .. } => ProviderType::Aliyun,
            Self::Dnspod { .. } => ProviderType::Dnspod,
        }
    }
}
