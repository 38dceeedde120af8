//! Domain name related type definitions

use serde::{Deserialize, Serialize};

use dns_cert_provider::{DomainInfo, ProviderType};

/// Persisted domain (including the owning account)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Vendor domain ID
    pub id: String,
    pub domain_name: String,
    pub group_id: String,
    pub group_name: String,
    pub status: String,
    #[serde(rename = "type")]
    pub domain_type: String,
    /// Certificate currently covering this domain
    pub certificate_id: Option<String>,
    pub dns_from: Option<ProviderType>,
    pub account_name: String,
}

impl Domain {
    /// Construct a persisted Domain from a provider `DomainInfo`
    #[must_use]
    pub fn from_provider(info: DomainInfo, account_name: &str) -> Self {
        Self {
            id: info.id,
            domain_name: info.name,
            group_id: info.group_id,
            group_name: info.group_name,
            status: info.status,
            domain_type: String::new(),
            certificate_id: None,
            dns_from: info.dns_from,
            account_name: account_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_provider_keeps_vendor_tag_and_account() {
        let info = DomainInfo {
            id: "123".into(),
            name: "example.com".into(),
            status: "ENABLE".into(),
            group_id: "g1".into(),
            dns_from: Some(ProviderType::Dnspod),
            ..DomainInfo::default()
        };
        let domain = Domain::from_provider(info, "main");

        assert_eq!(domain.id, "123");
        assert_eq!(domain.domain_name, "example.com");
        assert_eq!(domain.dns_from, Some(ProviderType::Dnspod));
        assert_eq!(domain.account_name, "main");
        assert!(domain.certificate_id.is_none());
    }
}
