//! 统一模型 ↔ Cloudflare 原生结构的字段映射
//!
//! Cloudflare 使用完整域名作为记录名，统一模型使用相对名称；映射后由
//! [`qualify`] 补全 zone 后缀。

use crate::field_mapper::{Project, set_flag, set_num, set_str};
use crate::providers::common::{from_rfc3339, full_name_to_relative, relative_to_full_name};
use crate::types::{DnsSearch, DomainInfo, DomainRecord, DomainsSearch, ProviderType, RecordStatus};

use super::types::{
    CloudflareDnsRecord, CloudflareZone, DnsRecordBody, ListDnsRecordsQuery, ListZonesQuery,
};

impl Project<ListZonesQuery> for DomainsSearch {
    fn project(&self, dest: &mut ListZonesQuery) {
        set_str(&mut dest.name, &self.keyword);
        set_num(&mut dest.page, self.page);
        set_num(&mut dest.per_page, self.page_size);
    }
}

impl Project<ListDnsRecordsQuery> for DnsSearch {
    fn project(&self, dest: &mut ListDnsRecordsQuery) {
        // 通用关键字同时匹配名称和内容
        set_str(&mut dest.name, &self.keyword);
        set_str(&mut dest.content, &self.keyword);
        if !self.keyword.is_empty() {
            dest.match_mode = Some("any".to_string());
        }
        set_str(&mut dest.name, &self.rr_keyword);
        set_str(&mut dest.content, &self.value_keyword);
        set_str(&mut dest.record_type, &self.type_keyword);
        set_str(&mut dest.order, &self.order_by);
        set_str(&mut dest.direction, &self.direction.to_ascii_lowercase());
        set_num(&mut dest.page, self.page);
        set_num(&mut dest.per_page, self.page_size);
    }
}

impl Project<DnsRecordBody> for DomainRecord {
    fn project(&self, dest: &mut DnsRecordBody) {
        set_str(&mut dest.record_type, &self.record_type);
        set_str(&mut dest.name, &self.record_name);
        set_str(&mut dest.content, &self.value);
        set_num(&mut dest.ttl, self.ttl);
        if self.is_type("MX") || self.is_type("URI") {
            set_num(&mut dest.priority, self.weight);
        }
        set_flag(&mut dest.proxied, self.proxied);
    }
}

/// 相对名称 → 完整域名
pub(crate) fn qualify(name: &mut Option<String>, zone_name: &str) {
    if let Some(n) = name.as_mut() {
        let relative = full_name_to_relative(n, zone_name);
        *n = relative_to_full_name(&relative, zone_name);
    }
}

impl CloudflareZone {
    pub(crate) fn into_domain_info(self) -> DomainInfo {
        DomainInfo {
            id: self.id,
            name: self.name,
            status: self.status,
            dns_from: Some(ProviderType::Cloudflare),
            name_servers: self.name_servers,
            original_name_servers: self.original_name_servers.unwrap_or_default(),
            paused: self.paused,
            ..DomainInfo::default()
        }
    }
}

impl CloudflareDnsRecord {
    /// Cloudflare 记录没有启用/暂停状态，统一视为 `Enable`
    pub(crate) fn into_domain_record(self, zone: &DomainInfo) -> DomainRecord {
        let zone_name = self.zone_name.unwrap_or_else(|| zone.name.clone());
        DomainRecord {
            id: self.id,
            domain_id: self.zone_id.unwrap_or_else(|| zone.id.clone()),
            record_name: full_name_to_relative(&self.name, &zone_name),
            domain_name: zone_name,
            record_type: self.record_type,
            value: self.content,
            status: Some(RecordStatus::Enable),
            ttl: self.ttl,
            weight: self.priority.unwrap_or(0),
            proxied: self.proxied.unwrap_or(false),
            dns_from: Some(ProviderType::Cloudflare),
            created_at: from_rfc3339(self.created_on.as_deref()),
            updated_at: from_rfc3339(self.modified_on.as_deref()),
            ..DomainRecord::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_mapper::projected;

    fn zone() -> DomainInfo {
        DomainInfo {
            id: "zone-1".into(),
            name: "example.com".into(),
            ..DomainInfo::default()
        }
    }

    #[test]
    fn host_filter_wins_over_generic_keyword() {
        let search = DnsSearch {
            keyword: "foo".into(),
            rr_keyword: "_acme-challenge".into(),
            ..DnsSearch::default()
        };
        let query: ListDnsRecordsQuery = projected(&search);
        assert_eq!(query.name.as_deref(), Some("_acme-challenge"));
        assert_eq!(query.content.as_deref(), Some("foo"));
        assert_eq!(query.match_mode.as_deref(), Some("any"));
    }

    #[test]
    fn host_and_type_search_matches_all() {
        let search = DnsSearch::for_domain("zone-1", "example.com")
            .with_host("_acme-challenge")
            .with_type("TXT");
        let mut query: ListDnsRecordsQuery = projected(&search);
        qualify(&mut query.name, "example.com");

        assert_eq!(query.name.as_deref(), Some("_acme-challenge.example.com"));
        assert_eq!(query.record_type.as_deref(), Some("TXT"));
        assert!(query.match_mode.is_none());
        assert!(query.page.is_none());
        assert!(query.direction.is_none());
    }

    #[test]
    fn qualify_is_idempotent() {
        let mut name = Some("www.example.com".to_string());
        qualify(&mut name, "example.com");
        assert_eq!(name.as_deref(), Some("www.example.com"));

        let mut apex = Some("@".to_string());
        qualify(&mut apex, "example.com");
        assert_eq!(apex.as_deref(), Some("example.com"));
    }

    #[test]
    fn record_overlay_keeps_existing_fields() {
        let current = DomainRecord {
            record_name: "www".into(),
            record_type: "A".into(),
            value: "192.0.2.1".into(),
            ttl: 300,
            proxied: true,
            ..DomainRecord::default()
        };
        let change = DomainRecord {
            value: "192.0.2.2".into(),
            ..DomainRecord::default()
        };

        let mut body: DnsRecordBody = projected(&current);
        change.project(&mut body);

        assert_eq!(body.content.as_deref(), Some("192.0.2.2"));
        assert_eq!(body.name.as_deref(), Some("www"));
        assert_eq!(body.ttl, Some(300));
        assert_eq!(body.proxied, Some(true));
    }

    #[test]
    fn native_record_becomes_relative_and_enabled() {
        let native: CloudflareDnsRecord = serde_json::from_value(serde_json::json!({
            "id": "372e67954025e0ba6aaa6d586b9e0b59",
            "type": "TXT",
            "name": "_acme-challenge.example.com",
            "content": "abc",
            "ttl": 1,
            "created_on": "2024-01-15T08:00:00Z"
        }))
        .unwrap();
        let record = native.into_domain_record(&zone());

        assert_eq!(record.id, "372e67954025e0ba6aaa6d586b9e0b59");
        assert_eq!(record.record_name, "_acme-challenge");
        assert_eq!(record.domain_id, "zone-1");
        assert_eq!(record.domain_name, "example.com");
        assert_eq!(record.status, Some(RecordStatus::Enable));
        assert_eq!(record.dns_from, Some(ProviderType::Cloudflare));
        assert!(record.created_at.is_some());
    }
}
