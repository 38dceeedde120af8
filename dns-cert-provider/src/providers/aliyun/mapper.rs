//! 统一模型 ↔ 阿里云原生结构的字段映射

use crate::field_mapper::{Project, set_num, set_str};
use crate::providers::common::from_millis;
use crate::types::{DnsSearch, DomainInfo, DomainRecord, DomainsSearch, ProviderType, RecordStatus};

use super::types::{
    AddDomainRecordRequest, AliyunDomain, AliyunRecord, DescribeDomainRecordsRequest,
    DescribeDomainsRequest, UpdateDomainRecordRequest,
};

impl Project<DescribeDomainsRequest> for DomainsSearch {
    fn project(&self, dest: &mut DescribeDomainsRequest) {
        set_num(&mut dest.page_number, self.page);
        set_num(&mut dest.page_size, self.page_size);
        set_str(&mut dest.key_word, &self.keyword);
        set_str(&mut dest.group_id, &self.group_id);
    }
}

impl Project<DescribeDomainRecordsRequest> for DnsSearch {
    fn project(&self, dest: &mut DescribeDomainRecordsRequest) {
        set_str(&mut dest.domain_name, &self.domain_name);
        set_num(&mut dest.page_number, self.page);
        set_num(&mut dest.page_size, self.page_size);
        set_str(&mut dest.key_word, &self.keyword);
        set_str(&mut dest.rr_key_word, &self.rr_keyword);
        set_str(&mut dest.type_key_word, &self.type_keyword);
        set_str(&mut dest.value_key_word, &self.value_keyword);
        set_str(&mut dest.line, &self.line);
        set_str(&mut dest.group_id, &self.group_id);
        set_str(&mut dest.order_by, &self.order_by);
        set_str(&mut dest.direction, &self.direction);
        if let Some(status) = self.status {
            set_str(&mut dest.status, status.as_str());
        }
    }
}

impl Project<AddDomainRecordRequest> for DomainRecord {
    fn project(&self, dest: &mut AddDomainRecordRequest) {
        set_str(&mut dest.domain_name, &self.domain_name);
        set_str(&mut dest.rr, &self.record_name);
        set_str(&mut dest.record_type, &self.record_type);
        set_str(&mut dest.value, &self.value);
        set_num(&mut dest.ttl, self.ttl);
        set_str(&mut dest.line, &self.line);
        if self.is_type("MX") {
            set_num(&mut dest.priority, self.weight);
        }
    }
}

impl Project<UpdateDomainRecordRequest> for DomainRecord {
    fn project(&self, dest: &mut UpdateDomainRecordRequest) {
        set_str(&mut dest.record_id, &self.id);
        set_str(&mut dest.rr, &self.record_name);
        set_str(&mut dest.record_type, &self.record_type);
        set_str(&mut dest.value, &self.value);
        set_num(&mut dest.ttl, self.ttl);
        set_str(&mut dest.line, &self.line);
        if self.is_type("MX") {
            set_num(&mut dest.priority, self.weight);
        }
    }
}

impl AliyunDomain {
    pub(crate) fn into_domain_info(self) -> DomainInfo {
        DomainInfo {
            id: self.domain_id.unwrap_or_default(),
            name: self.domain_name,
            record_count: self.record_count.unwrap_or(0),
            group_id: self.group_id.unwrap_or_default(),
            group_name: self.group_name.unwrap_or_default(),
            dns_from: Some(ProviderType::Aliyun),
            name_servers: self.dns_servers.map(|s| s.dns_server).unwrap_or_default(),
            ..DomainInfo::default()
        }
    }
}

impl AliyunRecord {
    /// `domain_id` / `domain_name` 用于补全列表接口不返回的字段
    pub(crate) fn into_domain_record(self, domain_id: &str, domain_name: &str) -> DomainRecord {
        let weight = if self.record_type.eq_ignore_ascii_case("MX") {
            self.priority.unwrap_or(0)
        } else {
            self.weight.unwrap_or(0)
        };
        DomainRecord {
            id: self.record_id,
            domain_id: self
                .domain_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| domain_id.to_string()),
            domain_name: self
                .domain_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| domain_name.to_string()),
            record_name: self.rr,
            record_type: self.record_type,
            value: self.value,
            line: self.line.unwrap_or_default(),
            status: self.status.as_deref().and_then(RecordStatus::parse),
            ttl: self.ttl.unwrap_or(0),
            weight,
            proxied: false,
            locked: self.locked.unwrap_or(false),
            dns_from: Some(ProviderType::Aliyun),
            created_at: from_millis(self.create_timestamp),
            updated_at: from_millis(self.update_timestamp),
        }
    }
}
