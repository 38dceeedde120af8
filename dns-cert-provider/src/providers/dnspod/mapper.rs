//! 统一模型 ↔ `DNSPod` 原生结构的字段映射

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use crate::field_mapper::{Project, set_num, set_str};
use crate::providers::common::{format_numeric_id, parse_numeric_id};
use crate::types::{DnsSearch, DomainInfo, DomainRecord, DomainsSearch, ProviderType, RecordStatus};

use super::types::{
    DescribeDomainListRequest, DescribeRecordListRequest, DnspodDomain, DnspodRecord,
    DnspodRecordInfo, RecordWriteRequest,
};

/// `DNSPod` 按偏移量分页：Offset = (page - 1) * size
fn offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

fn set_id(dest: &mut Option<u64>, id: &str) {
    if let Some(n) = parse_numeric_id(id) {
        set_num(dest, n);
    }
}

/// `DNSPod` 时间为北京时间 `YYYY-MM-DD HH:MM:SS`
pub(crate) fn from_beijing_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value?, "%Y-%m-%d %H:%M:%S").ok()?;
    let beijing = FixedOffset::east_opt(8 * 3600)?;
    naive
        .and_local_timezone(beijing)
        .single()
        .map(|t| t.with_timezone(&Utc))
}

impl Project<DescribeDomainListRequest> for DomainsSearch {
    fn project(&self, dest: &mut DescribeDomainListRequest) {
        set_num(&mut dest.offset, offset(self.page, self.page_size));
        set_num(&mut dest.limit, self.page_size);
        set_str(&mut dest.keyword, &self.keyword);
        set_id(&mut dest.group_id, &self.group_id);
    }
}

impl Project<DescribeRecordListRequest> for DnsSearch {
    fn project(&self, dest: &mut DescribeRecordListRequest) {
        set_str(&mut dest.domain, &self.domain_name);
        set_id(&mut dest.domain_id, &self.domain_id);
        // Keyword 同时匹配主机记录和记录值
        set_str(&mut dest.keyword, &self.value_keyword);
        set_str(&mut dest.keyword, &self.keyword);
        set_str(&mut dest.subdomain, &self.rr_keyword);
        set_str(&mut dest.record_type, &self.type_keyword);
        set_str(&mut dest.record_line, &self.line);
        set_id(&mut dest.group_id, &self.group_id);
        set_str(&mut dest.sort_field, &self.order_by);
        set_str(&mut dest.sort_type, &self.direction.to_ascii_uppercase());
        set_num(&mut dest.offset, offset(self.page, self.page_size));
        set_num(&mut dest.limit, self.page_size);
    }
}

impl Project<RecordWriteRequest> for DomainRecord {
    fn project(&self, dest: &mut RecordWriteRequest) {
        set_str(&mut dest.domain, &self.domain_name);
        set_id(&mut dest.domain_id, &self.domain_id);
        set_str(&mut dest.sub_domain, &self.record_name);
        set_str(&mut dest.record_type, &self.record_type);
        set_str(&mut dest.record_line, &self.line);
        set_str(&mut dest.value, &self.value);
        set_num(&mut dest.ttl, self.ttl);
        if self.is_type("MX") {
            set_num(&mut dest.mx, self.weight);
        } else {
            set_num(&mut dest.weight, self.weight);
        }
        if let Some(status) = self.status {
            set_str(&mut dest.status, status.as_str());
        }
    }
}

impl DnspodDomain {
    pub(crate) fn into_domain_info(self) -> DomainInfo {
        DomainInfo {
            id: format_numeric_id(self.domain_id),
            name: self.name,
            status: self.status,
            record_count: self.record_count.unwrap_or(0),
            group_id: self.group_id.map(format_numeric_id).unwrap_or_default(),
            dns_from: Some(ProviderType::Dnspod),
            name_servers: self.effective_dns,
            ..DomainInfo::default()
        }
    }
}

fn weight_of(record_type: &str, weight: Option<u32>, mx: Option<u32>) -> u32 {
    if record_type.eq_ignore_ascii_case("MX") {
        mx.unwrap_or(0)
    } else {
        weight.unwrap_or(0)
    }
}

impl DnspodRecord {
    /// 列表接口不返回域名信息，由调用方补全
    pub(crate) fn into_domain_record(self, domain_id: &str, domain_name: &str) -> DomainRecord {
        DomainRecord {
            id: format_numeric_id(self.record_id),
            domain_id: domain_id.to_string(),
            domain_name: domain_name.to_string(),
            weight: weight_of(&self.record_type, self.weight, self.mx),
            record_name: self.name,
            record_type: self.record_type,
            value: self.value,
            line: self.line,
            status: RecordStatus::parse(&self.status),
            ttl: self.ttl,
            dns_from: Some(ProviderType::Dnspod),
            updated_at: from_beijing_time(self.updated_on.as_deref()),
            ..DomainRecord::default()
        }
    }
}

impl DnspodRecordInfo {
    pub(crate) fn into_domain_record(self, domain_name: &str) -> DomainRecord {
        let status = if self.enabled == 1 {
            RecordStatus::Enable
        } else {
            RecordStatus::Disable
        };
        DomainRecord {
            id: format_numeric_id(self.id),
            domain_id: self.domain_id.map(format_numeric_id).unwrap_or_default(),
            domain_name: domain_name.to_string(),
            weight: weight_of(&self.record_type, self.weight, self.mx),
            record_name: self.sub_domain,
            record_type: self.record_type,
            value: self.value,
            line: self.record_line,
            status: Some(status),
            ttl: self.ttl,
            dns_from: Some(ProviderType::Dnspod),
            updated_at: from_beijing_time(self.updated_on.as_deref()),
            ..DomainRecord::default()
        }
    }
}
