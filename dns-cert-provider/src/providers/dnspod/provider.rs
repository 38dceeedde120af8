//! `DNSPod` `RecordProvider` 实现

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{ProviderError, Result};
use crate::field_mapper::{Project, projected};
use crate::providers::common::{format_numeric_id, parse_numeric_id};
use crate::traits::{ErrorContext, ProviderErrorMapper, RecordProvider};
use crate::types::{DnsSearch, DomainList, DomainRecord, DomainsSearch, ProviderType, RecordStatus};

use super::error::NO_DATA_OF_RECORD;
use super::types::{
    DescribeDomainListRequest, DescribeDomainListResponse, DescribeRecordListRequest,
    DescribeRecordListResponse, DescribeRecordResponse, DnspodDomain, ModifyRecordStatusRequest,
    RecordIdRequest, RecordIdResponse, RecordWriteRequest,
};
use super::{DEFAULT_RECORD_LINE, DnspodProvider, MAX_PAGE_SIZE};

fn clamp_limit(limit: &mut Option<u64>) {
    if let Some(l) = limit.as_mut() {
        *l = (*l).min(u64::from(MAX_PAGE_SIZE));
    }
}

/// `DescribeRecordList` 不支持按状态和记录值精确过滤，返回后在本地补充过滤
fn matches_local_filters(record: &DomainRecord, search: &DnsSearch) -> bool {
    search.status.is_none_or(|s| record.status == Some(s))
        && (search.value_keyword.is_empty() || record.value.contains(&search.value_keyword))
}

impl DnspodProvider {
    /// 统一字符串 id → `DNSPod` 数值 id
    fn numeric_id(&self, id: &str) -> Result<u64> {
        parse_numeric_id(id).ok_or_else(|| self.invalid_id(id))
    }

    /// 非空的 domain id 必须是合法数值，避免请求被静默放宽到按域名查询
    fn check_domain_id(&self, domain_id: &str) -> Result<()> {
        if !domain_id.is_empty() {
            self.numeric_id(domain_id)?;
        }
        Ok(())
    }

    fn write_request(&self, record: &DomainRecord) -> Result<RecordWriteRequest> {
        self.check_domain_id(&record.domain_id)?;
        let mut req: RecordWriteRequest = projected(record);
        req.record_line
            .get_or_insert_with(|| DEFAULT_RECORD_LINE.to_string());
        Ok(req)
    }
}

#[async_trait]
impl RecordProvider for DnspodProvider {
    fn id(&self) -> &'static str {
        "dnspod"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Dnspod
    }

    async fn get_domain_list(&self, search: &DomainsSearch) -> Result<DomainList> {
        let mut req: DescribeDomainListRequest = projected(search);
        clamp_limit(&mut req.limit);

        let response: DescribeDomainListResponse = self
            .request("DescribeDomainList", &req, ErrorContext::default())
            .await?;

        let total = response
            .domain_count_info
            .and_then(|c| c.all_total.or(c.domain_total))
            .unwrap_or(0);

        Ok(DomainList {
            domains: response
                .domain_list
                .into_iter()
                .map(DnspodDomain::into_domain_info)
                .collect(),
            page: search.page,
            page_size: search.page_size,
            total,
            dns_from: Some(ProviderType::Dnspod),
        })
    }

    async fn get_record_list(&self, search: &DnsSearch) -> Result<Vec<DomainRecord>> {
        self.check_domain_id(&search.domain_id)?;
        let mut req: DescribeRecordListRequest = projected(search);
        clamp_limit(&mut req.limit);

        let response: DescribeRecordListResponse = match self
            .request(
                "DescribeRecordList",
                &req,
                ErrorContext::domain(&search.domain_name),
            )
            .await
        {
            Ok(r) => r,
            // 没有匹配记录时返回的是错误码而不是空列表
            Err(ProviderError::RecordNotFound { raw_message, .. }) => {
                log::debug!("[dnspod] {NO_DATA_OF_RECORD}: {raw_message:?}");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let records: Vec<DomainRecord> = response
            .record_list
            .into_iter()
            .map(|r| r.into_domain_record(&search.domain_id, &search.domain_name))
            .filter(|r| matches_local_filters(r, search))
            .collect();

        self.records.put_all(&records).await;
        Ok(records)
    }

    async fn add_record(&self, record: &DomainRecord) -> Result<DomainRecord> {
        let req = self.write_request(record)?;
        let response: RecordIdResponse = self
            .request(
                "CreateRecord",
                &req,
                ErrorContext::record_name(&record.domain_name, &record.record_name),
            )
            .await?;

        let record_id = response
            .record_id
            .ok_or_else(|| self.parse_error("CreateRecord response has no RecordId"))?;

        let now = Utc::now();
        let created = DomainRecord {
            id: format_numeric_id(record_id),
            line: req.record_line.unwrap_or_default(),
            status: record.status.or(Some(RecordStatus::Enable)),
            dns_from: Some(ProviderType::Dnspod),
            created_at: Some(now),
            updated_at: Some(now),
            ..record.clone()
        };
        self.records.put(&created).await;
        Ok(created)
    }

    /// `ModifyRecord` 要求类型、线路和值齐全：以当前记录为底叠加调用方的非零字段
    async fn update_record(&self, record: &DomainRecord) -> Result<DomainRecord> {
        let record_id = self.numeric_id(&record.id)?;
        self.check_domain_id(&record.domain_id)?;
        let current = self.get_record_info(&record.domain_name, &record.id).await?;

        let mut req: RecordWriteRequest = projected(&current);
        record.project(&mut req);
        req.record_id = Some(record_id);
        req.record_line
            .get_or_insert_with(|| DEFAULT_RECORD_LINE.to_string());

        let _: RecordIdResponse = self
            .request(
                "ModifyRecord",
                &req,
                ErrorContext::record(&record.domain_name, &record.id),
            )
            .await?;

        let updated = DomainRecord {
            id: record.id.clone(),
            domain_id: req.domain_id.map(format_numeric_id).unwrap_or_default(),
            domain_name: req.domain.unwrap_or_default(),
            record_name: req.sub_domain.unwrap_or_default(),
            record_type: req.record_type.unwrap_or_default(),
            value: req.value.unwrap_or_default(),
            line: req.record_line.unwrap_or_default(),
            status: record.status.or(current.status),
            ttl: req.ttl.and_then(|t| u32::try_from(t).ok()).unwrap_or(0),
            weight: req
                .mx
                .or(req.weight)
                .and_then(|w| u32::try_from(w).ok())
                .unwrap_or(0),
            dns_from: Some(ProviderType::Dnspod),
            created_at: current.created_at,
            updated_at: Some(Utc::now()),
            ..DomainRecord::default()
        };
        self.records.put(&updated).await;
        Ok(updated)
    }

    async fn delete_record(&self, domain_name: &str, record_id: &str) -> Result<DomainRecord> {
        let req = RecordIdRequest {
            domain: domain_name.to_string(),
            record_id: self.numeric_id(record_id)?,
        };
        let _: serde_json::Value = self
            .request(
                "DeleteRecord",
                &req,
                ErrorContext::record(domain_name, record_id),
            )
            .await?;

        Ok(self.records.remove(record_id).await.unwrap_or_else(|| DomainRecord {
            id: record_id.to_string(),
            domain_name: domain_name.to_string(),
            dns_from: Some(ProviderType::Dnspod),
            ..DomainRecord::default()
        }))
    }

    async fn set_record_status(
        &self,
        domain_name: &str,
        record_id: &str,
        status: RecordStatus,
    ) -> Result<DomainRecord> {
        let req = ModifyRecordStatusRequest {
            domain: domain_name.to_string(),
            record_id: self.numeric_id(record_id)?,
            status: status.as_str().to_string(),
        };
        let _: RecordIdResponse = self
            .request(
                "ModifyRecordStatus",
                &req,
                ErrorContext::record(domain_name, record_id),
            )
            .await?;

        let mut record = match self.records.get(record_id).await {
            Some(cached) => cached,
            None => self.get_record_info(domain_name, record_id).await?,
        };
        record.status = Some(status);
        record.updated_at = Some(Utc::now());
        self.records.put(&record).await;
        Ok(record)
    }

    async fn get_record_info(&self, domain_name: &str, record_id: &str) -> Result<DomainRecord> {
        if let Some(cached) = self.records.get(record_id).await {
            return Ok(cached);
        }

        let req = RecordIdRequest {
            domain: domain_name.to_string(),
            record_id: self.numeric_id(record_id)?,
        };
        let response: DescribeRecordResponse = self
            .request(
                "DescribeRecord",
                &req,
                ErrorContext::record(domain_name, record_id),
            )
            .await?;

        let record = response.record_info.into_domain_record(domain_name);
        self.records.put(&record).await;
        Ok(record)
    }
}
