//! 阿里云 `RecordProvider` 实现

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{ProviderError, Result};
use crate::field_mapper::projected;
use crate::traits::{ErrorContext, ProviderErrorMapper, RecordProvider};
use crate::types::{DnsSearch, DomainList, DomainRecord, DomainsSearch, ProviderType, RecordStatus};

use super::types::{
    AddDomainRecordRequest, AliyunDomain, AliyunRecord, DescribeDomainRecordsRequest,
    DescribeDomainRecordsResponse, DescribeDomainsRequest, DescribeDomainsResponse,
    RecordIdRequest, RecordIdResponse, SetDomainRecordStatusRequest, UpdateDomainRecordRequest,
};
use super::{AliyunProvider, MAX_PAGE_SIZE};

impl AliyunProvider {
    fn require_id(&self, record: &DomainRecord) -> Result<()> {
        if record.id.is_empty() {
            return Err(ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "id".to_string(),
                detail: "record id is required".to_string(),
            });
        }
        Ok(())
    }
}

fn clamp_page_size(size: &mut Option<u64>) {
    if let Some(s) = size.as_mut() {
        *s = (*s).min(u64::from(MAX_PAGE_SIZE));
    }
}

#[async_trait]
impl RecordProvider for AliyunProvider {
    fn id(&self) -> &'static str {
        "aliyun"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Aliyun
    }

    async fn get_domain_list(&self, search: &DomainsSearch) -> Result<DomainList> {
        let mut req: DescribeDomainsRequest = projected(search);
        clamp_page_size(&mut req.page_size);

        let response: DescribeDomainsResponse = self
            .request("DescribeDomains", &req, ErrorContext::default())
            .await?;

        let domains = response
            .domains
            .map(|d| d.domain)
            .unwrap_or_default()
            .into_iter()
            .map(AliyunDomain::into_domain_info)
            .collect();

        Ok(DomainList {
            domains,
            page: response.page_number.unwrap_or(search.page),
            page_size: response.page_size.unwrap_or(search.page_size),
            total: response.total_count.unwrap_or(0),
            dns_from: Some(ProviderType::Aliyun),
        })
    }

    async fn get_record_list(&self, search: &DnsSearch) -> Result<Vec<DomainRecord>> {
        let mut req: DescribeDomainRecordsRequest = projected(search);
        clamp_page_size(&mut req.page_size);

        let response: DescribeDomainRecordsResponse = self
            .request(
                "DescribeDomainRecords",
                &req,
                ErrorContext::domain(&search.domain_name),
            )
            .await?;

        let records: Vec<DomainRecord> = response
            .domain_records
            .map(|r| r.record)
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.into_domain_record(&search.domain_id, &search.domain_name))
            .collect();

        self.records.put_all(&records).await;
        Ok(records)
    }

    async fn add_record(&self, record: &DomainRecord) -> Result<DomainRecord> {
        let req: AddDomainRecordRequest = projected(record);
        let response: RecordIdResponse = self
            .request(
                "AddDomainRecord",
                &req,
                ErrorContext::record_name(&record.domain_name, &record.record_name),
            )
            .await?;

        let record_id = response
            .record_id
            .ok_or_else(|| self.parse_error("AddDomainRecord response has no RecordId"))?;

        let now = Utc::now();
        let created = DomainRecord {
            id: record_id,
            status: record.status.or(Some(RecordStatus::Enable)),
            dns_from: Some(ProviderType::Aliyun),
            created_at: Some(now),
            updated_at: Some(now),
            ..record.clone()
        };
        self.records.put(&created).await;
        Ok(created)
    }

    async fn update_record(&self, record: &DomainRecord) -> Result<DomainRecord> {
        self.require_id(record)?;
        let req: UpdateDomainRecordRequest = projected(record);
        let _: RecordIdResponse = self
            .request(
                "UpdateDomainRecord",
                &req,
                ErrorContext::record(&record.domain_name, &record.id),
            )
            .await?;

        let updated = DomainRecord {
            dns_from: Some(ProviderType::Aliyun),
            updated_at: Some(Utc::now()),
            ..record.clone()
        };
        self.records.put(&updated).await;
        Ok(updated)
    }

    async fn delete_record(&self, domain_name: &str, record_id: &str) -> Result<DomainRecord> {
        let req = RecordIdRequest {
            record_id: record_id.to_string(),
        };
        let _: RecordIdResponse = self
            .request(
                "DeleteDomainRecord",
                &req,
                ErrorContext::record(domain_name, record_id),
            )
            .await?;

        Ok(self.records.remove(record_id).await.unwrap_or_else(|| DomainRecord {
            id: record_id.to_string(),
            domain_name: domain_name.to_string(),
            dns_from: Some(ProviderType::Aliyun),
            ..DomainRecord::default()
        }))
    }

    async fn set_record_status(
        &self,
        domain_name: &str,
        record_id: &str,
        status: RecordStatus,
    ) -> Result<DomainRecord> {
        let req = SetDomainRecordStatusRequest {
            record_id: record_id.to_string(),
            status: status.as_str().to_string(),
        };
        let _: RecordIdResponse = self
            .request(
                "SetDomainRecordStatus",
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
            record_id: record_id.to_string(),
        };
        let native: AliyunRecord = self
            .request(
                "DescribeDomainRecordInfo",
                &req,
                ErrorContext::record(domain_name, record_id),
            )
            .await?;

        let record = native.into_domain_record("", domain_name);
        self.records.put(&record).await;
        Ok(record)
    }
}
