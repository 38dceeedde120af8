//! Cloudflare `RecordProvider` 实现

use async_trait::async_trait;
use reqwest::Method;

use crate::error::{ProviderError, Result};
use crate::field_mapper::{Project, projected};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RecordProvider};
use crate::types::{
    DnsSearch, DomainInfo, DomainList, DomainRecord, DomainsSearch, ProviderType, RecordStatus,
};

use super::mapper::qualify;
use super::types::{
    CloudflareDnsRecord, CloudflareZone, DeletedRecord, DnsRecordBody, ListDnsRecordsQuery,
    ListZonesQuery,
};
use super::{CloudflareProvider, MAX_PAGE_SIZE_RECORDS, MAX_PAGE_SIZE_ZONES};

impl CloudflareProvider {
    /// 域名 → zone，优先读缓存；未命中时按名称查询一次 zones 列表
    pub(crate) async fn resolve_zone(&self, domain_name: &str) -> Result<DomainInfo> {
        if let Some(zone) = self.zones.get_by_name(domain_name).await {
            return Ok(zone);
        }

        log::debug!("[cloudflare] zone cache miss for {domain_name}");
        let search = DomainsSearch {
            keyword: domain_name.trim_end_matches('.').to_string(),
            ..DomainsSearch::page(1, MAX_PAGE_SIZE_ZONES)
        };
        self.get_domain_list(&search).await?;

        self.zones
            .get_by_name(domain_name)
            .await
            .ok_or_else(|| ProviderError::DomainNotFound {
                provider: self.provider_name().to_string(),
                domain: domain_name.to_string(),
                raw_message: None,
            })
    }

    /// 记录操作所需的 zone：优先使用记录自带的 zone id
    async fn zone_for(&self, domain_id: &str, domain_name: &str) -> Result<DomainInfo> {
        if !domain_id.is_empty() {
            if let Some(zone) = self.zones.get_by_id(domain_id).await {
                return Ok(zone);
            }
            if domain_name.is_empty() {
                return Ok(DomainInfo {
                    id: domain_id.to_string(),
                    ..DomainInfo::default()
                });
            }
        }
        self.resolve_zone(domain_name).await
    }

    fn record_body(&self, record: &DomainRecord, zone: &DomainInfo) -> Result<String> {
        let mut body: DnsRecordBody = projected(record);
        qualify(&mut body.name, &zone.name);
        HttpUtils::to_json(&body, self.provider_name())
    }

    async fn write_record(
        &self,
        method: Method,
        path: &str,
        body: String,
        zone: &DomainInfo,
        ctx: ErrorContext,
    ) -> Result<DomainRecord> {
        let request = self
            .authed(method.clone(), path)
            .header("Content-Type", "application/json")
            .body(body);
        let (native, _): (CloudflareDnsRecord, _) =
            self.execute(request, &method, path, ctx).await?;

        let record = native.into_domain_record(zone);
        self.records.put(&record).await;
        Ok(record)
    }
}

#[async_trait]
impl RecordProvider for CloudflareProvider {
    fn id(&self) -> &'static str {
        "cloudflare"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Cloudflare
    }

    async fn get_domain_list(&self, search: &DomainsSearch) -> Result<DomainList> {
        let mut query: ListZonesQuery = projected(search);
        query.per_page = query.per_page.map(|p| p.min(MAX_PAGE_SIZE_ZONES));

        let request = self.authed(Method::GET, "/zones").query(&query);
        let (zones, info): (Vec<CloudflareZone>, _) = self
            .execute(request, &Method::GET, "/zones", ErrorContext::domain(&search.keyword))
            .await?;

        let domains: Vec<DomainInfo> = zones
            .into_iter()
            .map(CloudflareZone::into_domain_info)
            .collect();
        self.zones.put_all(&domains).await;

        let info = info.as_ref();
        Ok(DomainList {
            total: info
                .and_then(|i| i.total_count)
                .unwrap_or_else(|| u32::try_from(domains.len()).unwrap_or(u32::MAX)),
            page: info.and_then(|i| i.page).unwrap_or(search.page),
            page_size: info.and_then(|i| i.per_page).unwrap_or(search.page_size),
            domains,
            dns_from: Some(ProviderType::Cloudflare),
        })
    }

    async fn get_record_list(&self, search: &DnsSearch) -> Result<Vec<DomainRecord>> {
        let zone = self.zone_for(&search.domain_id, &search.domain_name).await?;

        let mut query: ListDnsRecordsQuery = projected(search);
        query.per_page = query.per_page.map(|p| p.min(MAX_PAGE_SIZE_RECORDS));
        if !zone.name.is_empty() {
            qualify(&mut query.name, &zone.name);
        }

        let path = format!("/zones/{}/dns_records", zone.id);
        let request = self.authed(Method::GET, &path).query(&query);
        let (natives, _): (Vec<CloudflareDnsRecord>, _) = self
            .execute(request, &Method::GET, &path, ErrorContext::domain(&zone.name))
            .await?;

        let records: Vec<DomainRecord> = natives
            .into_iter()
            .map(|r| r.into_domain_record(&zone))
            .collect();
        self.records.put_all(&records).await;
        Ok(records)
    }

    async fn add_record(&self, record: &DomainRecord) -> Result<DomainRecord> {
        let zone = self.zone_for(&record.domain_id, &record.domain_name).await?;
        let body = self.record_body(record, &zone)?;
        let path = format!("/zones/{}/dns_records", zone.id);

        self.write_record(
            Method::POST,
            &path,
            body,
            &zone,
            ErrorContext::record_name(&zone.name, &record.record_name),
        )
        .await
    }

    /// `PUT` 需要完整记录：以当前记录为底，再叠加调用方设置的非零字段
    async fn update_record(&self, record: &DomainRecord) -> Result<DomainRecord> {
        if record.id.is_empty() {
            return Err(ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "id".to_string(),
                detail: "record id is required".to_string(),
            });
        }
        let current = self.get_record_info(&record.domain_name, &record.id).await?;
        let zone = self.zone_for(&current.domain_id, &current.domain_name).await?;

        let mut body: DnsRecordBody = projected(&current);
        record.project(&mut body);
        qualify(&mut body.name, &zone.name);
        let body = HttpUtils::to_json(&body, self.provider_name())?;

        let path = format!("/zones/{}/dns_records/{}", zone.id, record.id);
        self.write_record(
            Method::PUT,
            &path,
            body,
            &zone,
            ErrorContext::record(&zone.name, &record.id),
        )
        .await
    }

    async fn delete_record(&self, domain_name: &str, record_id: &str) -> Result<DomainRecord> {
        let record = self.get_record_info(domain_name, record_id).await?;
        let path = format!("/zones/{}/dns_records/{record_id}", record.domain_id);

        let request = self.authed(Method::DELETE, &path);
        let _: (DeletedRecord, _) = self
            .execute(
                request,
                &Method::DELETE,
                &path,
                ErrorContext::record(domain_name, record_id),
            )
            .await?;

        self.records.remove(record_id).await;
        Ok(record)
    }

    /// Cloudflare 记录没有暂停状态：启用是一次不改变内容的覆盖更新，
    /// 禁用无法表达，直接拒绝
    async fn set_record_status(
        &self,
        domain_name: &str,
        record_id: &str,
        status: RecordStatus,
    ) -> Result<DomainRecord> {
        match status {
            RecordStatus::Enable => {
                let current = self.get_record_info(domain_name, record_id).await?;
                self.update_record(&current).await
            }
            RecordStatus::Disable => Err(ProviderError::UnsupportedOperation {
                provider: self.provider_name().to_string(),
                operation: "set_record_status".to_string(),
                detail: "Cloudflare records cannot be disabled".to_string(),
            }),
        }
    }

    async fn get_record_info(&self, domain_name: &str, record_id: &str) -> Result<DomainRecord> {
        if let Some(cached) = self.records.get(record_id).await {
            return Ok(cached);
        }

        let zone = self.resolve_zone(domain_name).await?;
        let path = format!("/zones/{}/dns_records/{record_id}", zone.id);
        let request = self.authed(Method::GET, &path);
        let (native, _): (CloudflareDnsRecord, _) = self
            .execute(
                request,
                &Method::GET,
                &path,
                ErrorContext::record(domain_name, record_id),
            )
            .await?;

        let record = native.into_domain_record(&zone);
        self.records.put(&record).await;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disable_is_unsupported() {
        let provider = CloudflareProvider::new("token".into());
        let err = provider
            .set_record_status("example.com", "rec-1", RecordStatus::Disable)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, ProviderError::UnsupportedOperation { operation, .. } if operation == "set_record_status"),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn zone_resolution_uses_cache() {
        let provider = CloudflareProvider::new("token".into());
        provider
            .zones
            .put_all(&[DomainInfo {
                id: "zone-1".into(),
                name: "example.com".into(),
                ..DomainInfo::default()
            }])
            .await;

        let zone = provider.resolve_zone("example.com.").await.unwrap();
        assert_eq!(zone.id, "zone-1");

        let by_id = provider.zone_for("zone-1", "").await.unwrap();
        assert_eq!(by_id.name, "example.com");
    }

    #[tokio::test]
    async fn record_info_served_from_cache() {
        let provider = CloudflareProvider::new("token".into());
        let cached = DomainRecord {
            id: "rec-1".into(),
            domain_id: "zone-1".into(),
            ..DomainRecord::txt("zone-1", "example.com", "_acme-challenge", "abc")
        };
        provider.records.put(&cached).await;

        let found = provider.get_record_info("example.com", "rec-1").await.unwrap();
        assert_eq!(found, cached);
    }
}
