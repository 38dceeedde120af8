//! `DNSPod` API 原生请求/响应结构
//!
//! 请求字段均为 Option，由 field mapper 按需填充；`None` 不进入 JSON body。

use serde::{Deserialize, Serialize};

/// 腾讯云 API 外层包装：`{ "Response": { ... } }`
#[derive(Debug, Deserialize)]
pub struct TencentResponse {
    #[serde(rename = "Response")]
    pub response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct TencentError {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

// ============ 请求结构 ============

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainListRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeRecordListRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// `CreateRecord` / `ModifyRecord` 共用 body，`ModifyRecord` 额外携带 `RecordId`
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordWriteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(rename = "MX", skip_serializing_if = "Option::is_none")]
    pub mx: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// `DeleteRecord` / `DescribeRecord`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordIdRequest {
    pub domain: String,
    pub record_id: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyRecordStatusRequest {
    pub domain: String,
    pub record_id: u64,
    /// `ENABLE` / `DISABLE`
    pub status: String,
}

// ============ 响应结构 ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainListResponse {
    pub domain_count_info: Option<DomainCountInfo>,
    #[serde(default)]
    pub domain_list: Vec<DnspodDomain>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainCountInfo {
    pub all_total: Option<u32>,
    pub domain_total: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnspodDomain {
    pub domain_id: u64,
    pub name: String,
    #[serde(default)]
    pub status: String,
    pub record_count: Option<u32>,
    pub group_id: Option<u64>,
    #[serde(rename = "EffectiveDNS", default)]
    pub effective_dns: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeRecordListResponse {
    pub record_count_info: Option<RecordCountInfo>,
    #[serde(default)]
    pub record_list: Vec<DnspodRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordCountInfo {
    pub total_count: Option<u32>,
}

/// `DescribeRecordList` 中的记录
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnspodRecord {
    pub record_id: u64,
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    pub value: String,
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "TTL", default)]
    pub ttl: u32,
    pub weight: Option<u32>,
    #[serde(rename = "MX")]
    pub mx: Option<u32>,
    pub updated_on: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeRecordResponse {
    pub record_info: DnspodRecordInfo,
}

/// `DescribeRecord` 返回的单条记录，字段名与列表接口不同
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnspodRecordInfo {
    pub id: u64,
    pub domain_id: Option<u64>,
    pub sub_domain: String,
    pub record_type: String,
    pub value: String,
    #[serde(default)]
    pub record_line: String,
    #[serde(rename = "TTL", default)]
    pub ttl: u32,
    pub weight: Option<u32>,
    #[serde(rename = "MX")]
    pub mx: Option<u32>,
    /// 1 启用, 0 暂停
    #[serde(default)]
    pub enabled: u8,
    pub updated_on: Option<String>,
}

/// `CreateRecord` / `ModifyRecord` / `ModifyRecordStatus`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordIdResponse {
    pub record_id: Option<u64>,
}
