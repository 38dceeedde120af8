//! 阿里云 API 原生请求/响应结构与 query string 序列化

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ProviderError, Result};

// ============ RFC3986 URL 编码 ============

/// RFC3986 URL 编码（只保留 unreserved 字符，空格编码为 `%20`）
pub fn url_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// 将 `serde_json::Value` 展平为 key-value 对（嵌套对象用 `.` 连接，数组下标从 1 开始）
fn flatten_value(prefix: &str, value: &serde_json::Value, out: &mut BTreeMap<String, String>) {
    let key = |k: &str| {
        if prefix.is_empty() {
            k.to_string()
        } else {
            format!("{prefix}.{k}")
        }
    };
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                flatten_value(&key(k), v, out);
            }
        }
        serde_json::Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten_value(&key(&(i + 1).to_string()), v, out);
            }
        }
        serde_json::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        serde_json::Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        serde_json::Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        serde_json::Value::Null => {}
    }
}

/// 将请求结构体序列化为按 key 排序的 query string（签名要求有序）
pub fn serialize_to_query_string<T: Serialize>(params: &T) -> Result<String> {
    let value = serde_json::to_value(params).map_err(|e| ProviderError::SerializationError {
        provider: "aliyun".to_string(),
        detail: e.to_string(),
    })?;

    let mut flat = BTreeMap::new();
    flatten_value("", &value, &mut flat);

    Ok(flat
        .iter()
        .map(|(k, v)| format!("{}={}", url_encode(k), url_encode(v)))
        .collect::<Vec<_>>()
        .join("&"))
}

// ============ 请求结构 ============
//
// 所有字段均为 Option，由 field mapper 按需填充，None 不会出现在 query string 中。

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    #[serde(rename = "KeyWord", skip_serializing_if = "Option::is_none")]
    pub key_word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainRecordsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    #[serde(rename = "KeyWord", skip_serializing_if = "Option::is_none")]
    pub key_word: Option<String>,
    #[serde(rename = "RRKeyWord", skip_serializing_if = "Option::is_none")]
    pub rr_key_word: Option<String>,
    #[serde(rename = "TypeKeyWord", skip_serializing_if = "Option::is_none")]
    pub type_key_word: Option<String>,
    #[serde(rename = "ValueKeyWord", skip_serializing_if = "Option::is_none")]
    pub value_key_word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct AddDomainRecordRequest {
    #[serde(rename = "DomainName", skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(rename = "RR", skip_serializing_if = "Option::is_none")]
    pub rr: Option<String>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(rename = "Value", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(rename = "Line", skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(rename = "Priority", skip_serializing_if = "Option::is_none")]
    pub priority: Option<u64>,
}

#[derive(Debug, Default, Serialize)]
pub struct UpdateDomainRecordRequest {
    #[serde(rename = "RecordId", skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(rename = "RR", skip_serializing_if = "Option::is_none")]
    pub rr: Option<String>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(rename = "Value", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(rename = "Line", skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(rename = "Priority", skip_serializing_if = "Option::is_none")]
    pub priority: Option<u64>,
}

/// `DeleteDomainRecord` / `DescribeDomainRecordInfo` 共用
#[derive(Debug, Serialize)]
pub struct RecordIdRequest {
    #[serde(rename = "RecordId")]
    pub record_id: String,
}

#[derive(Debug, Serialize)]
pub struct SetDomainRecordStatusRequest {
    #[serde(rename = "RecordId")]
    pub record_id: String,
    #[serde(rename = "Status")]
    pub status: String,
}

// ============ 响应结构 ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainsResponse {
    pub domains: Option<DomainsWrapper>,
    pub total_count: Option<u32>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DomainsWrapper {
    #[serde(rename = "Domain", default)]
    pub domain: Vec<AliyunDomain>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AliyunDomain {
    pub domain_id: Option<String>,
    pub domain_name: String,
    pub group_id: Option<String>,
    pub group_name: Option<String>,
    pub record_count: Option<u32>,
    pub dns_servers: Option<DnsServersWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct DnsServersWrapper {
    #[serde(rename = "DnsServer", default)]
    pub dns_server: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainRecordsResponse {
    pub domain_records: Option<DomainRecordsWrapper>,
    pub total_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DomainRecordsWrapper {
    #[serde(rename = "Record", default)]
    pub record: Vec<AliyunRecord>,
}

/// 记录结构，`DescribeDomainRecords` 列表项与 `DescribeDomainRecordInfo` 响应共用
#[derive(Debug, Deserialize)]
pub struct AliyunRecord {
    #[serde(rename = "RecordId")]
    pub record_id: String,
    #[serde(rename = "DomainId")]
    pub domain_id: Option<String>,
    #[serde(rename = "DomainName")]
    pub domain_name: Option<String>,
    #[serde(rename = "RR")]
    pub rr: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "TTL")]
    pub ttl: Option<u32>,
    #[serde(rename = "Line")]
    pub line: Option<String>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "Weight")]
    pub weight: Option<u32>,
    #[serde(rename = "Priority")]
    pub priority: Option<u32>,
    #[serde(rename = "Locked")]
    pub locked: Option<bool>,
    #[serde(rename = "CreateTimestamp")]
    pub create_timestamp: Option<i64>,
    #[serde(rename = "UpdateTimestamp")]
    pub update_timestamp: Option<i64>,
}

/// `AddDomainRecord` / `UpdateDomainRecord` / `DeleteDomainRecord` /
/// `SetDomainRecordStatus` 的响应都只关心 `RecordId`
#[derive(Debug, Deserialize)]
pub struct RecordIdResponse {
    #[serde(rename = "RecordId")]
    pub record_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_encode_keeps_unreserved() {
        assert_eq!(url_encode("abc123-._~"), "abc123-._~");
    }

    #[test]
    fn url_encode_escapes_reserved_and_utf8() {
        assert_eq!(url_encode("hello world"), "hello%20world");
        assert_eq!(url_encode("/?&="), "%2F%3F%26%3D");
        assert_eq!(url_encode("默认"), "%E9%BB%98%E8%AE%A4");
    }

    #[test]
    fn flatten_nested_and_arrays() {
        let mut map = BTreeMap::new();
        flatten_value("", &json!({"a": {"b": "1"}, "c": [10, 20], "d": null}), &mut map);
        assert_eq!(map.get("a.b").map(String::as_str), Some("1"));
        assert_eq!(map.get("c.1").map(String::as_str), Some("10"));
        assert_eq!(map.get("c.2").map(String::as_str), Some("20"));
        assert!(!map.contains_key("d"));
    }

    #[test]
    fn query_string_is_sorted_and_skips_unset_fields() {
        let req = DescribeDomainRecordsRequest {
            domain_name: Some("example.com".into()),
            rr_key_word: Some("_acme-challenge".into()),
            type_key_word: Some("TXT".into()),
            page_number: Some(1),
            ..DescribeDomainRecordsRequest::default()
        };
        assert_eq!(
            serialize_to_query_string(&req).unwrap(),
            "DomainName=example.com&PageNumber=1&RRKeyWord=_acme-challenge&TypeKeyWord=TXT"
        );
    }

    #[test]
    fn record_info_response_deserializes() {
        let body = json!({
            "RequestId": "x",
            "RecordId": "9999985",
            "DomainId": "00efd71a-770e-4255-b54e-6fe5659baffe",
            "DomainName": "example.com",
            "RR": "www",
            "Type": "A",
            "Value": "192.0.2.1",
            "TTL": 600,
            "Line": "default",
            "Status": "ENABLE",
            "Locked": false
        });
        let record: AliyunRecord = serde_json::from_value(body).unwrap();
        assert_eq!(record.record_id, "9999985");
        assert_eq!(record.ttl, Some(600));
        assert_eq!(record.status.as_deref(), Some("ENABLE"));
        assert!(record.weight.is_none());
    }
}
