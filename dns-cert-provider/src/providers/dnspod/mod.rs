//! 腾讯云 `DNSPod` Provider

mod error;
mod http;
mod mapper;
mod provider;
mod sign;
mod types;

use reqwest::Client;

use crate::cache::RecordCache;
use crate::providers::common::create_http_client;

pub(crate) const DNSPOD_API_HOST: &str = "dnspod.tencentcloudapi.com";
pub(crate) const DNSPOD_SERVICE: &str = "dnspod";
pub(crate) const DNSPOD_VERSION: &str = "2021-03-23";
/// `DNSPod` API 单页最大记录数
pub(crate) const MAX_PAGE_SIZE: u32 = 3000;
/// 未指定线路时使用的默认线路
pub(crate) const DEFAULT_RECORD_LINE: &str = "默认";

/// Tencent Cloud `DNSPod` adapter.
///
/// Calls the `2021-03-23` API with TC3-HMAC-SHA256 signed JSON bodies. `DNSPod`
/// record and domain ids are integers on the wire; the uniform string ids are
/// converted both ways and a non-numeric id is rejected before any request is sent.
pub struct DnspodProvider {
    pub(crate) client: Client,
    pub(crate) secret_id: String,
    pub(crate) secret_key: String,
    pub(crate) records: RecordCache,
}

impl DnspodProvider {
    pub fn new(secret_id: String, secret_key: String) -> Self {
        Self {
            client: create_http_client(),
            secret_id,
            secret_key,
            records: RecordCache::new(),
        }
    }
}
