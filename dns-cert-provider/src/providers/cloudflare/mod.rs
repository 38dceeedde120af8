//! Cloudflare DNS Provider

mod error;
mod http;
mod mapper;
mod provider;
mod types;

use reqwest::Client;

use crate::cache::{RecordCache, ZoneCache};
use crate::providers::common::create_http_client;

pub(crate) const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Cloudflare Zones API 单页最大记录数
pub(crate) const MAX_PAGE_SIZE_ZONES: u32 = 50;
/// Cloudflare DNS Records API 单页最大记录数
pub(crate) const MAX_PAGE_SIZE_RECORDS: u32 = 5000;

/// Cloudflare DNS adapter (API v4, Bearer token).
///
/// Record endpoints are addressed by (zone id, record id). Zones are resolved
/// through a [`ZoneCache`] and records seen through this instance are kept in a
/// [`RecordCache`], so `get_record_info` and `delete_record` only need the
/// domain name the uniform contract provides.
pub struct CloudflareProvider {
    pub(crate) client: Client,
    pub(crate) api_token: String,
    pub(crate) zones: ZoneCache,
    pub(crate) records: RecordCache,
}

impl CloudflareProvider {
    pub fn new(api_token: String) -> Self {
        Self {
            client: create_http_client(),
            api_token,
            zones: ZoneCache::new(),
            records: RecordCache::new(),
        }
    }
}
