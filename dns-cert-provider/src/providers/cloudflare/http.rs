//! Cloudflare HTTP 请求方法

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};
use crate::utils::log_sanitizer::truncate_for_log;

use super::types::{CloudflareResponse, CloudflareResultInfo};
use super::{CF_API_BASE, CloudflareProvider};

impl CloudflareProvider {
    /// 带 Bearer 认证的请求构造器
    pub(crate) fn authed(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{CF_API_BASE}{path}"))
            .bearer_auth(&self.api_token)
    }

    /// 发送请求并解包 `result`
    ///
    /// Cloudflare 在 4xx 时同样返回 `{ success: false, errors: [...] }`，
    /// 因此先按通用结构解析，再根据 `success` 决定映射错误还是反序列化结果。
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: &Method,
        path: &str,
        ctx: ErrorContext,
    ) -> Result<(T, Option<CloudflareResultInfo>)> {
        let (status, response_text) =
            HttpUtils::execute_request(request, self.provider_name(), method.as_str(), path)
                .await?;

        let response: CloudflareResponse<serde_json::Value> =
            match serde_json::from_str(&response_text) {
                Ok(r) => r,
                Err(_) if status >= 400 => {
                    return Err(ProviderError::NetworkError {
                        provider: self.provider_name().to_string(),
                        detail: format!("HTTP {status}: {}", truncate_for_log(&response_text)),
                    });
                }
                Err(e) => return Err(self.parse_error(e)),
            };

        if !response.success {
            let raw = response.errors.first().map_or_else(
                || RawApiError::new(format!("HTTP {status}")),
                |e| RawApiError::with_code(e.code.to_string(), e.message.clone()),
            );
            log::warn!(
                "[cloudflare] {method} {path} failed: {} - {}",
                raw.code.as_deref().unwrap_or("-"),
                raw.message
            );
            return Err(self.map_error(raw, ctx));
        }

        let result = response
            .result
            .ok_or_else(|| self.parse_error("missing `result` in response"))?;
        let value = serde_json::from_value(result).map_err(|e| self.parse_error(e))?;
        Ok((value, response.result_info))
    }
}
