//! 阿里云 RPC 请求

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};
use crate::utils::log_sanitizer::truncate_for_log;

use super::sign::SignInput;
use super::types::serialize_to_query_string;
use super::{ALIYUN_DNS_HOST, ALIYUN_DNS_VERSION, AliyunProvider, EMPTY_BODY_SHA256};

/// 从响应 JSON 中提取 `Code` / `Message`
fn api_error(value: &serde_json::Value) -> Option<RawApiError> {
    let code = value.get("Code").and_then(|v| v.as_str())?;
    let message = value.get("Message").and_then(|v| v.as_str()).unwrap_or(code);
    Some(RawApiError::with_code(code, message))
}

impl AliyunProvider {
    fn api_failure(&self, action: &str, raw: RawApiError, ctx: ErrorContext) -> ProviderError {
        log::warn!(
            "[aliyun] {action} failed: {} - {}",
            raw.code.as_deref().unwrap_or("-"),
            raw.message
        );
        self.map_error(raw, ctx)
    }

    /// 执行阿里云 API 请求（参数通过 query string 传递，body 为空）
    pub(crate) async fn request<T, B>(
        &self,
        action: &str,
        params: &B,
        ctx: ErrorContext,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let query_string = serialize_to_query_string(params)?;
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = uuid::Uuid::new_v4().to_string();

        let authorization = self.sign(&SignInput {
            action,
            query_string: &query_string,
            timestamp: &timestamp,
            nonce: &nonce,
        });

        let url = if query_string.is_empty() {
            format!("https://{ALIYUN_DNS_HOST}/")
        } else {
            format!("https://{ALIYUN_DNS_HOST}/?{query_string}")
        };

        let request = self
            .client
            .post(&url)
            .header("Host", ALIYUN_DNS_HOST)
            .header("x-acs-action", action)
            .header("x-acs-version", ALIYUN_DNS_VERSION)
            .header("x-acs-date", &timestamp)
            .header("x-acs-signature-nonce", &nonce)
            .header("x-acs-content-sha256", EMPTY_BODY_SHA256)
            .header("Authorization", authorization);

        let (status, response_text) =
            HttpUtils::execute_request(request, self.provider_name(), "POST", action).await?;

        if status >= 400 {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&response_text)
                && let Some(raw) = api_error(&value)
            {
                return Err(self.api_failure(action, raw, ctx));
            }
            return Err(ProviderError::NetworkError {
                provider: self.provider_name().to_string(),
                detail: format!("HTTP {status}: {}", truncate_for_log(&response_text)),
            });
        }

        let value: serde_json::Value = HttpUtils::parse_json(&response_text, self.provider_name())?;
        if let Some(raw) = api_error(&value) {
            return Err(self.api_failure(action, raw, ctx));
        }

        serde_json::from_value(value).map_err(|e| self.parse_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_requires_code() {
        let value = serde_json::json!({"Code": "Throttling", "Message": "slow down"});
        let raw = api_error(&value).unwrap();
        assert_eq!(raw.code.as_deref(), Some("Throttling"));
        assert_eq!(raw.message, "slow down");

        assert!(api_error(&serde_json::json!({"RecordId": "1"})).is_none());
    }
}
