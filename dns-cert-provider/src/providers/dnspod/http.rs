//! `DNSPod` HTTP 请求方法

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};
use crate::utils::log_sanitizer::truncate_for_log;

use super::sign::{CONTENT_TYPE, SignInput};
use super::types::{TencentError, TencentResponse};
use super::{DNSPOD_API_HOST, DNSPOD_VERSION, DnspodProvider};

/// `Response.Error` 存在即表示调用失败
fn api_error(response: &serde_json::Value) -> Option<RawApiError> {
    let error: TencentError = serde_json::from_value(response.get("Error")?.clone()).ok()?;
    Some(RawApiError::with_code(error.code, error.message))
}

impl DnspodProvider {
    /// 执行腾讯云 API 请求，返回 `Response` 中的业务数据
    pub(crate) async fn request<T, B>(&self, action: &str, body: &B, ctx: ErrorContext) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let payload = HttpUtils::to_json(body, self.provider_name())?;
        log::debug!("[dnspod] {action} body: {payload}");

        let timestamp = Utc::now().timestamp();
        let authorization = self.sign(&SignInput {
            action,
            payload: &payload,
            timestamp,
        });

        let request = self
            .client
            .post(format!("https://{DNSPOD_API_HOST}"))
            .header("Content-Type", CONTENT_TYPE)
            .header("Host", DNSPOD_API_HOST)
            .header("X-TC-Action", action)
            .header("X-TC-Version", DNSPOD_VERSION)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("Authorization", authorization)
            .body(payload);

        let (status, response_text) =
            HttpUtils::execute_request(request, self.provider_name(), "POST", action).await?;

        // 业务错误同样以 HTTP 200 返回，非 2xx 且无法解析时按网络错误处理
        let envelope: TencentResponse = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(_) if status >= 400 => {
                return Err(ProviderError::NetworkError {
                    provider: self.provider_name().to_string(),
                    detail: format!("HTTP {status}: {}", truncate_for_log(&response_text)),
                });
            }
            Err(e) => return Err(self.parse_error(e)),
        };

        if let Some(raw) = api_error(&envelope.response) {
            log::warn!(
                "[dnspod] {action} failed: {} - {}",
                raw.code.as_deref().unwrap_or("-"),
                raw.message
            );
            return Err(self.map_error(raw, ctx));
        }

        serde_json::from_value(envelope.response).map_err(|e| self.parse_error(e))
    }
}
