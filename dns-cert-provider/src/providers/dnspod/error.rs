//! `DNSPod` error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::DnspodProvider;

/// 记录不存在，列表接口用它表示"空列表"
pub(crate) const NO_DATA_OF_RECORD: &str = "ResourceNotFound.NoDataOfRecord";

/// 参数类错误码 → 统一参数名
fn invalid_param(code: &str) -> Option<&'static str> {
    Some(match code {
        "InvalidParameter.RecordLineInvalid" | "InvalidParameter.LineNotExist" => "line",
        "InvalidParameter.RecordTypeInvalid" => "type",
        "InvalidParameter.RecordValueInvalid" | "InvalidParameter.RecordValueLengthInvalid" => {
            "value"
        }
        "InvalidParameter.SubdomainInvalid" => "subdomain",
        "LimitExceeded.RecordTtlLimit" => "ttl",
        "InvalidParameter.MxInvalid" => "mx",
        "InvalidParameter.DomainIdInvalid"
        | "InvalidParameter.DomainInvalid"
        | "InvalidParameter.DomainTooLong"
        | "InvalidParameter.DomainTypeInvalid" => "domain",
        "InvalidParameter.RecordIdInvalid" => "record_id",
        _ => return None,
    })
}

/// `DNSPod` error code mapping
/// Reference: <https://cloud.tencent.com/document/api/1427/56192>
impl ProviderErrorMapper for DnspodProvider {
    fn provider_name(&self) -> &'static str {
        "dnspod"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        let Some(code) = raw.code.clone() else {
            return self.unknown_error(raw);
        };

        if let Some(param) = invalid_param(&code) {
            return ProviderError::InvalidParameter {
                provider,
                param: param.to_string(),
                detail: raw.message,
            };
        }

        match code.as_str() {
            c if c.starts_with("AuthFailure")
                || matches!(
                    c,
                    "InvalidParameter.InvalidSecretId"
                        | "InvalidParameter.InvalidSignature"
                        | "InvalidParameter.LoginTokenNotExists"
                        | "InvalidParameter.LoginTokenValidateFailed"
                ) =>
            {
                ProviderError::InvalidCredentials {
                    provider,
                    raw_message: Some(raw.message),
                }
            }

            // 临时性频率限制
            "RequestLimitExceeded"
            | "RequestLimitExceeded.RequestLimitExceeded"
            | "FailedOperation.FrequencyLimit"
            | "InvalidParameter.OperationIsTooFrequent" => ProviderError::RateLimited {
                provider,
                retry_after: None,
                raw_message: Some(raw.message),
            },

            // 资源配额耗尽
            c if c.starts_with("LimitExceeded") || c.starts_with("RequestLimitExceeded.") => {
                ProviderError::QuotaExceeded {
                    provider,
                    raw_message: Some(raw.message),
                }
            }

            "InvalidParameter.DomainRecordExist" => ProviderError::RecordExists {
                provider,
                record_name: context.record_name.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            NO_DATA_OF_RECORD | "InvalidParameter.RecordIdNotExist" => {
                ProviderError::RecordNotFound {
                    provider,
                    record_id: context.record_id.unwrap_or_default(),
                    raw_message: Some(raw.message),
                }
            }

            "ResourceNotFound.NoDataOfDomain"
            | "InvalidParameterValue.DomainNotExists"
            | "InvalidParameter.DomainNotExist" => ProviderError::DomainNotFound {
                provider,
                domain: context.domain.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            // 域名/账号被锁定也视为无权操作
            c if c.starts_with("OperationDenied")
                || c.starts_with("UnauthorizedOperation")
                || matches!(
                    c,
                    "FailedOperation.DomainIsLocked"
                        | "FailedOperation.DomainIsSpam"
                        | "FailedOperation.AccountIsLocked"
                        | "FailedOperation.NotDomainOwner"
                        | "FailedOperation.NotResourceOwner"
                        | "InvalidParameter.PermissionDenied"
                ) =>
            {
                ProviderError::PermissionDenied {
                    provider,
                    raw_message: Some(raw.message),
                }
            }

            _ => self.unknown_error(raw),
        }
    }
}
