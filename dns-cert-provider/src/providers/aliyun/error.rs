//! 阿里云错误映射

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::AliyunProvider;

/// 阿里云错误码映射
/// 参考: <https://api.aliyun.com/document/Alidns/2015-01-09/errorCode>
impl ProviderErrorMapper for AliyunProvider {
    fn provider_name(&self) -> &'static str {
        "aliyun"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        let invalid = |param: &str, detail: String| ProviderError::InvalidParameter {
            provider: self.provider_name().to_string(),
            param: param.to_string(),
            detail,
        };

        match raw.code.as_deref() {
            Some(
                "InvalidAccessKeyId.NotFound"
                | "InvalidAccessKeyId.Inactive"
                | "SignatureDoesNotMatch"
                | "IncompleteSignature",
            ) => ProviderError::InvalidCredentials {
                provider,
                raw_message: Some(raw.message),
            },

            Some("DomainRecordDuplicate" | "DomainRecordConflict") => ProviderError::RecordExists {
                provider,
                record_name: context.record_name.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            Some(
                "DomainRecordNotBelongToUser"
                | "InvalidRecordId.NotFound"
                | "InvalidRR.NoExist"
                | "IncorrectRecordId",
            ) => ProviderError::RecordNotFound {
                provider,
                record_id: context.record_id.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            Some("InvalidDomainName.NoExist" | "DomainNotFound" | "IncorrectDomainUser") => {
                ProviderError::DomainNotFound {
                    provider,
                    domain: context.domain.unwrap_or_default(),
                    raw_message: Some(raw.message),
                }
            }

            Some(code) if code.starts_with("QuotaExceeded") => ProviderError::QuotaExceeded {
                provider,
                raw_message: Some(raw.message),
            },

            Some("Throttling" | "Throttling.User" | "Throttling.Api") => {
                ProviderError::RateLimited {
                    provider,
                    retry_after: None,
                    raw_message: Some(raw.message),
                }
            }

            // 锁定 / 过期 / 风控都按无权限处理
            Some(
                "Forbidden"
                | "Forbidden.RiskControl"
                | "Forbidden.DomainExpired"
                | "DomainRecordLocked"
                | "DomainExpiredDNSForbidden"
                | "OperationDomain.NoPermission"
                | "IllegalUser",
            ) => ProviderError::PermissionDenied {
                provider,
                raw_message: Some(raw.message),
            },

            Some("InvalidRR.TypeEmpty" | "SubDomainInvalid.Type") => invalid("type", raw.message),
            Some(
                "InvalidRR.AValue" | "InvalidRR.AAAAValue" | "InvalidRR.MXValue" | "InvalidRR.NSValue",
            ) => invalid("value", raw.message),
            Some("InvalidRR.RrEmpty" | "InvalidRR.Format" | "InvalidRR.Length") => {
                invalid("rr", raw.message)
            }
            Some("SubDomainInvalid.TTL") => invalid("ttl", raw.message),
            Some("SubDomainInvalid.Line" | "UnsupportedLine") => invalid("line", raw.message),
            Some("SubDomainInvalid.Priority") => invalid("priority", raw.message),
            Some("InvalidStatus" | "IncorrectStatus") => invalid("status", raw.message),
            Some("InvalidDomainName.Format" | "DomainEmpty") => invalid("domain", raw.message),

            _ => self.unknown_error(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> AliyunProvider {
        AliyunProvider::new("id".into(), "secret".into())
    }

    #[test]
    fn maps_record_not_found_with_context() {
        let err = provider().map_error(
            RawApiError::with_code("DomainRecordNotBelongToUser", "no such record"),
            ErrorContext::record("example.com", "42"),
        );
        assert!(
            matches!(&err, ProviderError::RecordNotFound { record_id, .. } if record_id == "42"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn maps_quota_prefix() {
        let err = provider().map_error(
            RawApiError::with_code("QuotaExceeded.TXTRecord", "too many"),
            ErrorContext::default(),
        );
        assert!(matches!(err, ProviderError::QuotaExceeded { .. }));
    }

    #[test]
    fn unknown_code_keeps_raw_values() {
        let err = provider().map_error(
            RawApiError::with_code("Something.New", "surprise"),
            ErrorContext::default(),
        );
        assert!(
            matches!(&err, ProviderError::Unknown { raw_code: Some(c), raw_message, .. }
                if c == "Something.New" && raw_message == "surprise"),
            "unexpected error: {err:?}"
        );
    }
}
