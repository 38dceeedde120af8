//! Cloudflare error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::CloudflareProvider;

/// Cloudflare error code mapping
/// Reference: <https://developers.cloudflare.com/api/>
impl ProviderErrorMapper for CloudflareProvider {
    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        match raw.code.as_deref() {
            // 6003/6103/6111: malformed auth headers, 9106/9109/10000: authentication error
            Some("6003" | "6103" | "6111" | "9106" | "9109" | "10000") => {
                ProviderError::InvalidCredentials {
                    provider,
                    raw_message: Some(raw.message),
                }
            }

            // 9000 name, 9005/9006/9009 content, 9021 ttl, 9041 proxied, 1004 general validation
            Some(code @ ("1004" | "9000" | "9005" | "9006" | "9009" | "9021" | "9041")) => {
                let param = match code {
                    "9000" => "name",
                    "9005" | "9006" | "9009" => "value",
                    "9021" => "ttl",
                    "9041" => "proxied",
                    _ => "general",
                };
                ProviderError::InvalidParameter {
                    provider,
                    param: param.to_string(),
                    detail: raw.message,
                }
            }

            // 81053..=81058: a record with that host/settings already exists
            Some("81053" | "81054" | "81055" | "81056" | "81057" | "81058") => {
                ProviderError::RecordExists {
                    provider,
                    record_name: context.record_name.unwrap_or_default(),
                    raw_message: Some(raw.message),
                }
            }

            // 81044: record does not exist
            Some("81044") => ProviderError::RecordNotFound {
                provider,
                record_id: context.record_id.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            // 81045: record quota exceeded
            Some("81045") => ProviderError::QuotaExceeded {
                provider,
                raw_message: Some(raw.message),
            },

            // 971 / 10013: throttled
            Some("971" | "10013") => ProviderError::RateLimited {
                provider,
                retry_after: None,
                raw_message: Some(raw.message),
            },

            // 1001 unknown zone, 7000/7003: no route (bad zone identifier)
            Some("1001" | "7000" | "7003") => ProviderError::DomainNotFound {
                provider,
                domain: context.domain.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            // 9103: unknown X-Auth-Key or email, 10001: forbidden for this token
            Some("9103" | "10001") => ProviderError::PermissionDenied {
                provider,
                raw_message: Some(raw.message),
            },

            _ => self.unknown_error(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> CloudflareProvider {
        CloudflareProvider::new(String::new())
    }

    fn ctx() -> ErrorContext {
        ErrorContext {
            record_name: Some("www".to_string()),
            record_id: Some("rec-123".to_string()),
            domain: Some("example.com".to_string()),
        }
    }

    #[test]
    fn auth_codes_map_to_invalid_credentials() {
        for code in ["6003", "6103", "6111", "9109", "10000"] {
            let err = provider().map_error(RawApiError::with_code(code, "auth"), ctx());
            assert!(
                matches!(err, ProviderError::InvalidCredentials { .. }),
                "code {code}: {err:?}"
            );
        }
    }

    #[test]
    fn validation_codes_name_the_parameter() {
        let err = provider().map_error(RawApiError::with_code("9021", "bad ttl"), ctx());
        assert!(
            matches!(&err, ProviderError::InvalidParameter { param, .. } if param == "ttl"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn record_codes_carry_context() {
        let exists = provider().map_error(RawApiError::with_code("81057", "exists"), ctx());
        assert!(
            matches!(&exists, ProviderError::RecordExists { record_name, .. } if record_name == "www")
        );

        let missing = provider().map_error(RawApiError::with_code("81044", "gone"), ctx());
        assert!(
            matches!(&missing, ProviderError::RecordNotFound { record_id, .. } if record_id == "rec-123")
        );
    }

    #[test]
    fn zone_routing_errors_are_domain_not_found() {
        let err = provider().map_error(RawApiError::with_code("7003", "no route"), ctx());
        assert!(
            matches!(&err, ProviderError::DomainNotFound { domain, .. } if domain == "example.com")
        );
    }

    #[test]
    fn unmapped_code_is_unknown() {
        let err = provider().map_error(RawApiError::with_code("99999", "new"), ctx());
        assert!(
            matches!(&err, ProviderError::Unknown { raw_code: Some(c), .. } if c == "99999")
        );
    }
}
