//! Provider factory.

use std::sync::Arc;

use crate::error::Result;
#[cfg(not(all(feature = "aliyun", feature = "cloudflare", feature = "dnspod")))]
use crate::error::ProviderError;
use crate::traits::RecordProvider;
use crate::types::{ProviderCredentials, ProviderType};

#[cfg(feature = "aliyun")]
use crate::providers::AliyunProvider;
#[cfg(feature = "cloudflare")]
use crate::providers::CloudflareProvider;
#[cfg(feature = "dnspod")]
use crate::providers::DnspodProvider;

/// Creates a [`RecordProvider`] instance from the given credentials.
///
/// The concrete adapter is determined by the [`ProviderCredentials`] variant. A
/// vendor whose feature flag is disabled yields
/// [`ProviderError::UnsupportedProvider`](crate::ProviderError::UnsupportedProvider).
///
/// # Examples
///
/// ```rust,no_run
/// use dns_cert_provider::{create_provider, ProviderCredentials};
///
/// let provider = create_provider(ProviderCredentials::Cloudflare {
///     api_token: "your-token".to_string(),
/// }).unwrap();
/// assert_eq!(provider.id(), "cloudflare");
/// ```
pub fn create_provider(credentials: ProviderCredentials) -> Result<Arc<dyn RecordProvider>> {
    log::debug!("creating {} provider", credentials.provider_type());
    match credentials {
        #[cfg(feature = "cloudflare")]
        ProviderCredentials::Cloudflare { api_token } => {
            Ok(Arc::new(CloudflareProvider::new(api_token)))
        }
        #[cfg(feature = "aliyun")]
        ProviderCredentials::Aliyun {
            access_key_id,
            access_key_secret,
        } => Ok(Arc::new(AliyunProvider::new(
            access_key_id,
            access_key_secret,
        ))),
        #[cfg(feature = "dnspod")]
        ProviderCredentials::Dnspod {
            secret_id,
            secret_key,
        } => Ok(Arc::new(DnspodProvider::new(secret_id, secret_key))),
        #[cfg(not(all(feature = "aliyun", feature = "cloudflare", feature = "dnspod")))]
        other => Err(ProviderError::UnsupportedProvider {
            provider: other.provider_type().to_string(),
        }),
    }
}

/// Vendors compiled into this build.
pub fn supported_providers() -> Vec<ProviderType> {
    vec![
        #[cfg(feature = "cloudflare")]
        ProviderType::Cloudflare,
        #[cfg(feature = "aliyun")]
        ProviderType::Aliyun,
        #[cfg(feature = "dnspod")]
        ProviderType::Dnspod,
    ]
}

#[cfg(all(test, feature = "all-providers"))]
mod tests {
    use super::*;

    #[test]
    fn every_credential_kind_builds_its_adapter() {
        let cases = [
            (
                ProviderCredentials::from_key_pair(ProviderType::Aliyun, "id", "secret"),
                ProviderType::Aliyun,
            ),
            (
                ProviderCredentials::from_key_pair(ProviderType::Cloudflare, "", "token"),
                ProviderType::Cloudflare,
            ),
            (
                ProviderCredentials::from_key_pair(ProviderType::Dnspod, "id", "key"),
                ProviderType::Dnspod,
            ),
        ];
        for (credentials, expected) in cases {
            let provider = create_provider(credentials).unwrap();
            assert_eq!(provider.provider_type(), expected);
            assert_eq!(provider.id(), expected.as_str());
        }
    }

    #[test]
    fn all_vendors_are_compiled_in() {
        assert_eq!(supported_providers().len(), 3);
    }
}
