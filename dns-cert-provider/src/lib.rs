//! # dns-cert-provider
//!
//! A uniform DNS record abstraction over several DNS vendors, built for ACME
//! DNS-01 automation: one record model, one async [`RecordProvider`] contract,
//! and one adapter per vendor translating to and from the vendor's native API.
//!
//! ## Supported Providers
//!
//! | Provider | Feature Flag | Auth Method | Native ids |
//! |----------|-------------|-------------|------------|
//! | [Cloudflare](https://www.cloudflare.com/) | `cloudflare` | Bearer Token | string |
//! | [Aliyun DNS](https://www.aliyun.com/product/dns) | `aliyun` | ACS3-HMAC-SHA256 | string |
//! | [DNSPod (Tencent Cloud)](https://www.dnspod.cn/) | `dnspod` | TC3-HMAC-SHA256 | `u64` |
//!
//! ## Feature Flags
//!
//! - **`all-providers`** *(default)*: enable every adapter listed above.
//! - **`cloudflare`**, **`aliyun`**, **`dnspod`**: enable a single adapter.
//! - **`native-tls`** *(default)* / **`rustls`**: TLS backend for `reqwest`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dns_cert_provider::{create_provider, DnsSearch, DomainRecord, ProviderCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = create_provider(ProviderCredentials::Dnspod {
//!         secret_id: "your-secret-id".to_string(),
//!         secret_key: "your-secret-key".to_string(),
//!     })?;
//!
//!     let record = provider
//!         .add_record(&DomainRecord::txt("", "example.com", "_acme-challenge", "token"))
//!         .await?;
//!
//!     let search = DnsSearch::for_domain("", "example.com")
//!         .with_host("_acme-challenge")
//!         .with_type("TXT");
//!     for r in provider.get_record_list(&search).await? {
//!         println!("{} {} -> {}", r.record_name, r.record_type, r.value);
//!     }
//!
//!     provider.delete_record("example.com", &record.id).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, ProviderError>`](ProviderError). Vendor error
//! codes are mapped to structured variants such as
//! [`ProviderError::InvalidCredentials`], [`ProviderError::RecordNotFound`] or
//! [`ProviderError::RateLimited`]. Adapters never retry; that decision belongs to
//! the caller.

mod cache;
mod error;
mod factory;
pub mod field_mapper;
mod http_client;
mod providers;
mod traits;
mod types;
mod utils;

pub use cache::{CachePolicy, RecordCache, ZoneCache};

pub use error::{ProviderError, Result};

pub use factory::{create_provider, supported_providers};

// Internal traits (error mapping) are not exported
pub use traits::RecordProvider;

pub use types::{
    DnsSearch, DomainInfo, DomainList, DomainRecord, DomainsSearch, ProviderCredentials,
    ProviderType, RecordStatus,
};

pub use utils::log_sanitizer;

#[cfg(feature = "cloudflare")]
pub use providers::CloudflareProvider;

#[cfg(feature = "aliyun")]
pub use providers::AliyunProvider;

#[cfg(feature = "dnspod")]
pub use providers::DnspodProvider;
