//! Storage layer abstraction trait definition

mod certificate_repository;
mod domain_repository;
mod provider_registry;

pub use certificate_repository::{CertificateRepository, InMemoryCertificateRepository};
pub use domain_repository::{DomainRepository, InMemoryDomainRepository};
pub use provider_registry::{InMemoryProviderRegistry, ProviderRegistry};

pub(crate) use domain_repository::normalize_name;
