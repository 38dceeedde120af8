//! 类型定义模块

mod certificate;
mod domain;
mod page;
mod task;

pub use certificate::{
    Certificate, CertificateResource, CertificateTask, ParsedCertificate, TaskState, matches_name,
};
pub use domain::Domain;
pub use page::Page;
pub use task::{IssueKind, IssueRequest, Priority, SubmittedTask, TaskPayload};

// Re-export provider 库的公共类型
pub use dns_cert_provider::{
    DnsSearch, DomainInfo, DomainList, DomainRecord, DomainsSearch, ProviderCredentials,
    ProviderType, RecordStatus,
};
