//! Unified error type definition

use serde::{Serialize, Serializer};
use thiserror::Error;

// Re-export library error type
pub use dns_cert_provider::ProviderError;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Account name is not present in configuration
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Vendor tag unknown or not compiled into this build
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Certificate email pool is empty
    #[error("No ACME account email configured")]
    NoEmailConfigured,

    /// Domain name not found
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    #[error("Certificate not found: {0}")]
    CertificateNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// An issuance for the same domain set is still queued or running
    #[error("Issuance already in progress for: {0}")]
    DuplicateSubmission(String),

    /// DNS-01 challenge record could not be presented or cleaned up
    #[error("DNS-01 challenge failed for {domain}: {message}")]
    Challenge { domain: String, message: String },

    /// ACME protocol error
    #[error("ACME error: {0}")]
    Acme(String),

    /// PEM / X.509 parse error
    #[error("Certificate parse error: {0}")]
    CertificateParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Worker queue has shut down
    #[error("Task queue closed: {0}")]
    QueueClosed(String),

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("I/O error: {0}")]
    #[serde(serialize_with = "serialize_display")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[serde(serialize_with = "serialize_display")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added. **
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::AccountNotFound(_)
            | Self::UnsupportedProvider(_)
            | Self::DomainNotFound(_)
            | Self::CertificateNotFound(_)
            | Self::TaskNotFound(_)
            | Self::DuplicateSubmission(_)
            | Self::ValidationError(_) => true,
            Self::Provider(e) => e.is_expected(),
            _ => false,
        }
    }

    /// Wrap an error raised while handling the challenge for `domain`.
    pub fn challenge(domain: &str, err: impl std::fmt::Display) -> Self {
        Self::Challenge {
            domain: domain.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<instant_acme::Error> for CoreError {
    fn from(err: instant_acme::Error) -> Self {
        Self::Acme(err.to_string())
    }
}

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: std::fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_code_tag() {
        let json = serde_json::to_value(CoreError::TaskNotFound("t-1".into())).unwrap();
        assert_eq!(json["code"], "TaskNotFound");
        assert_eq!(json["details"], "t-1");
    }

    #[test]
    fn io_error_serializes_as_text() {
        let err = CoreError::from(std::io::Error::other("disk full"));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "Io");
        assert_eq!(json["details"], "disk full");
    }

    #[test]
    fn expected_follows_provider_classification() {
        let not_found = CoreError::from(ProviderError::RecordNotFound {
            provider: "aliyun".into(),
            record_id: "1".into(),
            raw_message: None,
        });
        assert!(not_found.is_expected());

        let network = CoreError::from(ProviderError::NetworkError {
            provider: "aliyun".into(),
            detail: "reset".into(),
        });
        assert!(!network.is_expected());
        assert!(!CoreError::Acme("order invalid".into()).is_expected());
    }

    #[test]
    fn challenge_message_names_domain() {
        let err = CoreError::challenge("example.com", "quota exceeded");
        assert_eq!(
            err.to_string(),
            "DNS-01 challenge failed for example.com: quota exceeded"
        );
    }
}
