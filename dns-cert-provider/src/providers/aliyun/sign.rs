//! 阿里云 ACS3-HMAC-SHA256 签名
//! 参考: <https://www.alibabacloud.com/help/zh/sdk/product-overview/v3-request-structure-and-signature>

use sha2::{Digest, Sha256};

use crate::providers::common::hmac_sha256;

use super::{ALIYUN_DNS_HOST, ALIYUN_DNS_VERSION, AliyunProvider, EMPTY_BODY_SHA256};

const ALGORITHM: &str = "ACS3-HMAC-SHA256";

/// 一次 RPC 调用中参与签名的可变部分
pub(crate) struct SignInput<'a> {
    pub action: &'a str,
    pub query_string: &'a str,
    pub timestamp: &'a str,
    pub nonce: &'a str,
}

impl SignInput<'_> {
    /// 参与签名的请求头，按名称字典序排列
    fn signed_headers(&self) -> [(&'static str, &str); 6] {
        [
            ("host", ALIYUN_DNS_HOST),
            ("x-acs-action", self.action),
            ("x-acs-content-sha256", EMPTY_BODY_SHA256),
            ("x-acs-date", self.timestamp),
            ("x-acs-signature-nonce", self.nonce),
            ("x-acs-version", ALIYUN_DNS_VERSION),
        ]
    }

    /// RPC 风格规范化请求：参数全部在 query string 中，body 为空
    fn canonical_request(&self) -> (String, String) {
        let headers = self.signed_headers();
        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(";");

        let request = format!(
            "POST\n/\n{}\n{canonical_headers}\n{signed_headers}\n{EMPTY_BODY_SHA256}",
            self.query_string
        );
        (request, signed_headers)
    }
}

impl AliyunProvider {
    /// 生成 `Authorization` 头
    pub(crate) fn sign(&self, input: &SignInput<'_>) -> String {
        let (canonical_request, signed_headers) = input.canonical_request();
        log::debug!("CanonicalRequest:\n{canonical_request}");

        let string_to_sign = format!(
            "{ALGORITHM}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signature = hex::encode(hmac_sha256(
            self.access_key_secret.as_bytes(),
            string_to_sign.as_bytes(),
        ));

        format!(
            "{ALGORITHM} Credential={},SignedHeaders={signed_headers},Signature={signature}",
            self.access_key_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(key_id: &str, secret: &str, action: &str, query: &str) -> String {
        let provider = AliyunProvider::new(key_id.to_string(), secret.to_string());
        provider.sign(&SignInput {
            action,
            query_string: query,
            timestamp: "2024-01-15T08:00:00Z",
            nonce: "test-nonce-12345",
        })
    }

    fn signature_of(auth: &str) -> &str {
        auth.split("Signature=").nth(1).unwrap_or_default()
    }

    #[test]
    fn authorization_header_layout() {
        let auth = sign("LTAI5tMyTestKeyId", "secret", "DescribeDomains", "");
        assert!(auth.starts_with("ACS3-HMAC-SHA256 Credential=LTAI5tMyTestKeyId,"));
        assert!(auth.contains(
            "SignedHeaders=host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version,"
        ));
        assert_eq!(signature_of(&auth).len(), 64);
    }

    #[test]
    fn signature_depends_on_action_and_secret() {
        let base = sign("id", "secret-one", "DescribeDomains", "");
        let other_action = sign("id", "secret-one", "DescribeDomainRecords", "");
        let other_secret = sign("id", "secret-two", "DescribeDomains", "");

        assert_eq!(base, sign("id", "secret-one", "DescribeDomains", ""));
        assert_ne!(signature_of(&base), signature_of(&other_action));
        assert_ne!(signature_of(&base), signature_of(&other_secret));
    }

    #[test]
    fn signature_snapshot() {
        let auth = sign(
            "LTAI5tTestKeyId",
            "TestSecretKey123456",
            "DescribeDomainRecords",
            "DomainName=example.com",
        );
        assert_eq!(
            signature_of(&auth),
            "9c4173ede0946854e402679d086862a853ada5d1b83c34216ede75a499d50afd"
        );
    }
}
