//! `DNSPod` TC3-HMAC-SHA256 签名
//! 参考: <https://cloud.tencent.com/document/api/1427/56189>

use chrono::DateTime;
use sha2::{Digest, Sha256};

use crate::providers::common::hmac_sha256;

use super::{DNSPOD_API_HOST, DNSPOD_SERVICE, DnspodProvider};

const ALGORITHM: &str = "TC3-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";
pub(crate) const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// 一次 API 调用中参与签名的可变部分
pub(crate) struct SignInput<'a> {
    pub action: &'a str,
    pub payload: &'a str,
    /// Unix 秒
    pub timestamp: i64,
}

impl SignInput<'_> {
    /// 凭证范围中的 UTC 日期
    fn date(&self) -> String {
        DateTime::from_timestamp(self.timestamp, 0)
            .unwrap_or_default()
            .format("%Y-%m-%d")
            .to_string()
    }

    fn canonical_request(&self) -> String {
        let canonical_headers = format!(
            "content-type:{CONTENT_TYPE}\nhost:{DNSPOD_API_HOST}\nx-tc-action:{}\n",
            self.action.to_lowercase()
        );
        let hashed_payload = hex::encode(Sha256::digest(self.payload.as_bytes()));
        format!("POST\n/\n\n{canonical_headers}\n{SIGNED_HEADERS}\n{hashed_payload}")
    }
}

impl DnspodProvider {
    /// 生成 `Authorization` 头
    pub(crate) fn sign(&self, input: &SignInput<'_>) -> String {
        let date = input.date();
        let credential_scope = format!("{date}/{DNSPOD_SERVICE}/tc3_request");

        let hashed_canonical_request =
            hex::encode(Sha256::digest(input.canonical_request().as_bytes()));
        let string_to_sign = format!(
            "{ALGORITHM}\n{}\n{credential_scope}\n{hashed_canonical_request}",
            input.timestamp
        );

        let secret_date = hmac_sha256(
            format!("TC3{}", self.secret_key).as_bytes(),
            date.as_bytes(),
        );
        let secret_service = hmac_sha256(&secret_date, DNSPOD_SERVICE.as_bytes());
        let secret_signing = hmac_sha256(&secret_service, b"tc3_request");
        let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes()));

        format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.secret_id
        )
    }
}
