//! ACME 引擎抽象
//!
//! ACME 协议本身由引擎实现（生产环境为 [`InstantAcmeEngine`]），本 crate 只通过
//! 这里的 Trait 与之交互：创建客户端、签发 / 续期，以及 DNS-01 挑战回调。

mod instant;
mod propagation;

pub use instant::InstantAcmeEngine;
pub use propagation::{HickoryTxtLookup, PropagationChecker, PropagationConfig, TxtLookup};

use std::sync::Arc;

use async_trait::async_trait;
use rcgen::{KeyPair, PKCS_RSA_SHA256};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// 生成一把新的 RSA-2048 私钥
///
/// 证书私钥每个订单单独生成，不同证书之间不共享。
pub fn generate_key_pair() -> CoreResult<KeyPair> {
    KeyPair::generate_for(&PKCS_RSA_SHA256)
        .map_err(|e| CoreError::Acme(format!("Failed to generate RSA key: {e}")))
}

/// DNS-01 挑战回调
///
/// 引擎在通知 CA 校验前调用 `present`，无论结果如何都会在结束后调用 `cleanup`。
#[async_trait]
pub trait Dns01Solver: Send + Sync {
    /// 发布挑战 TXT 记录
    async fn present(&self, domain: &str, token: &str, key_auth: &str) -> CoreResult<()>;

    /// 删除挑战 TXT 记录
    async fn cleanup(&self, domain: &str, token: &str, key_auth: &str) -> CoreResult<()>;
}

/// 新订单参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObtainRequest {
    /// 订单中的全部标识，第一个为主域名
    pub domains: Vec<String>,
}

/// 签发结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBundle {
    /// 主域名
    pub domain: String,
    pub domains: Vec<String>,
    /// 叶子证书 + 中间证书链（PEM）
    pub certificate: Vec<u8>,
    pub private_key: Vec<u8>,
    /// 中间证书链（PEM）
    pub issuer_certificate: Vec<u8>,
    /// CSR（PEM）
    pub csr: Vec<u8>,
}

/// 已注册账户的 ACME 客户端
#[async_trait]
pub trait AcmeClient: Send + Sync {
    /// 注册使用的邮箱
    fn email(&self) -> &str;

    /// CA 返回的账户标识
    fn registration(&self) -> &str;

    /// 为新订单签发证书，私钥由客户端为本订单新生成
    async fn obtain(
        &self,
        request: ObtainRequest,
        solver: Arc<dyn Dns01Solver>,
    ) -> CoreResult<CertificateBundle>;

    /// 续期：沿用已有证书的域名和私钥重新下单
    async fn renew(
        &self,
        existing: &CertificateBundle,
        solver: Arc<dyn Dns01Solver>,
    ) -> CoreResult<CertificateBundle>;
}

/// ACME 客户端工厂
#[async_trait]
pub trait AcmeEngine: Send + Sync {
    /// 以 `email` 注册（同意服务条款）并返回客户端
    async fn new_client(&self, email: &str) -> CoreResult<Arc<dyn AcmeClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_rsa_and_distinct() {
        let first = generate_key_pair().unwrap();
        let second = generate_key_pair().unwrap();

        assert_eq!(first.algorithm(), &PKCS_RSA_SHA256);
        assert_ne!(first.serialize_pem(), second.serialize_pem());

        // PEM 可以重新载入并识别为 RSA
        let reloaded = KeyPair::from_pem(&first.serialize_pem()).unwrap();
        assert_eq!(reloaded.algorithm(), &PKCS_RSA_SHA256);
    }
}
