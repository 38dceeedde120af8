//! `instant-acme` 引擎实现

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use instant_acme::{
    Account, AuthorizationStatus, ChallengeType, Identifier, NewAccount, NewOrder, Order,
    OrderStatus, RetryPolicy,
};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};

use super::{
    AcmeClient, AcmeEngine, CertificateBundle, Dns01Solver, HickoryTxtLookup, ObtainRequest,
    PropagationChecker, PropagationConfig, generate_key_pair,
};
use crate::error::{CoreError, CoreResult};
use crate::services::certificate::parse_certificate;

/// 等待 CA 校验 / 签发的默认超时
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// ACME engine backed by `instant-acme`
#[derive(Clone)]
pub struct InstantAcmeEngine {
    directory_url: String,
    timeout: Duration,
    propagation: PropagationChecker,
}

impl InstantAcmeEngine {
    #[must_use]
    pub fn new(directory_url: impl Into<String>) -> Self {
        Self {
            directory_url: directory_url.into(),
            timeout: DEFAULT_TIMEOUT,
            propagation: PropagationChecker::new(
                PropagationConfig::default(),
                Arc::new(HickoryTxtLookup::new()),
            ),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 替换 TXT 传播检查
    #[must_use]
    pub fn with_propagation(mut self, propagation: PropagationChecker) -> Self {
        self.propagation = propagation;
        self
    }
}

#[async_trait]
impl AcmeEngine for InstantAcmeEngine {
    async fn new_client(&self, email: &str) -> CoreResult<Arc<dyn AcmeClient>> {
        let contact = format!("mailto:{email}");
        let new_account = NewAccount {
            contact: &[contact.as_str()],
            terms_of_service_agreed: true,
            only_return_existing: false,
        };

        let (account, _credentials) = Account::builder()?
            .create(&new_account, self.directory_url.clone(), None)
            .await?;
        let registration = account.id().to_string();
        log::info!("[acme] registered {email} as {registration}");

        Ok(Arc::new(InstantAcmeClient {
            email: email.to_string(),
            registration,
            account,
            timeout: self.timeout,
            propagation: self.propagation.clone(),
        }))
    }
}

/// 已发布、需要清理的挑战
struct PresentedChallenge {
    domain: String,
    token: String,
    key_auth: String,
}

struct InstantAcmeClient {
    email: String,
    registration: String,
    account: Account,
    timeout: Duration,
    propagation: PropagationChecker,
}

impl InstantAcmeClient {
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new().timeout(self.timeout)
    }

    /// 下单 → 完成挑战 → 清理 → 提交 CSR → 下载证书链
    async fn issue(
        &self,
        domains: &[String],
        key: &KeyPair,
        solver: &dyn Dns01Solver,
    ) -> CoreResult<CertificateBundle> {
        let primary = domains
            .first()
            .ok_or_else(|| CoreError::ValidationError("order has no identifiers".to_string()))?;

        let identifiers: Vec<Identifier> = domains
            .iter()
            .map(|d| Identifier::Dns(d.clone()))
            .collect();
        let mut order = self.account.new_order(&NewOrder::new(&identifiers)).await?;

        let mut presented = Vec::new();
        let validated = self.validate(&mut order, solver, &mut presented).await;
        for challenge in &presented {
            if let Err(e) = solver
                .cleanup(&challenge.domain, &challenge.token, &challenge.key_auth)
                .await
            {
                log::warn!("[acme] cleanup for {} failed: {e}", challenge.domain);
            }
        }
        validated?;

        let mut params = CertificateParams::new(domains.to_vec())
            .map_err(|e| CoreError::Acme(format!("Failed to create CSR params: {e}")))?;
        params.distinguished_name = DistinguishedName::new();
        params
            .distinguished_name
            .push(DnType::CommonName, primary.as_str());
        let csr = params
            .serialize_request(key)
            .map_err(|e| CoreError::Acme(format!("Failed to serialize CSR: {e}")))?;
        let csr_pem = csr
            .pem()
            .map_err(|e| CoreError::Acme(format!("Failed to encode CSR: {e}")))?;

        order.finalize_csr(&csr.der().to_vec()).await?;
        let chain = order.poll_certificate(&self.retry_policy()).await?;
        log::info!("[acme] certificate issued for {}", domains.join(","));

        Ok(CertificateBundle {
            domain: primary.clone(),
            domains: domains.to_vec(),
            issuer_certificate: issuer_chain(&chain)?,
            certificate: chain.into_bytes(),
            private_key: key.serialize_pem().into_bytes(),
            csr: csr_pem.into_bytes(),
        })
    }

    async fn validate(
        &self,
        order: &mut Order,
        solver: &dyn Dns01Solver,
        presented: &mut Vec<PresentedChallenge>,
    ) -> CoreResult<()> {
        let mut authorizations = order.authorizations();
        while let Some(result) = authorizations.next().await {
            let mut authz = result?;

            let identifier = authz.identifier();
            let domain = match &identifier.identifier {
                Identifier::Dns(domain) => domain.clone(),
                other => {
                    return Err(CoreError::Acme(format!(
                        "unsupported identifier: {other:?}"
                    )));
                }
            };

            match authz.status {
                AuthorizationStatus::Valid => {
                    log::debug!("[acme] authorization for {domain} already valid");
                    continue;
                }
                AuthorizationStatus::Pending => {}
                status => {
                    return Err(CoreError::Acme(format!(
                        "authorization for {domain} is {status:?}"
                    )));
                }
            }

            let mut challenge = authz.challenge(ChallengeType::Dns01).ok_or_else(|| {
                CoreError::Acme(format!("no DNS-01 challenge offered for {domain}"))
            })?;
            let key_auth = challenge.key_authorization().as_str().to_string();
            let token = challenge.token.clone();

            solver.present(&domain, &token, &key_auth).await?;
            presented.push(PresentedChallenge {
                domain: domain.clone(),
                token,
                key_auth: key_auth.clone(),
            });
            // 记录可解析后再通知 CA
            self.propagation.wait_for(&domain, &key_auth).await?;
            challenge.set_ready().await?;
        }

        match order.poll_ready(&self.retry_policy()).await? {
            OrderStatus::Ready => Ok(()),
            status => Err(CoreError::Acme(format!("order is {status:?}, expected ready"))),
        }
    }
}

#[async_trait]
impl AcmeClient for InstantAcmeClient {
    fn email(&self) -> &str {
        &self.email
    }

    fn registration(&self) -> &str {
        &self.registration
    }

    async fn obtain(
        &self,
        request: ObtainRequest,
        solver: Arc<dyn Dns01Solver>,
    ) -> CoreResult<CertificateBundle> {
        let key = generate_key_pair()?;
        self.issue(&request.domains, &key, solver.as_ref()).await
    }

    async fn renew(
        &self,
        existing: &CertificateBundle,
        solver: Arc<dyn Dns01Solver>,
    ) -> CoreResult<CertificateBundle> {
        let domains = if existing.domains.is_empty() {
            parse_certificate(&existing.certificate)?.domain_list
        } else {
            existing.domains.clone()
        };

        let key = if existing.private_key.is_empty() {
            generate_key_pair()?
        } else {
            let pem = String::from_utf8_lossy(&existing.private_key);
            KeyPair::from_pem(&pem)
                .map_err(|e| CoreError::Acme(format!("invalid private key: {e}")))?
        };

        self.issue(&domains, &key, solver.as_ref()).await
    }
}

/// 证书链中叶子证书之后的部分
fn issuer_chain(chain: &str) -> CoreResult<Vec<u8>> {
    let blocks = pem::parse_many(chain).map_err(|e| CoreError::CertificateParse(e.to_string()))?;
    let issuers: Vec<pem::Pem> = blocks.into_iter().skip(1).collect();
    if issuers.is_empty() {
        return Ok(Vec::new());
    }
    Ok(pem::encode_many(&issuers).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn self_signed(name: &str) -> String {
        let key = KeyPair::generate().unwrap();
        CertificateParams::new(vec![name.to_string()])
            .unwrap()
            .self_signed(&key)
            .unwrap()
            .pem()
    }

    #[test]
    fn issuer_chain_skips_leaf() {
        let leaf = self_signed("leaf.example.com");
        let intermediate = self_signed("ca.example.com");
        let chain = format!("{leaf}{intermediate}");

        let issuer = String::from_utf8(issuer_chain(&chain).unwrap()).unwrap();
        let blocks = pem::parse_many(&issuer).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0], pem::parse(&intermediate).unwrap());
    }

    #[test]
    fn single_certificate_has_empty_issuer() {
        let leaf = self_signed("leaf.example.com");
        assert!(issuer_chain(&leaf).unwrap().is_empty());
    }

    #[tokio::test]
    async fn engine_defaults() {
        let engine = InstantAcmeEngine::new(crate::config::LETS_ENCRYPT_STAGING)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(engine.timeout, Duration::from_secs(5));
        assert_eq!(engine.directory_url, crate::config::LETS_ENCRYPT_STAGING);
        assert_eq!(engine.propagation.config(), PropagationConfig::default());
    }
}
