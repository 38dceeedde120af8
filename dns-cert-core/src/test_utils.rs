//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dns_cert_provider::{
    DnsSearch, DomainInfo, DomainList, DomainRecord, DomainsSearch, ProviderError, ProviderType,
    RecordProvider, RecordStatus,
};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use tokio::sync::{Mutex, RwLock};

use crate::acme::{
    AcmeClient, AcmeEngine, CertificateBundle, Dns01Solver, ObtainRequest, generate_key_pair,
};
use crate::config::{CertificateConfig, LETS_ENCRYPT_STAGING};
use crate::error::{CoreError, CoreResult};
use crate::services::{CnameVerifier, ServiceContext};
use crate::traits::{
    InMemoryCertificateRepository, InMemoryDomainRepository, InMemoryProviderRegistry,
};

/// 测试上下文中 apply 账户与域名
pub const TEST_APPLY_ACCOUNT: &str = "apply";
pub const TEST_APPLY_DOMAIN_ID: &str = "apply-id";
pub const TEST_APPLY_DOMAIN: &str = "proxy.example.net";

// ===== MockRecordProvider =====

type Result<T> = std::result::Result<T, ProviderError>;

/// 内存中的 DNS 服务商
pub struct MockRecordProvider {
    records: RwLock<Vec<DomainRecord>>,
    domains: RwLock<Vec<DomainInfo>>,
    next_id: AtomicU64,
    /// 如果 Some，下一次 add_record 返回此错误
    add_error: RwLock<Option<String>>,
}

impl Default for MockRecordProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRecordProvider {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            domains: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            add_error: RwLock::new(None),
        }
    }

    /// 当前全部记录
    pub async fn records(&self) -> Vec<DomainRecord> {
        self.records.read().await.clone()
    }

    /// 直接写入一条记录，返回分配的 ID
    pub async fn seed(&self, mut record: DomainRecord) -> String {
        record.id = self.allocate_id();
        let id = record.id.clone();
        self.records.write().await.push(record);
        id
    }

    pub async fn add_domain(&self, info: DomainInfo) {
        self.domains.write().await.push(info);
    }

    pub async fn fail_next_add(&self, message: &str) {
        *self.add_error.write().await = Some(message.to_string());
    }

    fn allocate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    fn not_found(record_id: &str) -> ProviderError {
        ProviderError::RecordNotFound {
            provider: "mock".to_string(),
            record_id: record_id.to_string(),
            raw_message: None,
        }
    }

    async fn find(&self, domain_name: &str, record_id: &str) -> Result<DomainRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id == record_id && r.domain_name.eq_ignore_ascii_case(domain_name))
            .cloned()
            .ok_or_else(|| Self::not_found(record_id))
    }
}

#[async_trait]
impl RecordProvider for MockRecordProvider {
    fn id(&self) -> &'static str {
        "mock"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Cloudflare
    }

    async fn get_domain_list(&self, search: &DomainsSearch) -> Result<DomainList> {
        let matched: Vec<DomainInfo> = self
            .domains
            .read()
            .await
            .iter()
            .filter(|d| search.keyword.is_empty() || d.name.contains(&search.keyword))
            .cloned()
            .collect();

        let page = search.page.max(1);
        let page_size = if search.page_size == 0 { 20 } else { search.page_size };
        let start = ((page - 1) * page_size) as usize;
        let domains = matched
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(DomainList {
            domains,
            page,
            page_size,
            total: u32::try_from(matched.len()).unwrap(),
            dns_from: Some(self.provider_type()),
        })
    }

    async fn get_record_list(&self, search: &DnsSearch) -> Result<Vec<DomainRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.domain_name.eq_ignore_ascii_case(&search.domain_name))
            .filter(|r| {
                search.rr_keyword.is_empty() || r.record_name.eq_ignore_ascii_case(&search.rr_keyword)
            })
            .filter(|r| search.type_keyword.is_empty() || r.is_type(&search.type_keyword))
            .cloned()
            .collect())
    }

    async fn add_record(&self, record: &DomainRecord) -> Result<DomainRecord> {
        if let Some(message) = self.add_error.write().await.take() {
            return Err(ProviderError::Unknown {
                provider: "mock".to_string(),
                raw_code: None,
                raw_message: message,
            });
        }
        let mut record = record.clone();
        record.id = self.allocate_id();
        record.status = Some(RecordStatus::Enable);
        record.dns_from = Some(self.provider_type());
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_record(&self, record: &DomainRecord) -> Result<DomainRecord> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| Self::not_found(&record.id))?;
        *slot = record.clone();
        Ok(record.clone())
    }

    async fn delete_record(&self, domain_name: &str, record_id: &str) -> Result<DomainRecord> {
        let existing = self.find(domain_name, record_id).await?;
        self.records.write().await.retain(|r| r.id != record_id);
        Ok(existing)
    }

    async fn set_record_status(
        &self,
        domain_name: &str,
        record_id: &str,
        status: RecordStatus,
    ) -> Result<DomainRecord> {
        let mut record = self.find(domain_name, record_id).await?;
        record.status = Some(status);
        self.update_record(&record).await
    }

    async fn get_record_info(&self, domain_name: &str, record_id: &str) -> Result<DomainRecord> {
        self.find(domain_name, record_id).await
    }
}

// ===== MockCnameVerifier =====

/// 预设 CNAME 结果的校验器
#[derive(Default)]
pub struct MockCnameVerifier {
    entries: RwLock<HashMap<String, Vec<String>>>,
}

impl MockCnameVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, name: &str, target: &str) {
        self.entries
            .write()
            .await
            .entry(name.trim_end_matches('.').to_ascii_lowercase())
            .or_default()
            .push(target.to_string());
    }
}

#[async_trait]
impl CnameVerifier for MockCnameVerifier {
    async fn lookup_cname(&self, name: &str) -> CoreResult<Vec<String>> {
        let key = name.trim_end_matches('.').to_ascii_lowercase();
        Ok(self.entries.read().await.get(&key).cloned().unwrap_or_default())
    }
}

// ===== NoopSolver =====

pub struct NoopSolver;

#[async_trait]
impl Dns01Solver for NoopSolver {
    async fn present(&self, _domain: &str, _token: &str, _key_auth: &str) -> CoreResult<()> {
        Ok(())
    }

    async fn cleanup(&self, _domain: &str, _token: &str, _key_auth: &str) -> CoreResult<()> {
        Ok(())
    }
}

// ===== MockAcmeEngine =====

#[derive(Debug, Clone, Default)]
enum Behavior {
    #[default]
    Succeed,
    Fail(String),
    Panic,
}

#[derive(Default)]
struct EngineState {
    behavior: Behavior,
    registered: Vec<String>,
    issued: HashMap<String, usize>,
    /// `(domain, key_auth)`，按 present 顺序
    presented: Vec<(String, String)>,
    cleaned: Vec<(String, String)>,
}

/// 不访问网络的 ACME 引擎，签发自签名证书并照常驱动 solver
#[derive(Default)]
pub struct MockAcmeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl MockAcmeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn succeed(&self) {
        self.state.lock().await.behavior = Behavior::Succeed;
    }

    pub async fn fail_with(&self, message: &str) {
        self.state.lock().await.behavior = Behavior::Fail(message.to_string());
    }

    pub async fn panic_on_issue(&self) {
        self.state.lock().await.behavior = Behavior::Panic;
    }

    /// 依次注册过的邮箱
    pub async fn registered(&self) -> Vec<String> {
        self.state.lock().await.registered.clone()
    }

    pub async fn issued_per_email(&self) -> HashMap<String, usize> {
        self.state.lock().await.issued.clone()
    }

    pub async fn presented(&self) -> Vec<(String, String)> {
        self.state.lock().await.presented.clone()
    }

    pub async fn cleaned(&self) -> Vec<(String, String)> {
        self.state.lock().await.cleaned.clone()
    }
}

#[async_trait]
impl AcmeEngine for MockAcmeEngine {
    async fn new_client(&self, email: &str) -> CoreResult<Arc<dyn AcmeClient>> {
        let mut state = self.state.lock().await;
        state.registered.push(email.to_string());
        let registration = format!("https://acme.test/acct/{}", state.registered.len());
        Ok(Arc::new(MockAcmeClient {
            email: email.to_string(),
            registration,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockAcmeClient {
    email: String,
    registration: String,
    state: Arc<Mutex<EngineState>>,
}

impl MockAcmeClient {
    async fn issue(
        &self,
        domains: &[String],
        key_pem: &str,
        solver: &dyn Dns01Solver,
    ) -> CoreResult<CertificateBundle> {
        let behavior = self.state.lock().await.behavior.clone();
        if let Behavior::Panic = behavior {
            panic!("mock acme engine exploded");
        }

        let mut presented = Vec::new();
        let mut validated = Ok(());
        for (i, name) in domains.iter().enumerate() {
            let domain = name.strip_prefix("*.").unwrap_or(name).to_string();
            let token = format!("token-{i}");
            let key_auth = format!("{token}.mock-thumbprint");
            if let Err(e) = solver.present(&domain, &token, &key_auth).await {
                validated = Err(e);
                break;
            }
            self.state
                .lock()
                .await
                .presented
                .push((domain.clone(), key_auth.clone()));
            presented.push((domain, token, key_auth));
        }

        for (domain, token, key_auth) in &presented {
            let _ = solver.cleanup(domain, token, key_auth).await;
            self.state
                .lock()
                .await
                .cleaned
                .push((domain.clone(), key_auth.clone()));
        }
        validated?;

        if let Behavior::Fail(message) = behavior {
            return Err(CoreError::Acme(message));
        }

        let bundle = self_signed_bundle(domains, key_pem);
        *self
            .state
            .lock()
            .await
            .issued
            .entry(self.email.clone())
            .or_default() += 1;
        Ok(bundle)
    }
}

#[async_trait]
impl AcmeClient for MockAcmeClient {
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
        self.issue(&request.domains, "", solver.as_ref()).await
    }

    async fn renew(
        &self,
        existing: &CertificateBundle,
        solver: Arc<dyn Dns01Solver>,
    ) -> CoreResult<CertificateBundle> {
        let key_pem = String::from_utf8_lossy(&existing.private_key).into_owned();
        self.issue(&existing.domains, &key_pem, solver.as_ref())
            .await
    }
}

/// 用给定私钥（为空则新生成 RSA-2048）签一张自签名证书
pub fn self_signed_bundle(domains: &[String], key_pem: &str) -> CertificateBundle {
    let key = if key_pem.is_empty() {
        generate_key_pair().unwrap()
    } else {
        KeyPair::from_pem(key_pem).unwrap()
    };
    let primary = domains.first().cloned().unwrap_or_default();

    let mut params = CertificateParams::new(domains.to_vec()).unwrap();
    params.distinguished_name = DistinguishedName::new();
    params
        .distinguished_name
        .push(DnType::CommonName, primary.as_str());
    let certificate = params.self_signed(&key).unwrap();

    let issuer_key = KeyPair::generate().unwrap();
    let issuer = CertificateParams::new(vec!["issuer.test".to_string()])
        .unwrap()
        .self_signed(&issuer_key)
        .unwrap();

    CertificateBundle {
        domain: primary,
        domains: domains.to_vec(),
        certificate: certificate.pem().into_bytes(),
        private_key: key.serialize_pem().into_bytes(),
        issuer_certificate: issuer.pem().into_bytes(),
        csr: Vec::new(),
    }
}

// ===== Context =====

pub fn test_certificate_config(base: &Path) -> CertificateConfig {
    CertificateConfig {
        email_list: vec!["test@example.com".to_string()],
        max_requests: 10,
        save_path: base.to_path_buf(),
        apply_account: TEST_APPLY_ACCOUNT.to_string(),
        apply_domain_id: TEST_APPLY_DOMAIN_ID.to_string(),
        apply_domain_name: TEST_APPLY_DOMAIN.to_string(),
        concurrency: 3,
        directory_url: LETS_ENCRYPT_STAGING.to_string(),
    }
}

/// 创建测试用的 ServiceContext（内存仓库 + 空注册表）
pub fn create_test_context(base: &Path) -> Arc<ServiceContext> {
    create_test_context_with(base, Arc::new(MockCnameVerifier::new()))
}

pub fn create_test_context_with(
    base: &Path,
    verifier: Arc<MockCnameVerifier>,
) -> Arc<ServiceContext> {
    Arc::new(ServiceContext::new(
        test_certificate_config(base),
        Arc::new(InMemoryProviderRegistry::new().with_apply_account(TEST_APPLY_ACCOUNT)),
        Arc::new(InMemoryDomainRepository::new()),
        Arc::new(InMemoryCertificateRepository::new()),
        verifier,
    ))
}
