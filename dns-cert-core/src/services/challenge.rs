//! DNS-01 Challenge Bridge
//!
//! 把 ACME 引擎的 `present` / `cleanup` 回调翻译成 `RecordProvider` 上的 TXT 记录操作。
//!
//! - 托管域名：TXT 记录直接写在域名所在 zone 的 `_acme-challenge[.sub]` 主机记录上。
//! - 委派域名：用户把 `_acme-challenge.<domain>` CNAME 到
//!   `<sha256(domain) 前 5 位>.<apply_domain>`，TXT 记录写在 apply 域名下。

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hickory_resolver::TokioResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::RecordType;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use dns_cert_provider::{DnsSearch, DomainRecord, RecordProvider};

use crate::acme::Dns01Solver;
use crate::error::{CoreError, CoreResult};
use crate::services::task::TaskLogger;
use crate::traits::normalize_name;

/// 挑战记录的主机名前缀
pub const CHALLENGE_LABEL: &str = "_acme-challenge";

/// 委派主机名取 sha256 十六进制的前几位
const DELEGATION_HOST_LEN: usize = 5;

/// 一次 DNS-01 挑战对应的 TXT 记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRecord {
    /// `_acme-challenge.<domain>.`
    pub fqdn: String,
    /// `base64url(sha256(key_auth))`，无填充
    pub value: String,
}

/// 计算挑战记录
pub fn challenge_record(domain: &str, key_auth: &str) -> ChallengeRecord {
    let domain = domain.trim_end_matches('.');
    ChallengeRecord {
        fqdn: format!("{CHALLENGE_LABEL}.{domain}."),
        value: URL_SAFE_NO_PAD.encode(Sha256::digest(key_auth.as_bytes())),
    }
}

/// 委派记录在 apply 域名下的主机名
pub fn delegation_host(domain: &str) -> String {
    let digest = hex::encode(Sha256::digest(domain.as_bytes()));
    digest[..DELEGATION_HOST_LEN].to_string()
}

/// FQDN 去掉 zone 后缀后的主机记录；不在 zone 内时返回 `None`
fn relative_host(fqdn: &str, zone: &str) -> Option<String> {
    let fqdn = normalize_name(fqdn);
    let zone = normalize_name(zone);
    fqdn.strip_suffix(&zone)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

/// 比较两个域名，忽略大小写和末尾的根点
pub fn names_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// 委派域名需要用户添加的 CNAME 记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CnameInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub domain: String,
    pub full_domain_name: String,
    /// CNAME 目标
    pub value: String,
}

/// 为一组域名生成 CNAME 委派说明
pub fn cname_delegation_info(domains: &[String], apply_domain: &str) -> Vec<CnameInfo> {
    let apply_domain = apply_domain.trim_end_matches('.');
    domains
        .iter()
        .map(|domain| CnameInfo {
            name: CHALLENGE_LABEL.to_string(),
            record_type: "cname".to_string(),
            domain: domain.clone(),
            full_domain_name: format!("{CHALLENGE_LABEL}.{domain}"),
            value: format!("{}.{apply_domain}", delegation_host(domain)),
        })
        .collect()
}

/// CNAME 委派校验
#[async_trait]
pub trait CnameVerifier: Send + Sync {
    /// 查询 `name` 的 CNAME 目标，没有记录时返回空列表
    async fn lookup_cname(&self, name: &str) -> CoreResult<Vec<String>>;

    /// `full_domain_name` 是否 CNAME 到了 `value`
    async fn verify(&self, info: &CnameInfo) -> CoreResult<bool> {
        let targets = self.lookup_cname(&info.full_domain_name).await?;
        Ok(targets.iter().any(|t| names_equal(t, &info.value)))
    }
}

/// 基于 hickory-resolver 的校验器，使用系统 DNS 配置
pub struct HickoryCnameVerifier {
    resolver: TokioResolver,
}

impl HickoryCnameVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolver: build_system_resolver(),
        }
    }
}

impl Default for HickoryCnameVerifier {
    fn default() -> Self {
        Self::new()
    }
}

fn build_system_resolver() -> TokioResolver {
    match TokioResolver::builder_tokio() {
        Ok(builder) => return builder.build(),
        Err(e) => {
            log::warn!("Failed to load system DNS configuration, falling back to defaults: {e}");
        }
    }

    TokioResolver::builder_with_config(
        ResolverConfig::default(),
        TokioConnectionProvider::default(),
    )
    .with_options(ResolverOpts::default())
    .build()
}

#[async_trait]
impl CnameVerifier for HickoryCnameVerifier {
    async fn lookup_cname(&self, name: &str) -> CoreResult<Vec<String>> {
        match self.resolver.lookup(name, RecordType::CNAME).await {
            Ok(response) => Ok(response
                .record_iter()
                .filter_map(|record| record.data().as_cname())
                .map(|cname| cname.0.to_string().trim_end_matches('.').to_string())
                .collect()),
            Err(e) => {
                log::debug!("CNAME lookup for {name} failed: {e}");
                Ok(Vec::new())
            }
        }
    }
}

/// 委派记录所在的 apply 域名
#[derive(Clone)]
pub struct ApplyDomain {
    pub provider: Arc<dyn RecordProvider>,
    pub domain_id: String,
    pub domain_name: String,
}

#[derive(Clone)]
struct OwnedZone {
    provider: Arc<dyn RecordProvider>,
    domain_id: String,
    zone: String,
}

/// TXT 记录最终落在哪里
struct Placement<'a> {
    provider: &'a Arc<dyn RecordProvider>,
    domain_id: &'a str,
    zone: &'a str,
    host: String,
}

/// Challenge Bridge
///
/// 每个证书请求创建一个，只持有目标域名与对应的 Provider。
#[derive(Clone, Default)]
pub struct ChallengeBridge {
    owned: Vec<OwnedZone>,
    delegated: HashSet<String>,
    apply: Option<ApplyDomain>,
    logger: Option<TaskLogger>,
}

impl ChallengeBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个托管 zone
    #[must_use]
    pub fn with_owned_zone(
        mut self,
        provider: Arc<dyn RecordProvider>,
        zone: impl Into<String>,
        domain_id: impl Into<String>,
    ) -> Self {
        self.owned.push(OwnedZone {
            provider,
            domain_id: domain_id.into(),
            zone: zone.into(),
        });
        self
    }

    /// 标记一个通过 CNAME 委派的域名
    #[must_use]
    pub fn with_delegated(mut self, domain: &str) -> Self {
        self.delegated.insert(normalize_name(domain));
        self
    }

    #[must_use]
    pub fn with_apply_domain(mut self, apply: ApplyDomain) -> Self {
        self.apply = Some(apply);
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: TaskLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    fn locate(&self, domain: &str, fqdn: &str) -> CoreResult<Placement<'_>> {
        let name = normalize_name(domain);
        if self.delegated.contains(&name) {
            let apply = self.apply.as_ref().ok_or_else(|| {
                CoreError::challenge(domain, "delegated domain but no apply domain configured")
            })?;
            return Ok(Placement {
                provider: &apply.provider,
                domain_id: &apply.domain_id,
                zone: &apply.domain_name,
                host: delegation_host(&name),
            });
        }

        // 最长后缀匹配，子域名优先落在更具体的 zone 上
        self.owned
            .iter()
            .filter_map(|z| relative_host(fqdn, &z.zone).map(|host| (z, host)))
            .max_by_key(|(z, _)| z.zone.len())
            .map(|(z, host)| Placement {
                provider: &z.provider,
                domain_id: &z.domain_id,
                zone: &z.zone,
                host,
            })
            .ok_or_else(|| CoreError::challenge(domain, "domain is not managed by any account"))
    }

    async fn log_info(&self, message: &str) {
        match &self.logger {
            Some(logger) => logger.info(message).await,
            None => log::info!("{message}"),
        }
    }
}

#[async_trait]
impl Dns01Solver for ChallengeBridge {
    async fn present(&self, domain: &str, _token: &str, key_auth: &str) -> CoreResult<()> {
        let record = challenge_record(domain, key_auth);
        let placement = self.locate(domain, &record.fqdn)?;

        self.log_info(&format!(
            "present TXT {}.{} via {}",
            placement.host,
            placement.zone,
            placement.provider.id()
        ))
        .await;

        let txt = DomainRecord::txt(
            placement.domain_id,
            placement.zone,
            placement.host.as_str(),
            record.value.as_str(),
        );
        placement
            .provider
            .add_record(&txt)
            .await
            .map_err(|e| CoreError::challenge(domain, format!("add TXT record: {e}")))?;
        Ok(())
    }

    async fn cleanup(&self, domain: &str, _token: &str, key_auth: &str) -> CoreResult<()> {
        let record = challenge_record(domain, key_auth);
        let placement = self.locate(domain, &record.fqdn)?;

        let search = DnsSearch::for_domain(placement.domain_id, placement.zone)
            .with_host(placement.host.as_str())
            .with_type("TXT");
        let records = placement
            .provider
            .get_record_list(&search)
            .await
            .map_err(|e| CoreError::challenge(domain, format!("list TXT records: {e}")))?;

        let mut first_error = None;
        for existing in records.iter().filter(|r| {
            r.is_type("TXT")
                && r.value == record.value
                && r.record_name.eq_ignore_ascii_case(&placement.host)
        }) {
            self.log_info(&format!(
                "cleanup TXT {}.{} ({})",
                placement.host, placement.zone, existing.id
            ))
            .await;
            if let Err(e) = placement
                .provider
                .delete_record(placement.zone, &existing.id)
                .await
            {
                log::warn!("Failed to delete TXT record {}: {e}", existing.id);
                first_error.get_or_insert_with(|| {
                    CoreError::challenge(domain, format!("delete TXT record: {e}"))
                });
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
