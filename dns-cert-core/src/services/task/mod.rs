//! Issuance Task Pipeline
//!
//! `submit` 同步创建 `wait` 状态的证书与任务记录并入队；
//! 工作池取出负载后在独立的 tokio 任务中执行，执行结果（成功、失败或 panic）
//! 统一由 `process` 写入唯一一次终态。

mod logger;
mod pool;

pub use logger::TaskLogger;
pub use pool::{TaskReceivers, WorkerPool, WorkerSplit};

use std::any::Any;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::services::certificate::{CertificateStorage, parse_certificate};
use crate::services::challenge::{ApplyDomain, ChallengeBridge, cname_delegation_info};
use crate::services::session::SessionManager;
use crate::traits::normalize_name;
use crate::types::{
    Certificate, CertificateTask, Domain, IssueKind, IssueRequest, Priority, SubmittedTask,
    TaskPayload, TaskState,
};

/// 每个优先级一个队列
struct TaskQueues {
    critical: UnboundedSender<String>,
    default: UnboundedSender<String>,
    low: UnboundedSender<String>,
}

impl TaskQueues {
    fn sender(&self, priority: Priority) -> &UnboundedSender<String> {
        match priority {
            Priority::Critical => &self.critical,
            Priority::Default => &self.default,
            Priority::Low => &self.low,
        }
    }
}

/// ACME 订单中的域名：每个域名依次加入 `*.d` 与 `d`
pub fn acme_domain_list(domains: &[String]) -> Vec<String> {
    domains
        .iter()
        .flat_map(|d| [format!("*.{d}"), d.clone()])
        .collect()
}

/// 规范化请求中的域名：去空白、小写、去掉末尾的点与 `*.` 前缀，保序去重
fn normalize_domains<'a>(domains: impl IntoIterator<Item = &'a str>) -> CoreResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for raw in domains {
        let name = normalize_name(raw);
        let name = name.strip_prefix("*.").unwrap_or(&name).to_string();
        if name.is_empty() || name.contains(char::is_whitespace) || !name.contains('.') {
            return Err(CoreError::ValidationError(format!("invalid domain: {raw:?}")));
        }
        if seen.insert(name.clone()) {
            out.push(name);
        }
    }
    Ok(out)
}

/// 去重用的键：排序后的域名集合
fn in_flight_key(domains: &[String]) -> String {
    let mut names: Vec<String> = domains.iter().map(|d| normalize_name(d)).collect();
    names.sort();
    names.dedup();
    names.join(",")
}

/// `{base}/logs/{yyyy-mm-dd}/{task_id}.log`
pub fn task_log_path(base: &Path, task_id: &str) -> PathBuf {
    base.join("logs")
        .join(Local::now().format("%Y-%m-%d").to_string())
        .join(format!("{task_id}.log"))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 证书签发任务服务
pub struct TaskService {
    ctx: Arc<ServiceContext>,
    session: Arc<SessionManager>,
    queues: Mutex<Option<TaskQueues>>,
    in_flight: Mutex<HashSet<String>>,
}

impl TaskService {
    /// 创建服务与三个优先级队列的接收端，接收端交给 [`WorkerPool::start`]
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>, session: Arc<SessionManager>) -> (Self, TaskReceivers) {
        let (critical, critical_rx) = tokio::sync::mpsc::unbounded_channel();
        let (default, default_rx) = tokio::sync::mpsc::unbounded_channel();
        let (low, low_rx) = tokio::sync::mpsc::unbounded_channel();

        let service = Self {
            ctx,
            session,
            queues: Mutex::new(Some(TaskQueues {
                critical,
                default,
                low,
            })),
            in_flight: Mutex::new(HashSet::new()),
        };
        let receivers = TaskReceivers {
            critical: critical_rx,
            default: default_rx,
            low: low_rx,
        };
        (service, receivers)
    }

    /// 关闭队列，之后的 `submit` 返回 `QueueClosed`，工作池处理完剩余任务后退出
    pub async fn close(&self) {
        self.queues.lock().await.take();
    }

    /// 提交证书申请
    ///
    /// # Errors
    /// * `ValidationError` - 域名为空或不合法
    /// * `AccountNotFound` / `UnsupportedProvider` - 账户无法解析
    /// * `CertificateNotFound` - 续期的证书不存在
    /// * `DuplicateSubmission` - 相同域名集合的任务仍在执行
    /// * `QueueClosed` - 服务已关闭
    pub async fn submit(&self, request: IssueRequest) -> CoreResult<SubmittedTask> {
        let mut domains = normalize_domains(request.domains.iter().map(String::as_str))?;
        if let IssueKind::Renew { certificate_id } = &request.kind {
            let existing = self
                .ctx
                .certificate_repository
                .get_certificate_by_id(certificate_id)
                .await?
                .ok_or_else(|| CoreError::CertificateNotFound(certificate_id.clone()))?;
            if existing.state != TaskState::Success {
                return Err(CoreError::ValidationError(format!(
                    "certificate {certificate_id} has not been issued"
                )));
            }
            if domains.is_empty() {
                domains = normalize_domains(existing.domains())?;
            }
        }
        if domains.is_empty() {
            return Err(CoreError::ValidationError(
                "at least one domain is required".to_string(),
            ));
        }

        self.ctx.get_provider(&request.account).await?;

        let key = in_flight_key(&domains);
        if !self.in_flight.lock().await.insert(key.clone()) {
            return Err(CoreError::DuplicateSubmission(key));
        }

        match self.enqueue(&request, domains).await {
            Ok(submitted) => Ok(submitted),
            Err(e) => {
                self.in_flight.lock().await.remove(&key);
                Err(e)
            }
        }
    }

    async fn enqueue(
        &self,
        request: &IssueRequest,
        domains: Vec<String>,
    ) -> CoreResult<SubmittedTask> {
        let task_id = uuid::Uuid::new_v4().to_string();
        let log_path = task_log_path(self.ctx.storage.base(), &task_id);
        if let Some(parent) = log_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let certificate = Certificate::pending(&task_id);
        let task = CertificateTask::new(&task_id, &certificate.id, log_path.clone());
        self.ctx
            .certificate_repository
            .create_certificate_record(&certificate)
            .await?;
        self.ctx
            .certificate_repository
            .create_certificate_task(&task)
            .await?;

        let payload = TaskPayload {
            task_id: task_id.clone(),
            certificate_id: certificate.id.clone(),
            account: request.account.clone(),
            domains,
            kind: request.kind.clone(),
            log_path: log_path.clone(),
        };
        let raw = serde_json::to_string(&payload)?;

        let sent = match self.queues.lock().await.as_ref() {
            Some(queues) => queues.sender(request.priority).send(raw).is_ok(),
            None => false,
        };
        if !sent {
            self.mark_terminal(&payload, TaskState::Fail, "task queue is closed")
                .await;
            return Err(CoreError::QueueClosed(request.priority.to_string()));
        }

        log::info!(
            "Task {task_id} queued ({}) for {}",
            request.priority,
            payload.domains.join(",")
        );
        Ok(SubmittedTask {
            task_id,
            certificate_id: certificate.id,
            log_path,
            priority: request.priority,
        })
    }

    /// 处理队列中的原始负载
    pub(crate) async fn run_raw(self: &Arc<Self>, raw: &str) {
        match serde_json::from_str::<TaskPayload>(raw) {
            Ok(payload) => {
                self.process(payload).await;
            }
            Err(e) => log::error!("Dropping malformed task payload: {e}"),
        }
    }

    /// 执行任务并写入终态
    ///
    /// 执行体跑在单独的 tokio 任务里，panic 也会被记录为 `fail`。
    pub async fn process(self: &Arc<Self>, payload: TaskPayload) -> TaskState {
        let service = Arc::clone(self);
        let job = payload.clone();
        let outcome = tokio::spawn(async move { service.execute(&job).await }).await;

        let (state, result) = match outcome {
            Ok(Ok(())) => (TaskState::Success, String::new()),
            Ok(Err(e)) => (TaskState::Fail, e.to_string()),
            Err(join) if join.is_panic() => {
                let panic = join.into_panic();
                (TaskState::Fail, format!("task panicked: {}", panic_message(&*panic)))
            }
            Err(join) => (TaskState::Fail, format!("task aborted: {join}")),
        };

        if let Ok(logger) = TaskLogger::open(&payload.task_id, &payload.log_path).await {
            match state {
                TaskState::Success => logger.info("task finished: success").await,
                _ => logger.error(&format!("task finished: fail: {result}")).await,
            }
        }
        self.mark_terminal(&payload, state, &result).await;
        state
    }

    async fn mark_terminal(&self, payload: &TaskPayload, state: TaskState, result: &str) {
        let repo = &self.ctx.certificate_repository;

        match repo.get_certificate_task(&payload.task_id).await {
            Ok(Some(mut task)) => {
                task.state = state;
                task.result = result.to_string();
                if let Err(e) = repo.update_certificate_task(&task).await {
                    log::error!("Failed to finalize task {}: {e}", payload.task_id);
                }
            }
            Ok(None) => log::error!("Task {} vanished before finalizing", payload.task_id),
            Err(e) => log::error!("Failed to load task {}: {e}", payload.task_id),
        }

        match repo.get_certificate_by_id(&payload.certificate_id).await {
            Ok(Some(mut certificate)) => {
                certificate.state = state;
                if let Err(e) = repo.update_certificate_record(&certificate).await {
                    log::error!(
                        "Failed to finalize certificate {}: {e}",
                        payload.certificate_id
                    );
                }
            }
            Ok(None) => log::error!(
                "Certificate {} vanished before finalizing",
                payload.certificate_id
            ),
            Err(e) => log::error!(
                "Failed to load certificate {}: {e}",
                payload.certificate_id
            ),
        }

        self.in_flight
            .lock()
            .await
            .remove(&in_flight_key(&payload.domains));
    }

    async fn set_state(&self, payload: &TaskPayload, state: TaskState) -> CoreResult<()> {
        let repo = &self.ctx.certificate_repository;
        let mut task = repo
            .get_certificate_task(&payload.task_id)
            .await?
            .ok_or_else(|| CoreError::TaskNotFound(payload.task_id.clone()))?;
        task.state = state;
        repo.update_certificate_task(&task).await?;

        let mut certificate = self.load_certificate(&payload.certificate_id).await?;
        certificate.state = state;
        repo.update_certificate_record(&certificate).await
    }

    async fn load_certificate(&self, id: &str) -> CoreResult<Certificate> {
        self.ctx
            .certificate_repository
            .get_certificate_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CertificateNotFound(id.to_string()))
    }

    async fn execute(&self, payload: &TaskPayload) -> CoreResult<()> {
        let logger = TaskLogger::open(&payload.task_id, &payload.log_path).await?;
        self.set_state(payload, TaskState::Apply).await?;
        logger
            .info(&format!(
                "task started for {} (account {})",
                payload.domains.join(","),
                payload.account
            ))
            .await;

        let result = self.issue(payload, &logger).await;
        if let Err(e) = &result {
            logger.error(&e.to_string()).await;
        }
        result
    }

    async fn issue(&self, payload: &TaskPayload, logger: &TaskLogger) -> CoreResult<()> {
        let (bridge, owned) = self.build_bridge(payload, logger).await?;
        let solver = Arc::new(bridge);

        let bundle = match &payload.kind {
            IssueKind::Obtain => {
                self.session
                    .obtain(acme_domain_list(&payload.domains), solver)
                    .await?
            }
            IssueKind::Renew { certificate_id } => {
                let existing = self.load_certificate(certificate_id).await?;
                logger
                    .info(&format!(
                        "renewing certificate {certificate_id} from {}",
                        existing.save_path.display()
                    ))
                    .await;
                let mut bundle = CertificateStorage::load(&existing.save_path)
                    .await?
                    .to_bundle();
                if bundle.domains.is_empty() {
                    bundle.domains = acme_domain_list(&payload.domains);
                }
                self.session.renew(&bundle, solver).await?
            }
        };

        let resource = self.ctx.storage.save(&bundle).await?;
        logger
            .info(&format!(
                "certificate saved to {}",
                resource.save_path.display()
            ))
            .await;

        let parsed = parse_certificate(&bundle.certificate)?;
        let mut certificate = self.load_certificate(&payload.certificate_id).await?;
        certificate.save_path = resource.save_path;
        certificate.apply_parsed(parsed);
        self.ctx
            .certificate_repository
            .update_certificate_record(&certificate)
            .await?;

        for mut domain in owned {
            domain.certificate_id = Some(certificate.id.clone());
            self.ctx.domain_repository.upsert_domain(&domain).await?;
        }
        Ok(())
    }

    /// 托管 zone：从域名本身开始逐级向上查找仓库
    async fn find_zone(&self, domain: &str) -> CoreResult<Option<Domain>> {
        let mut candidate = domain;
        loop {
            if let Some(zone) = self
                .ctx
                .domain_repository
                .find_domain_by_name(candidate)
                .await?
            {
                return Ok(Some(zone));
            }
            match candidate.split_once('.') {
                Some((_, parent)) if parent.contains('.') => candidate = parent,
                _ => return Ok(None),
            }
        }
    }

    async fn build_bridge(
        &self,
        payload: &TaskPayload,
        logger: &TaskLogger,
    ) -> CoreResult<(ChallengeBridge, Vec<Domain>)> {
        let mut bridge = ChallengeBridge::new().with_logger(logger.clone());
        let mut owned: Vec<Domain> = Vec::new();
        let mut delegated = Vec::new();

        for domain in &payload.domains {
            match self.find_zone(domain).await? {
                Some(zone) => {
                    if owned.iter().any(|z| z.id == zone.id) {
                        continue;
                    }
                    let account = if zone.account_name.is_empty() {
                        payload.account.as_str()
                    } else {
                        zone.account_name.as_str()
                    };
                    let provider = self.ctx.get_provider(account).await?;
                    logger
                        .info(&format!(
                            "{domain}: zone {} via account {account}",
                            zone.domain_name
                        ))
                        .await;
                    bridge = bridge.with_owned_zone(provider, &zone.domain_name, &zone.id);
                    owned.push(zone);
                }
                None => delegated.push(domain.clone()),
            }
        }

        if delegated.is_empty() {
            return Ok((bridge, owned));
        }

        let config = &self.ctx.certificate_config;
        if !config.has_apply_domain() {
            return Err(CoreError::Config(format!(
                "{} not managed by any account and no apply domain is configured",
                delegated.join(",")
            )));
        }

        for info in cname_delegation_info(&delegated, &config.apply_domain_name) {
            if !self.ctx.cname_verifier.verify(&info).await? {
                return Err(CoreError::challenge(
                    &info.domain,
                    format!(
                        "CNAME {} must point to {}",
                        info.full_domain_name, info.value
                    ),
                ));
            }
            logger
                .info(&format!(
                    "{}: delegated via {}",
                    info.domain, info.value
                ))
                .await;
            bridge = bridge.with_delegated(&info.domain);
        }

        let apply = ApplyDomain {
            provider: self.ctx.provider_registry.apply_provider().await?,
            domain_id: config.apply_domain_id.clone(),
            domain_name: config.apply_domain_name.clone(),
        };
        Ok((bridge.with_apply_domain(apply), owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acme_list_adds_wildcards() {
        assert_eq!(
            acme_domain_list(&["example.com".into(), "example.org".into()]),
            ["*.example.com", "example.com", "*.example.org", "example.org"]
        );
    }

    #[test]
    fn domains_are_normalized() {
        let domains =
            normalize_domains(["Example.COM.", "*.example.com", " example.org "]).unwrap();
        assert_eq!(domains, ["example.com", "example.org"]);

        assert!(normalize_domains(["bad domain.com"]).is_err());
        assert!(normalize_domains(["localhost"]).is_err());
        assert!(normalize_domains([""]).is_err());
    }

    #[test]
    fn in_flight_key_ignores_order() {
        assert_eq!(
            in_flight_key(&["b.com".into(), "a.com".into()]),
            in_flight_key(&["A.com".into(), "b.com".into()])
        );
    }

    #[test]
    fn log_path_layout() {
        let path = task_log_path(Path::new("/data/certs"), "t-1");
        let today = Local::now().format("%Y-%m-%d").to_string();
        assert_eq!(
            path,
            PathBuf::from(format!("/data/certs/logs/{today}/t-1.log"))
        );
    }

    #[test]
    fn panic_payloads_are_readable() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*boxed), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*boxed), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }
}
