//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use dns_cert_core::services::{SessionManager, TaskReceivers, TaskService};
use dns_cert_core::test_utils::{
    MockAcmeEngine, MockCnameVerifier, MockRecordProvider, TEST_APPLY_ACCOUNT,
    create_test_context_with,
};
use dns_cert_core::types::{Domain, DomainInfo};
use dns_cert_core::{ProviderRegistry, ServiceContext};

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(res.is_ok(), "{}: {res:?}", format_args!($($msg)+));
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 一套完整的流水线测试环境
pub struct Harness {
    pub ctx: Arc<ServiceContext>,
    pub engine: Arc<MockAcmeEngine>,
    pub verifier: Arc<MockCnameVerifier>,
    /// 账户 `main` 的服务商，托管 `example.com`
    pub main: Arc<MockRecordProvider>,
    /// apply 账户的服务商
    pub apply: Arc<MockRecordProvider>,
    pub service: Arc<TaskService>,
    pub receivers: Option<TaskReceivers>,
}

impl Harness {
    pub async fn new(base: &Path) -> Self {
        let verifier = Arc::new(MockCnameVerifier::new());
        let ctx = create_test_context_with(base, Arc::clone(&verifier));

        let main = Arc::new(MockRecordProvider::new());
        let apply = Arc::new(MockRecordProvider::new());
        ctx.provider_registry
            .register("main".to_string(), main.clone())
            .await;
        ctx.provider_registry
            .register(TEST_APPLY_ACCOUNT.to_string(), apply.clone())
            .await;

        let zone = Domain::from_provider(
            DomainInfo {
                id: "42".into(),
                name: "example.com".into(),
                ..DomainInfo::default()
            },
            "main",
        );
        ctx.domain_repository
            .upsert_domain(&zone)
            .await
            .expect("seed zone");

        let engine = Arc::new(MockAcmeEngine::new());
        let session = Arc::new(SessionManager::new(
            engine.clone(),
            ctx.certificate_config.email_list.clone(),
            ctx.certificate_config.max_requests,
        ));
        let (service, receivers) = TaskService::new(Arc::clone(&ctx), session);

        Self {
            ctx,
            engine,
            verifier,
            main,
            apply,
            service: Arc::new(service),
            receivers: Some(receivers),
        }
    }

    /// 关闭队列并运行工作池直到所有已提交任务结束
    pub async fn drain(&mut self) {
        use dns_cert_core::services::WorkerPool;

        let receivers = self.receivers.take().expect("receivers already consumed");
        self.service.close().await;
        WorkerPool::start(Arc::clone(&self.service), receivers, 3)
            .join()
            .await;
    }
}
