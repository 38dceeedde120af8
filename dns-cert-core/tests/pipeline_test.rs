//! 签发流水线集成测试
//!
//! 使用 mock 服务商与 mock ACME 引擎，覆盖提交、执行与终态写入。

mod common;

use common::Harness;
use dns_cert_core::CoreError;
use dns_cert_core::services::CertificateService;
use dns_cert_core::services::challenge::cname_delegation_info;
use dns_cert_core::test_utils::TEST_APPLY_DOMAIN;
use dns_cert_core::types::{IssueKind, IssueRequest, Priority, TaskState};

fn obtain(domains: &[&str]) -> IssueRequest {
    IssueRequest::obtain("main", domains.iter().map(|d| (*d).to_string()).collect())
}

#[tokio::test]
async fn owned_domain_is_issued() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new(dir.path()).await;
    let certs = CertificateService::new(harness.ctx.clone());

    let submitted = require_ok!(harness.service.submit(obtain(&["example.com"])).await);

    // 提交后立即可读到 wait 状态
    let task = require_ok!(certs.get_task(&submitted.task_id).await);
    assert_eq!(task.state, TaskState::Wait);
    assert_eq!(task.certificate_id, submitted.certificate_id);
    let pending = require_ok!(certs.get_certificate(&submitted.certificate_id).await);
    assert_eq!(pending.state, TaskState::Wait);

    harness.drain().await;

    let task = require_ok!(certs.get_task(&submitted.task_id).await);
    assert_eq!(task.state, TaskState::Success, "{}", task.result);
    assert!(task.result.is_empty());

    let cert = require_ok!(certs.get_certificate(&submitted.certificate_id).await);
    assert_eq!(cert.state, TaskState::Success);
    assert_eq!(cert.common_name, "*.example.com");
    assert!(cert.domains().contains(&"example.com"));
    assert!(cert.domains().contains(&"*.example.com"));
    assert!(cert.save_path.join("certificate.crt").exists());
    assert!(cert.save_path.ends_with("example.com"));

    // 两个挑战都已发布并清理
    let presented = harness.engine.presented().await;
    assert_eq!(presented.len(), 2);
    assert!(presented.iter().all(|(d, _)| d == "example.com"));
    assert!(harness.main.records().await.is_empty());

    let zone = require_some!(harness.ctx.domain_repository.get_domain_by_id("42").await.unwrap());
    assert_eq!(zone.certificate_id.as_deref(), Some(cert.id.as_str()));

    let log = require_ok!(certs.read_task_log(&submitted.task_id).await);
    assert!(log.contains("task finished: success"), "{log}");
    assert!(log.contains("present TXT _acme-challenge.example.com"), "{log}");
}

#[tokio::test]
async fn subdomain_lands_in_parent_zone() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new(dir.path()).await;

    let submitted = require_ok!(harness.service.submit(obtain(&["api.example.com"])).await);
    harness.drain().await;

    let certs = CertificateService::new(harness.ctx.clone());
    let task = require_ok!(certs.get_task(&submitted.task_id).await);
    assert_eq!(task.state, TaskState::Success, "{}", task.result);

    let log = require_ok!(certs.read_task_log(&submitted.task_id).await);
    assert!(log.contains("present TXT _acme-challenge.api.example.com"), "{log}");
}

#[tokio::test]
async fn engine_failure_marks_task_failed() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new(dir.path()).await;
    harness.engine.fail_with("rateLimited: too many certificates").await;

    let submitted = require_ok!(harness.service.submit(obtain(&["example.com"])).await);
    harness.drain().await;

    let certs = CertificateService::new(harness.ctx.clone());
    let task = require_ok!(certs.get_task(&submitted.task_id).await);
    assert_eq!(task.state, TaskState::Fail);
    assert!(task.result.contains("too many certificates"), "{}", task.result);

    let cert = require_ok!(certs.get_certificate(&submitted.certificate_id).await);
    assert_eq!(cert.state, TaskState::Fail);

    // 失败时挑战记录同样被清理
    assert!(harness.main.records().await.is_empty());
    assert_eq!(harness.engine.cleaned().await.len(), 2);
}

#[tokio::test]
async fn engine_panic_still_reaches_terminal_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new(dir.path()).await;
    harness.engine.panic_on_issue().await;

    let submitted = require_ok!(harness.service.submit(obtain(&["example.com"])).await);
    harness.drain().await;

    let certs = CertificateService::new(harness.ctx.clone());
    let task = require_ok!(certs.get_task(&submitted.task_id).await);
    assert_eq!(task.state, TaskState::Fail);
    assert!(task.result.contains("panicked"), "{}", task.result);
    assert!(task.result.contains("mock acme engine exploded"), "{}", task.result);

    let cert = require_ok!(certs.get_certificate(&submitted.certificate_id).await);
    assert_eq!(cert.state, TaskState::Fail);
}

#[tokio::test]
async fn duplicate_submission_is_rejected_until_finished() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new(dir.path()).await;

    require_ok!(harness.service.submit(obtain(&["example.com", "example.org"])).await);
    let duplicate = harness
        .service
        .submit(obtain(&["EXAMPLE.org", "example.com."]).with_priority(Priority::Critical))
        .await;
    assert!(
        matches!(duplicate, Err(CoreError::DuplicateSubmission(_))),
        "{duplicate:?}"
    );

    // 不同的域名集合不受影响
    require_ok!(harness.service.submit(obtain(&["example.com"])).await);
}

#[tokio::test]
async fn in_flight_key_is_released_after_completion() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path()).await;

    let first = require_ok!(harness.service.submit(obtain(&["example.com"])).await);
    let payload = dns_cert_core::types::TaskPayload {
        task_id: first.task_id.clone(),
        certificate_id: first.certificate_id.clone(),
        account: "main".into(),
        domains: vec!["example.com".into()],
        kind: IssueKind::Obtain,
        log_path: first.log_path.clone(),
    };
    assert_eq!(harness.service.process(payload).await, TaskState::Success);

    require_ok!(harness.service.submit(obtain(&["example.com"])).await);
}

#[tokio::test]
async fn delegated_domain_requires_cname() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new(dir.path()).await;

    let info = cname_delegation_info(&["customer.org".to_string()], TEST_APPLY_DOMAIN).remove(0);
    harness
        .verifier
        .set(&info.full_domain_name, &info.value)
        .await;

    let ok = require_ok!(harness.service.submit(obtain(&["customer.org"])).await);
    let missing = require_ok!(harness.service.submit(obtain(&["other.org"])).await);
    harness.drain().await;

    let certs = CertificateService::new(harness.ctx.clone());
    let task = require_ok!(certs.get_task(&ok.task_id).await);
    assert_eq!(task.state, TaskState::Success, "{}", task.result);
    // TXT 记录写在 apply 域名下并已清理
    assert!(harness.apply.records().await.is_empty());
    let log = require_ok!(certs.read_task_log(&ok.task_id).await);
    assert!(log.contains(TEST_APPLY_DOMAIN), "{log}");

    let task = require_ok!(certs.get_task(&missing.task_id).await);
    assert_eq!(task.state, TaskState::Fail);
    assert!(task.result.contains("_acme-challenge.other.org"), "{}", task.result);
}

#[tokio::test]
async fn renew_reuses_key_and_domains() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::new(dir.path()).await;
    let certs = CertificateService::new(harness.ctx.clone());

    let first = require_ok!(harness.service.submit(obtain(&["example.com"])).await);
    let payload = dns_cert_core::types::TaskPayload {
        task_id: first.task_id.clone(),
        certificate_id: first.certificate_id.clone(),
        account: "main".into(),
        domains: vec!["example.com".into()],
        kind: IssueKind::Obtain,
        log_path: first.log_path.clone(),
    };
    assert_eq!(harness.service.process(payload).await, TaskState::Success);
    let original = require_ok!(certs.get_certificate(&first.certificate_id).await);
    let original_key = std::fs::read(original.save_path.join("private.key")).unwrap();

    let renew = IssueRequest {
        account: "main".into(),
        domains: Vec::new(),
        kind: IssueKind::Renew {
            certificate_id: first.certificate_id.clone(),
        },
        priority: Priority::Critical,
    };
    let renewed = require_ok!(harness.service.submit(renew).await);
    assert_ne!(renewed.certificate_id, first.certificate_id);
    harness.drain().await;

    let task = require_ok!(certs.get_task(&renewed.task_id).await);
    assert_eq!(task.state, TaskState::Success, "{}", task.result);
    let cert = require_ok!(certs.get_certificate(&renewed.certificate_id).await);
    assert!(cert.matches_domain("www.example.com"));
    let renewed_key = std::fs::read(cert.save_path.join("private.key")).unwrap();
    assert_eq!(renewed_key, original_key);
}

#[tokio::test]
async fn renew_of_unknown_certificate_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path()).await;

    let renew = IssueRequest {
        account: "main".into(),
        domains: vec!["example.com".into()],
        kind: IssueKind::Renew {
            certificate_id: "missing".into(),
        },
        priority: Priority::Default,
    };
    assert!(matches!(
        harness.service.submit(renew).await,
        Err(CoreError::CertificateNotFound(_))
    ));
}

#[tokio::test]
async fn submit_validates_request() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path()).await;

    assert!(matches!(
        harness.service.submit(obtain(&[])).await,
        Err(CoreError::ValidationError(_))
    ));
    assert!(matches!(
        harness
            .service
            .submit(IssueRequest::obtain("ghost", vec!["example.com".into()]))
            .await,
        Err(CoreError::AccountNotFound(_))
    ));
}

#[tokio::test]
async fn closed_queue_rejects_and_fails_records() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::new(dir.path()).await;
    harness.service.close().await;

    let result = harness.service.submit(obtain(&["example.com"])).await;
    assert!(matches!(result, Err(CoreError::QueueClosed(_))), "{result:?}");

    let certs = CertificateService::new(harness.ctx.clone());
    let page = require_ok!(certs.list_certificates(1, 10).await);
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].state, TaskState::Fail);
}
