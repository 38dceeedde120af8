//! Certificate Session Manager
//!
//! 持有当前 ACME 客户端，按 `max_requests` 轮换邮箱账户。
//! 并发的申请在锁内预留名额，保证同一客户端的签发次数不超过上限。

use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::acme::{
    AcmeClient, AcmeEngine, CertificateBundle, Dns01Solver, ObtainRequest, generate_key_pair,
};
use crate::error::{CoreError, CoreResult};

#[derive(Default)]
struct SessionState {
    client: Option<Arc<dyn AcmeClient>>,
    /// 每次轮换加一，旧客户端的预留释放时据此忽略
    generation: u64,
    request_count: u32,
    in_flight: u32,
    next_email: usize,
}

/// 一次预留
struct Slot {
    client: Arc<dyn AcmeClient>,
    generation: u64,
}

pub struct SessionManager {
    engine: Arc<dyn AcmeEngine>,
    emails: Vec<String>,
    max_requests: u32,
    state: Mutex<SessionState>,
    key: OnceCell<String>,
}

impl SessionManager {
    /// # Arguments
    /// * `engine` - ACME 引擎
    /// * `emails` - 账户邮箱池，按顺序轮换
    /// * `max_requests` - 单个客户端最多签发的证书数
    #[must_use]
    pub fn new(engine: Arc<dyn AcmeEngine>, emails: Vec<String>, max_requests: u32) -> Self {
        Self {
            engine,
            emails,
            max_requests: max_requests.max(1),
            state: Mutex::new(SessionState::default()),
            key: OnceCell::new(),
        }
    }

    /// 会话私钥（RSA-2048 PEM），首次调用时生成，只保存在内存中
    ///
    /// 只属于会话本身，证书私钥由 ACME 客户端按订单生成。
    pub async fn private_key(&self) -> CoreResult<String> {
        self.key
            .get_or_try_init(|| async { generate_key_pair().map(|key| key.serialize_pem()) })
            .await
            .cloned()
    }

    /// 当前客户端对应的邮箱
    pub async fn active_email(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.client.as_ref().map(|c| c.email().to_string())
    }

    /// 签发新证书
    pub async fn obtain(
        &self,
        domains: Vec<String>,
        solver: Arc<dyn Dns01Solver>,
    ) -> CoreResult<CertificateBundle> {
        let slot = self.reserve().await?;
        log::info!(
            "[session] obtaining {} via {}",
            domains.join(","),
            slot.client.email()
        );

        let result = slot
            .client
            .obtain(ObtainRequest { domains }, solver)
            .await;
        self.release(&slot, result.is_ok()).await;
        result
    }

    /// 续期已有证书
    pub async fn renew(
        &self,
        existing: &CertificateBundle,
        solver: Arc<dyn Dns01Solver>,
    ) -> CoreResult<CertificateBundle> {
        let slot = self.reserve().await?;
        log::info!(
            "[session] renewing {} via {}",
            existing.domain,
            slot.client.email()
        );

        let result = slot.client.renew(existing, solver).await;
        self.release(&slot, result.is_ok()).await;
        result
    }

    async fn reserve(&self) -> CoreResult<Slot> {
        let mut state = self.state.lock().await;

        let exhausted = state.request_count + state.in_flight >= self.max_requests;
        let client = match &state.client {
            Some(client) if !exhausted => Arc::clone(client),
            _ => {
                if self.emails.is_empty() {
                    return Err(CoreError::NoEmailConfigured);
                }
                let index = state.next_email % self.emails.len();
                let email = &self.emails[index];
                let client = self.engine.new_client(email).await?;
                log::info!(
                    "[session] switched to account {email} ({})",
                    client.registration()
                );

                state.client = Some(Arc::clone(&client));
                state.generation += 1;
                state.request_count = 0;
                state.in_flight = 0;
                state.next_email = (index + 1) % self.emails.len();
                client
            }
        };

        state.in_flight += 1;
        Ok(Slot {
            client,
            generation: state.generation,
        })
    }

    async fn release(&self, slot: &Slot, succeeded: bool) {
        let mut state = self.state.lock().await;
        if state.generation != slot.generation {
            return;
        }
        state.in_flight = state.in_flight.saturating_sub(1);
        if succeeded {
            state.request_count += 1;
        }
    }
}
