//! 证书申请任务的请求与队列负载

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 队列优先级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    #[default]
    Default,
    Low,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::Critical, Self::Default, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Default => "default",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 新签发还是续期已有证书
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    #[default]
    Obtain,
    Renew {
        #[serde(rename = "certificateId")]
        certificate_id: String,
    },
}

/// 证书申请请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    /// 域名所在的 DNS 账户
    pub account: String,
    /// 需要签发的域名（不含 `*.` 前缀，签发时自动加入通配符）
    pub domains: Vec<String>,
    #[serde(default)]
    pub kind: IssueKind,
    #[serde(default)]
    pub priority: Priority,
}

impl IssueRequest {
    pub fn obtain(account: impl Into<String>, domains: Vec<String>) -> Self {
        Self {
            account: account.into(),
            domains,
            kind: IssueKind::Obtain,
            priority: Priority::Default,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// `submit` 的返回值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedTask {
    pub task_id: String,
    pub certificate_id: String,
    pub log_path: PathBuf,
    pub priority: Priority,
}

/// 入队的任务负载（JSON 序列化）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub task_id: String,
    pub certificate_id: String,
    pub account: String,
    pub domains: Vec<String>,
    pub kind: IssueKind,
    pub log_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_to_obtain_with_default_priority() {
        let request: IssueRequest =
            serde_json::from_str(r#"{"account":"main","domains":["example.com"]}"#).unwrap();
        assert_eq!(request.kind, IssueKind::Obtain);
        assert_eq!(request.priority, Priority::Default);
    }

    #[test]
    fn renew_request_carries_certificate_id() {
        let request: IssueRequest = serde_json::from_str(
            r#"{"account":"main","domains":["example.com"],"kind":{"renew":{"certificateId":"c-1"}},"priority":"critical"}"#,
        )
        .unwrap();
        assert_eq!(
            request.kind,
            IssueKind::Renew {
                certificate_id: "c-1".into()
            }
        );
        assert_eq!(request.priority, Priority::Critical);
    }

    #[test]
    fn payload_survives_queue_encoding() {
        let payload = TaskPayload {
            task_id: "t".into(),
            certificate_id: "c".into(),
            account: "main".into(),
            domains: vec!["example.com".into()],
            kind: IssueKind::Obtain,
            log_path: "/tmp/t.log".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "obtain");
        assert_eq!(json["taskId"], "t");

        let back: TaskPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }
}
