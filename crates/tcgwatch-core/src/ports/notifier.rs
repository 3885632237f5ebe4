//! 알림 채널 포트.
//!
//! 채팅(Slack)과 이메일(SMTP) 두 전달 경로. 둘 다 재시도하지 않는다.

use async_trait::async_trait;

use crate::error::CoreError;

/// 채팅 채널로 메시지 한 건 게시
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), CoreError>;
}

/// 발송할 이메일 한 통. 모든 수신자가 하나의 `To` 헤더에 들어간다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

impl EmailMessage {
    /// 쉼표로 합친 수신자 목록
    pub fn to_header(&self) -> String {
        self.to.join(",")
    }
}

/// 이메일 발송
#[async_trait]
pub trait EmailNotifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), CoreError>;
}
