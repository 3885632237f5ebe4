//! 비활성 채널.
//!
//! 비밀값이 설정되지 않은 채널 자리에 끼운다. 모든 전달이 실패하며
//! 디스패처가 그 실패를 로그로 남긴다.

use async_trait::async_trait;
use tcgwatch_core::error::CoreError;
use tcgwatch_core::ports::notifier::{ChatNotifier, EmailMessage, EmailNotifier};

/// 미설정 채널
#[derive(Debug, Clone)]
pub struct DisabledChannel {
    name: &'static str,
}

impl DisabledChannel {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn unavailable(&self) -> CoreError {
        CoreError::Delivery(format!("{} 채널 미설정", self.name))
    }
}

#[async_trait]
impl ChatNotifier for DisabledChannel {
    async fn post_message(&self, _channel: &str, _text: &str) -> Result<(), CoreError> {
        Err(self.unavailable())
    }
}

#[async_trait]
impl EmailNotifier for DisabledChannel {
    async fn send(&self, _message: &EmailMessage) -> Result<(), CoreError> {
        Err(self.unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_delivery_fails() {
        let chat = DisabledChannel::new("slack");
        let err = chat.post_message("c", "t").await.unwrap_err();
        assert!(err.to_string().contains("slack 채널 미설정"));

        let email = DisabledChannel::new("email");
        let message = EmailMessage {
            to: vec!["a@b.c".to_string()],
            subject: "s".to_string(),
            html_body: "b".to_string(),
        };
        assert!(email.send(&message).await.is_err());
    }
}
