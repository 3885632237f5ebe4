//! 테스트용 기록 채널.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tcgwatch_core::error::CoreError;
use tcgwatch_core::ports::notifier::{ChatNotifier, EmailMessage, EmailNotifier};
use tcgwatch_core::thresholds::MonitoringConfig;

use crate::dispatcher::NotificationDispatcher;

#[derive(Default)]
pub struct RecordingChat {
    posts: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingChat {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatNotifier for RecordingChat {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), CoreError> {
        self.posts
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string()));
        if self.fail {
            return Err(CoreError::Delivery("chat down".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingEmail {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingEmail {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailNotifier for RecordingEmail {
    async fn send(&self, message: &EmailMessage) -> Result<(), CoreError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(CoreError::Delivery("smtp down".to_string()));
        }
        Ok(())
    }
}

/// 기본 레지스트리 + 기록 채널로 디스패처 생성
pub fn recording_dispatcher() -> (
    Arc<NotificationDispatcher>,
    Arc<RecordingChat>,
    Arc<RecordingEmail>,
) {
    let chat = Arc::new(RecordingChat::default());
    let email = Arc::new(RecordingEmail::default());
    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(MonitoringConfig::default_config()),
        chat.clone(),
        email.clone(),
    ));
    (dispatcher, chat, email)
}
