//! 통합 테스트 공용 도구.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tcgwatch_app::wiring::{Channels, Services};
use tcgwatch_core::config::AppConfig;
use tcgwatch_core::error::CoreError;
use tcgwatch_core::ports::clock::ManualClock;
use tcgwatch_core::ports::notifier::{ChatNotifier, EmailMessage, EmailNotifier};
use tcgwatch_storage::sqlite::SqliteStorage;

/// 보낸 메시지를 모두 기록하는 채널
#[derive(Default)]
pub struct Outbox {
    chat: Mutex<Vec<(String, String)>>,
    email: Mutex<Vec<EmailMessage>>,
}

impl Outbox {
    pub fn chat(&self) -> Vec<(String, String)> {
        self.chat.lock().unwrap().clone()
    }

    pub fn email(&self) -> Vec<EmailMessage> {
        self.email.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatNotifier for Outbox {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), CoreError> {
        self.chat
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

#[async_trait]
impl EmailNotifier for Outbox {
    async fn send(&self, message: &EmailMessage) -> Result<(), CoreError> {
        self.email.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct Harness {
    pub services: Services,
    pub store: Arc<SqliteStorage>,
    pub clock: Arc<ManualClock>,
    pub outbox: Arc<Outbox>,
}

/// 인메모리 저장소 + 수동 시계 + 기록 채널로 전체 서비스 조립
pub fn harness() -> Harness {
    let config = AppConfig::default_config();
    let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let outbox = Arc::new(Outbox::default());
    let channels = Channels {
        chat: outbox.clone(),
        email: outbox.clone(),
    };
    let services = Services::build(&config, store.clone(), channels, clock.clone());
    Harness {
        services,
        store,
        clock,
        outbox,
    }
}

/// 즉시 발송 작업이 끝날 때까지 양보
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}
