//! 모니터링 이벤트 버스.
//!
//! `tokio::broadcast` 기반. 에러 레코드가 저장되면 `ErrorCreated`가
//! 발행되고 에러 폭주 감시기가 이를 구독한다.

use tcgwatch_core::models::error_report::ErrorRecord;
use tokio::sync::broadcast;
use tracing::debug;

/// 내부 모니터링 이벤트
#[derive(Debug, Clone)]
pub enum MonitoringEvent {
    /// 에러 레코드 생성됨
    ErrorCreated(ErrorRecord),
}

/// 이벤트 버스
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MonitoringEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 이벤트 발행. 구독자가 없으면 버려진다.
    pub fn publish(&self, event: MonitoringEvent) {
        debug!("이벤트 발행: {:?}", std::mem::discriminant(&event));
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitoringEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
