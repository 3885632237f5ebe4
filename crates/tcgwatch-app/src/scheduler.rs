//! 5-루프 스케줄러.
//!
//! 알림 배치 비우기(1분), 에러율 표본(1분), 실패 거래 점검(1시간), 보존
//! 정리(1일), 에러 폭주 감시(이벤트 구동) 오케스트레이션. 모든 루프는 같은
//! 종료 신호를 구독한다.

use std::sync::Arc;
use std::time::Duration;
use tcgwatch_alerting::batcher::AlertBatcher;
use tcgwatch_alerting::events::EventBus;
use tcgwatch_alerting::retention::RetentionSweeper;
use tcgwatch_alerting::tiers::TieredAlerts;
use tcgwatch_alerting::watchers::{ErrorBurstWatcher, FailedTransactionWatcher};
use tcgwatch_core::config::AppConfig;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::wiring::Services;

/// 스케줄러 설정
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub flush_interval: Duration,
    pub transaction_check_interval: Duration,
    pub sweep_interval: Duration,
    pub error_rate_interval: Duration,
}

impl SchedulerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            flush_interval: config.flush_interval(),
            transaction_check_interval: config.transaction_check_interval(),
            sweep_interval: config.sweep_interval(),
            error_rate_interval: config.error_rate_interval(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default_config())
    }
}

/// 백그라운드 루프 묶음
pub struct Scheduler {
    config: SchedulerConfig,
    batcher: Arc<AlertBatcher>,
    failed_watcher: Arc<FailedTransactionWatcher>,
    sweeper: Arc<RetentionSweeper>,
    burst_watcher: Arc<ErrorBurstWatcher>,
    tiers: Arc<TieredAlerts>,
    events: EventBus,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, services: &Services) -> Self {
        Self {
            config,
            batcher: services.batcher.clone(),
            failed_watcher: services.failed_watcher.clone(),
            sweeper: services.sweeper.clone(),
            burst_watcher: services.burst_watcher.clone(),
            tiers: services.tiers.clone(),
            events: services.events.clone(),
        }
    }

    /// 모든 루프를 띄우고 종료 신호까지 대기
    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) {
        info!(
            "스케줄러 시작: 배치={}ms, 에러율={}ms, 실패 거래={}ms, 정리={}ms",
            self.config.flush_interval.as_millis(),
            self.config.error_rate_interval.as_millis(),
            self.config.transaction_check_interval.as_millis(),
            self.config.sweep_interval.as_millis(),
        );

        // 1. 알림 배치 비우기
        let flush_task = tokio::spawn(
            self.batcher
                .clone()
                .run(self.config.flush_interval, shutdown_rx.clone()),
        );

        // 2. 실패 거래 점검
        let transaction_task = tokio::spawn(self.failed_watcher.clone().run(
            self.config.transaction_check_interval,
            shutdown_rx.clone(),
        ));

        // 3. 보존 정리
        let sweep_task = tokio::spawn(
            self.sweeper
                .clone()
                .run(self.config.sweep_interval, shutdown_rx.clone()),
        );

        // 4. 에러 폭주 감시 (ErrorCreated 구독)
        let burst_task = tokio::spawn(
            self.burst_watcher
                .clone()
                .run(self.events.subscribe(), shutdown_rx.clone()),
        );

        // 5. 에러율 표본
        let error_rate_task = tokio::spawn(
            self.tiers
                .clone()
                .run(self.config.error_rate_interval, shutdown_rx.clone()),
        );

        let (flush, transaction, sweep, burst, error_rate) = tokio::join!(
            flush_task,
            transaction_task,
            sweep_task,
            burst_task,
            error_rate_task
        );
        for (name, result) in [
            ("배치", flush),
            ("에러율", error_rate),
            ("실패 거래", transaction),
            ("정리", sweep),
            ("에러 폭주", burst),
        ] {
            if let Err(e) = result {
                warn!("{name} 루프 비정상 종료: {e}");
            }
        }
        info!("스케줄러 종료");
    }
}
