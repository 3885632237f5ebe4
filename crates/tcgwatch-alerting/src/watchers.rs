//! 트리거 기반 감시자.
//!
//! 에러 폭주 감시자는 에러 생성 이벤트마다, 실패 거래 감시자는 정해진 주기마다
//! 집계를 돌린다. 임계값에 닿으면 양쪽 채널로 즉시 발송하고 알림 레코드는
//! 남기지 않는다. 트리거 실패는 로그만 남기고 삼킨다.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tcgwatch_core::error::CoreError;
use tcgwatch_core::models::alert::AlertPayload;
use tcgwatch_core::models::collection::Collection;
use tcgwatch_core::models::error_report::ErrorRecord;
use tcgwatch_core::models::transaction::TransactionStatus;
use tcgwatch_core::ports::storage::RecordFilter;
use tcgwatch_core::thresholds::{
    MonitoringConfig, ThresholdCategory, ERROR_BURST_KEY, TRANSACTION_FAILED_KEY,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::aggregation::AggregationQuery;
use crate::dispatcher::{DispatchOutcome, NotificationDispatcher};
use crate::events::MonitoringEvent;
use crate::format::{window_hours, window_minutes};
use crate::tiers::TieredAlerts;

/// 감시자가 발송하는 알림의 라우팅 키
const WATCHER_ROUTE: &str = "critical";

fn missing_rule(key: &str) -> CoreError {
    CoreError::NotFound {
        resource_type: "ThresholdRule".to_string(),
        id: key.to_string(),
    }
}

// ============================================================
// 에러 폭주
// ============================================================

/// 전체 에러 건수 감시자
pub struct ErrorBurstWatcher {
    aggregation: AggregationQuery,
    registry: Arc<MonitoringConfig>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl ErrorBurstWatcher {
    pub fn new(
        aggregation: AggregationQuery,
        registry: Arc<MonitoringConfig>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            aggregation,
            registry,
            dispatcher,
        }
    }

    /// 에러 하나가 생성된 직후 점검. 발송했으면 결과를 돌려준다.
    pub async fn check(&self, created: &ErrorRecord) -> Option<DispatchOutcome> {
        match self.evaluate(created).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("에러 폭주 점검 실패: {e}");
                None
            }
        }
    }

    async fn evaluate(&self, created: &ErrorRecord) -> Result<Option<DispatchOutcome>, CoreError> {
        let rule = self
            .registry
            .threshold_for(ThresholdCategory::Error, ERROR_BURST_KEY)
            .ok_or_else(|| missing_rule(ERROR_BURST_KEY))?;

        let count = self
            .aggregation
            .count_recent_matching(Collection::Errors, &RecordFilter::Any, rule.window_ms)
            .await?;
        if (count as f64) < rule.limit {
            debug!("최근 에러 {count}건 (기준 {})", rule.limit);
            return Ok(None);
        }

        let window = window_minutes(rule.window_ms);
        let payload = AlertPayload::new(
            WATCHER_ROUTE,
            format!("{count} erreurs détectées dans les dernières {window}"),
        )
        .with_details(json!({
            "lastError": created,
            "errorCount": count,
            "timeWindow": window,
        }));

        warn!("에러 폭주 감지: 최근 {window} 동안 {count}건");
        Ok(Some(self.dispatcher.dispatch_both(&payload).await))
    }

    /// 에러 생성 이벤트 구독 루프
    pub async fn run(
        self: Arc<Self>,
        mut events: broadcast::Receiver<MonitoringEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(MonitoringEvent::ErrorCreated(record)) => {
                        self.check(&record).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("에러 이벤트 {skipped}건 놓침");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("에러 이벤트 버스 닫힘");
                        break;
                    }
                },
                _ = shutdown_rx.changed() => {
                    info!("에러 폭주 감시 종료");
                    break;
                }
            }
        }
    }
}

// ============================================================
// 실패 거래
// ============================================================

/// 실패 거래 건수 감시자
pub struct FailedTransactionWatcher {
    aggregation: AggregationQuery,
    registry: Arc<MonitoringConfig>,
    dispatcher: Arc<NotificationDispatcher>,
    tiers: Option<Arc<TieredAlerts>>,
}

impl FailedTransactionWatcher {
    pub fn new(
        aggregation: AggregationQuery,
        registry: Arc<MonitoringConfig>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            aggregation,
            registry,
            dispatcher,
            tiers: None,
        }
    }

    /// 집계한 건수를 단계별 점검에도 넘긴다
    pub fn with_tiers(mut self, tiers: Arc<TieredAlerts>) -> Self {
        self.tiers = Some(tiers);
        self
    }

    /// 최근 시간 창의 실패 거래 점검
    pub async fn check(&self) -> Option<DispatchOutcome> {
        match self.evaluate().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("실패 거래 점검 실패: {e}");
                None
            }
        }
    }

    async fn evaluate(&self) -> Result<Option<DispatchOutcome>, CoreError> {
        let rule = self
            .registry
            .threshold_for(ThresholdCategory::Transaction, TRANSACTION_FAILED_KEY)
            .ok_or_else(|| missing_rule(TRANSACTION_FAILED_KEY))?;

        let failed = self
            .aggregation
            .count_recent_matching(
                Collection::Transactions,
                &RecordFilter::StatusEquals(TransactionStatus::Failed),
                rule.window_ms,
            )
            .await?;
        if let Some(tiers) = &self.tiers {
            tiers.check_failed_transactions(failed);
        }
        if (failed as f64) < rule.limit {
            debug!("실패 거래 {failed}건 (기준 {})", rule.limit);
            return Ok(None);
        }

        let payload = AlertPayload::new(WATCHER_ROUTE, "Nombre élevé de transactions échouées")
            .with_details(json!({
                "failedCount": failed,
                "timeWindow": window_hours(rule.window_ms),
                "threshold": self.registry.transactions.failed_count,
            }));

        warn!("실패 거래 {failed}건 감지");
        Ok(Some(self.dispatcher.dispatch_both(&payload).await))
    }

    /// 주기 점검 루프
    pub async fn run(self: Arc<Self>, period: Duration, mut shutdown_rx: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.check().await;
                }
                _ = shutdown_rx.changed() => {
                    info!("실패 거래 감시 종료");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{recording_dispatcher, RecordingChat, RecordingEmail};
    use chrono::{Duration as ChronoDuration, Utc};
    use tcgwatch_core::models::transaction::TransactionRecord;
    use tcgwatch_core::ports::clock::{Clock, ManualClock};
    use tcgwatch_core::ports::storage::MonitoringStore;
    use tcgwatch_storage::sqlite::SqliteStorage;

    struct Env {
        store: Arc<SqliteStorage>,
        clock: Arc<ManualClock>,
        chat: Arc<RecordingChat>,
        email: Arc<RecordingEmail>,
        burst: ErrorBurstWatcher,
        failed: FailedTransactionWatcher,
    }

    fn env() -> Env {
        let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let registry = Arc::new(MonitoringConfig::default_config());
        let (dispatcher, chat, email) = recording_dispatcher();
        let aggregation = AggregationQuery::new(store.clone(), clock.clone());
        Env {
            burst: ErrorBurstWatcher::new(aggregation.clone(), registry.clone(), dispatcher.clone()),
            failed: FailedTransactionWatcher::new(aggregation, registry, dispatcher),
            store,
            clock,
            chat,
            email,
        }
    }

    fn error_now(env: &Env, message: &str) -> ErrorRecord {
        ErrorRecord {
            message: message.to_string(),
            stack: None,
            user_id: None,
            route: Some("/shop".to_string()),
            timestamp: env.clock.now(),
            metadata: None,
        }
    }

    async fn failed_tx(env: &Env, id: &str, minutes_ago: i64) {
        env.store
            .save_transaction(&TransactionRecord {
                id: id.to_string(),
                status: TransactionStatus::Failed,
                amount: Some(12.5),
                user_id: None,
                timestamp: env.clock.now() - ChronoDuration::minutes(minutes_ago),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn burst_fires_at_exact_threshold() {
        let env = env();
        for i in 0..9 {
            let record = error_now(&env, &format!("erreur {i}"));
            env.store.save_error(&record).await.unwrap();
            assert!(env.burst.check(&record).await.is_none(), "{}건에서 발송", i + 1);
        }
        assert!(env.chat.posts().is_empty());

        let record = error_now(&env, "erreur finale");
        env.store.save_error(&record).await.unwrap();
        let outcome = env.burst.check(&record).await.unwrap();
        assert!(outcome.chat_delivered && outcome.email_delivered);

        let posts = env.chat.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "pokemon-tcg-critical");
        assert!(posts[0]
            .1
            .contains("10 erreurs détectées dans les dernières 5 minutes"));
        assert_eq!(env.email.sent().len(), 1);
    }

    #[tokio::test]
    async fn burst_writes_no_alert_record() {
        let env = env();
        for i in 0..12 {
            let record = error_now(&env, &format!("e{i}"));
            env.store.save_error(&record).await.unwrap();
            env.burst.check(&record).await;
        }
        let alerts = env.store.recent_alerts(10).await.unwrap();
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn burst_details_include_last_error() {
        let env = env();
        for i in 0..9 {
            env.store.save_error(&error_now(&env, &format!("e{i}"))).await.unwrap();
        }
        let record = error_now(&env, "dernière");
        env.store.save_error(&record).await.unwrap();
        env.burst.check(&record).await.unwrap();

        let body = &env.email.sent()[0].html_body;
        assert!(body.contains("\"lastError\""));
        assert!(body.contains("dernière"));
        assert!(body.contains("\"errorCount\": 10"));
    }

    #[tokio::test]
    async fn failed_transactions_fire_dual_channel_alert() {
        let env = env();
        failed_tx(&env, "tx-1", 5).await;
        failed_tx(&env, "tx-2", 20).await;
        assert!(env.failed.check().await.is_none());

        failed_tx(&env, "tx-3", 59).await;
        let outcome = env.failed.check().await.unwrap();
        assert!(outcome.chat_delivered && outcome.email_delivered);

        assert!(env.chat.posts()[0]
            .1
            .contains("Nombre élevé de transactions échouées"));
        let body = &env.email.sent()[0].html_body;
        assert!(body.contains("1 heure(s)"));
        assert!(body.contains("\"failedCount\": 3"));
    }

    #[tokio::test]
    async fn failed_count_feeds_tiered_check() {
        let env = env();
        let registry = Arc::new(MonitoringConfig::default_config());
        let (dispatcher, _, _) = recording_dispatcher();
        let batcher = Arc::new(crate::batcher::AlertBatcher::new(dispatcher, registry.clone()));
        let tiers = Arc::new(TieredAlerts::new(
            registry,
            batcher.clone(),
            AggregationQuery::new(env.store.clone(), env.clock.clone()),
        ));
        let failed = env.failed.with_tiers(tiers);

        for (i, minutes) in [1, 2, 3, 4, 5].into_iter().enumerate() {
            env.store
                .save_transaction(&TransactionRecord {
                    id: format!("tx-{i}"),
                    status: TransactionStatus::Failed,
                    amount: None,
                    user_id: None,
                    timestamp: env.clock.now() - ChronoDuration::minutes(minutes),
                })
                .await
                .unwrap();
        }

        assert!(failed.check().await.is_some());
        assert_eq!(batcher.pending(), 1);
        let reports = batcher.flush().await;
        assert_eq!(reports[0].kind, "failed_transactions");
        assert_eq!(reports[0].severity, tcgwatch_core::models::alert::QueueSeverity::High);
    }

    #[tokio::test]
    async fn old_or_successful_transactions_are_ignored() {
        let env = env();
        failed_tx(&env, "tx-old-1", 61).await;
        failed_tx(&env, "tx-old-2", 120).await;
        failed_tx(&env, "tx-new", 1).await;
        env.store
            .save_transaction(&TransactionRecord {
                id: "tx-ok".to_string(),
                status: TransactionStatus::Completed,
                amount: None,
                user_id: None,
                timestamp: env.clock.now(),
            })
            .await
            .unwrap();

        assert!(env.failed.check().await.is_none());
        assert!(env.email.sent().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let chat = Arc::new(RecordingChat::failing());
        let email = Arc::new(RecordingEmail::failing());
        let registry = Arc::new(MonitoringConfig::default_config());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            registry.clone(),
            chat,
            email,
        ));
        let watcher = FailedTransactionWatcher::new(
            AggregationQuery::new(store.clone(), clock.clone()),
            registry,
            dispatcher,
        );
        for id in ["a", "b", "c"] {
            store
                .save_transaction(&TransactionRecord {
                    id: id.to_string(),
                    status: TransactionStatus::Failed,
                    amount: None,
                    user_id: None,
                    timestamp: clock.now(),
                })
                .await
                .unwrap();
        }

        let outcome = watcher.check().await.unwrap();
        assert!(!outcome.chat_delivered);
        assert!(!outcome.email_delivered);
    }

    #[tokio::test]
    async fn burst_loop_reacts_to_events_and_stops() {
        let env = env();
        let bus = crate::events::EventBus::new(32);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = Arc::new(env.burst);
        let handle = tokio::spawn(watcher.run(bus.subscribe(), shutdown_rx));

        for i in 0..10 {
            let record = ErrorRecord {
                message: format!("boucle {i}"),
                stack: None,
                user_id: None,
                route: None,
                timestamp: env.clock.now(),
                metadata: None,
            };
            env.store.save_error(&record).await.unwrap();
            bus.publish(MonitoringEvent::ErrorCreated(record));
        }

        for _ in 0..200 {
            if !env.chat.posts().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!env.chat.posts().is_empty());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
