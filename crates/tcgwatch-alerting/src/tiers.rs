//! 단계별 임계값 점검.
//!
//! 분당 에러 수, 응답 시간, 시간당 실패 거래 수를 medium/high/critical
//! 기준과 비교해 배치 큐에 넣는다. critical은 큐를 거치지 않고 즉시 나가고
//! 나머지는 다음 비우기에서 종류별 요약으로 묶인다.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tcgwatch_core::error::CoreError;
use tcgwatch_core::models::alert::{AlertQueueEntry, QueueSeverity};
use tcgwatch_core::models::collection::Collection;
use tcgwatch_core::ports::storage::RecordFilter;
use tcgwatch_core::thresholds::{MonitoringConfig, SeverityTiers};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::aggregation::AggregationQuery;
use crate::batcher::AlertBatcher;

/// 배치 그룹 키
pub const ERROR_RATE_KIND: &str = "error_rate";
pub const RESPONSE_TIME_KIND: &str = "response_time";
pub const FAILED_TRANSACTIONS_KIND: &str = "failed_transactions";

/// 단계별 점검기
pub struct TieredAlerts {
    registry: Arc<MonitoringConfig>,
    batcher: Arc<AlertBatcher>,
    aggregation: AggregationQuery,
}

impl TieredAlerts {
    pub fn new(
        registry: Arc<MonitoringConfig>,
        batcher: Arc<AlertBatcher>,
        aggregation: AggregationQuery,
    ) -> Self {
        Self {
            registry,
            batcher,
            aggregation,
        }
    }

    /// 분당 에러 수 점검. 큐에 넣은 단계를 돌려준다.
    pub fn check_error_rate(&self, errors_per_minute: u64) -> Option<QueueSeverity> {
        let tiers = &self.registry.tiers.error_rate;
        let severity = tiers.classify(errors_per_minute as f64)?;
        let mut meta = Map::new();
        meta.insert("errorsPerMinute".to_string(), json!(errors_per_minute));
        self.submit(
            ERROR_RATE_KIND,
            format!(
                "Error rate {}: {errors_per_minute} errors/minute",
                level_word(severity)
            ),
            severity,
            tiers,
            meta,
        );
        Some(severity)
    }

    /// 엔드포인트 응답 시간 점검
    pub fn check_response_time(&self, response_time_ms: f64, endpoint: &str) -> Option<QueueSeverity> {
        let tiers = &self.registry.tiers.response_time;
        let severity = tiers.classify(response_time_ms)?;
        let mut meta = Map::new();
        meta.insert("responseTime".to_string(), json!(response_time_ms));
        meta.insert("endpoint".to_string(), json!(endpoint));
        // 성능 채널 템플릿용
        meta.insert("metric".to_string(), json!(endpoint));
        meta.insert("value".to_string(), json!(format!("{}ms", response_time_ms.round())));
        self.submit(
            RESPONSE_TIME_KIND,
            format!(
                "Response time {} for {endpoint}: {}ms",
                level_word(severity),
                response_time_ms.round()
            ),
            severity,
            tiers,
            meta,
        );
        Some(severity)
    }

    /// 최근 1시간 실패 거래 수 점검
    pub fn check_failed_transactions(&self, failed_count: u64) -> Option<QueueSeverity> {
        let tiers = &self.registry.tiers.failed_transactions;
        let severity = tiers.classify(failed_count as f64)?;
        let mut meta = Map::new();
        meta.insert("failedCount".to_string(), json!(failed_count));
        self.submit(
            FAILED_TRANSACTIONS_KIND,
            format!(
                "{} number of failed transactions: {failed_count} in the last hour",
                capitalized(level_word(severity))
            ),
            severity,
            tiers,
            meta,
        );
        Some(severity)
    }

    /// 최근 표본 주기 동안의 에러 수를 세어 에러율 점검
    pub async fn sample_error_rate(&self) -> Result<Option<QueueSeverity>, CoreError> {
        let window_ms = self.registry.tiers.error_rate_interval_ms;
        let count = self
            .aggregation
            .count_recent_matching(Collection::Errors, &RecordFilter::Any, window_ms)
            .await?;
        // 표본 창을 분당 값으로 환산
        let per_minute = (count as f64 * 60_000.0 / window_ms as f64).round() as u64;
        debug!("에러율 표본: {count}건 / {window_ms}ms → 분당 {per_minute}");
        Ok(self.check_error_rate(per_minute))
    }

    /// 주기적 에러율 표본 루프
    pub async fn run(self: Arc<Self>, period: Duration, mut shutdown_rx: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.sample_error_rate().await {
                        error!("에러율 점검 실패: {e}");
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("에러율 점검 루프 종료");
                    break;
                }
            }
        }
    }

    fn submit(
        &self,
        kind: &str,
        message: String,
        severity: QueueSeverity,
        tiers: &SeverityTiers,
        mut meta: Map<String, Value>,
    ) {
        if let Some(limit) = tiers.limit_for(severity) {
            meta.insert("threshold".to_string(), json!(limit));
        }
        info!("단계 기준 도달 [{severity}] {kind}: {message}");
        self.batcher
            .submit(AlertQueueEntry::new(kind, message, severity).with_metadata(meta));
    }
}

fn level_word(severity: QueueSeverity) -> &'static str {
    match severity {
        QueueSeverity::Critical => "critical",
        QueueSeverity::High => "high",
        QueueSeverity::Medium => "elevated",
        QueueSeverity::Low => "low",
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
