//! 성능 샘플/에러 수집.
//!
//! 수집한 레코드를 서버 시각으로 저장한 뒤 임계값 레지스트리로 평가한다.
//! 초과 시 알림 레코드를 남기고 배치 큐에 넘긴다. 샘플 쓰기와 알림 쓰기는
//! 서로 독립이며, 알림 쓰기가 실패해도 샘플은 남는다.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use tcgwatch_core::error::CallError;
use tcgwatch_core::models::alert::{AlertQueueEntry, AlertRecord, AlertSeverity, AlertType};
use tcgwatch_core::models::collection::Collection;
use tcgwatch_core::models::error_report::{ErrorRecord, ErrorReport};
use tcgwatch_core::models::identity::CallerIdentity;
use tcgwatch_core::models::performance::{PerformanceReport, PerformanceSample};
use tcgwatch_core::ports::clock::Clock;
use tcgwatch_core::ports::storage::{MonitoringStore, RecordFilter};
use tcgwatch_core::thresholds::{MonitoringConfig, ThresholdCategory, ERROR_CRITICAL_KEY};
use tracing::{debug, error, info, warn};

use crate::aggregation::AggregationQuery;
use crate::batcher::AlertBatcher;
use crate::events::{EventBus, MonitoringEvent};
use crate::format::{exceed_percent, window_minutes};

const PERFORMANCE_WRITE_FAILED: &str = "Erreur lors de l'enregistrement des métriques";
const ERROR_WRITE_FAILED: &str = "Erreur lors de l'enregistrement de l'erreur";

/// 수집 서비스
pub struct IngestionService {
    store: Arc<dyn MonitoringStore>,
    registry: Arc<MonitoringConfig>,
    aggregation: AggregationQuery,
    clock: Arc<dyn Clock>,
    batcher: Option<Arc<AlertBatcher>>,
    events: Option<EventBus>,
}

impl IngestionService {
    pub fn new(
        store: Arc<dyn MonitoringStore>,
        registry: Arc<MonitoringConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            aggregation: AggregationQuery::new(store.clone(), clock.clone()),
            store,
            registry,
            clock,
            batcher: None,
            events: None,
        }
    }

    /// 알림 레코드를 넘길 배치 큐 연결
    pub fn with_batcher(mut self, batcher: Arc<AlertBatcher>) -> Self {
        self.batcher = Some(batcher);
        self
    }

    /// 에러 생성 이벤트를 발행할 버스 연결
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// 성능 샘플 기록. 인증된 호출자만 가능하다.
    ///
    /// 생성된 알림 레코드가 있으면 돌려준다.
    pub async fn record_performance(
        &self,
        caller: Option<&CallerIdentity>,
        report: PerformanceReport,
    ) -> Result<Option<AlertRecord>, CallError> {
        let caller = caller.ok_or(CallError::Unauthenticated)?;

        let sample = PerformanceSample {
            route: report.route,
            metric_type: report.metric_type,
            load_time: report.load_time,
            timestamp: self.clock.now(),
            user_id: Some(caller.uid.clone()),
        };
        self.store
            .save_performance(&sample)
            .await
            .map_err(|e| CallError::internal(PERFORMANCE_WRITE_FAILED, &e))?;

        let Some(rule) = self
            .registry
            .threshold_for(ThresholdCategory::Performance, &sample.metric_type)
        else {
            warn!(
                "임계값 규칙 없음, 평가 건너뜀: metricType={} route={}",
                sample.metric_type, sample.route
            );
            return Ok(None);
        };

        if sample.load_time <= rule.limit {
            return Ok(None);
        }

        let severity = if sample.load_time > rule.limit * 2.0 {
            AlertSeverity::Critical
        } else {
            rule.severity
        };

        let mut details = to_map(&sample);
        details.insert("threshold".to_string(), json!(rule.limit));
        details.insert(
            "exceedBy".to_string(),
            json!(exceed_percent(sample.load_time, rule.limit)),
        );

        let alert = AlertRecord {
            id: None,
            alert_type: AlertType::Performance,
            severity,
            message: format!("Performance dégradée détectée pour {}", sample.metric_type),
            details,
            timestamp: self.clock.now().max(sample.timestamp),
        };
        let alert = self
            .persist_alert(alert)
            .await
            .map_err(|e| CallError::internal(PERFORMANCE_WRITE_FAILED, &e))?;

        info!(
            "성능 임계값 초과 [{}]: {} {}ms > {}ms",
            severity.as_str(),
            sample.metric_type,
            sample.load_time,
            rule.limit
        );
        self.hand_off(&alert, Some(&sample.metric_type), Some(sample.load_time));
        Ok(Some(alert))
    }

    /// 에러 기록. 로그인 전 에러도 받으므로 인증을 요구하지 않는다.
    pub async fn record_error(
        &self,
        caller: Option<&CallerIdentity>,
        report: ErrorReport,
    ) -> Result<Option<AlertRecord>, CallError> {
        let record = ErrorRecord {
            message: report.message,
            stack: report.stack,
            user_id: caller.map(|c| c.uid.clone()),
            route: report.route,
            timestamp: self.clock.now(),
            metadata: report.metadata,
        };
        self.store
            .save_error(&record)
            .await
            .map_err(|e| CallError::internal(ERROR_WRITE_FAILED, &e))?;

        if let Some(events) = &self.events {
            events.publish(MonitoringEvent::ErrorCreated(record.clone()));
        }

        if !self.registry.is_critical_candidate(&record.message) {
            debug!("비치명 에러: {}", record.message);
            return Ok(None);
        }

        let Some(rule) = self
            .registry
            .threshold_for(ThresholdCategory::Error, ERROR_CRITICAL_KEY)
        else {
            warn!("에러 임계값 규칙 없음, 평가 건너뜀");
            return Ok(None);
        };

        let similar = self
            .aggregation
            .count_recent_matching(
                Collection::Errors,
                &RecordFilter::MessageEquals(record.message.clone()),
                rule.window_ms,
            )
            .await
            .map_err(|e| CallError::internal(ERROR_WRITE_FAILED, &e))?;

        if (similar as f64) < rule.limit {
            debug!(
                "치명 후보 에러 {similar}건 (기준 {}): {}",
                rule.limit, record.message
            );
            return Ok(None);
        }

        let mut details = to_map(&record);
        details.insert("errorCount".to_string(), json!(similar));
        details.insert("timeWindow".to_string(), json!(window_minutes(rule.window_ms)));

        let alert = AlertRecord {
            id: None,
            alert_type: AlertType::Error,
            severity: rule.severity,
            message: "Erreur critique détectée".to_string(),
            details,
            timestamp: self.clock.now().max(record.timestamp),
        };
        let alert = self
            .persist_alert(alert)
            .await
            .map_err(|e| CallError::internal(ERROR_WRITE_FAILED, &e))?;

        warn!("반복 치명 에러 {similar}건: {}", record.message);
        self.hand_off(&alert, None, None);
        Ok(Some(alert))
    }

    async fn persist_alert(
        &self,
        mut alert: AlertRecord,
    ) -> Result<AlertRecord, tcgwatch_core::error::CoreError> {
        let id = self.store.save_alert(&alert).await?;
        alert.id = Some(id);
        Ok(alert)
    }

    /// 배치 큐로 넘긴다. 발송 결과는 호출자에게 돌아가지 않는다.
    fn hand_off(&self, alert: &AlertRecord, metric: Option<&str>, value: Option<f64>) {
        let Some(batcher) = &self.batcher else {
            return;
        };
        let mut entry = AlertQueueEntry::from(alert);
        if let Some(meta) = entry.metadata.as_mut() {
            if let Some(metric) = metric {
                meta.insert("metric".to_string(), json!(metric));
            }
            if let Some(value) = value {
                meta.insert("value".to_string(), json!(value));
            }
        }
        batcher.submit(entry);
    }
}

fn to_map<T: serde::Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => {
            error!("알림 상세 직렬화 실패: {e}");
            Map::new()
        }
    }
}
