//! 모니터링 저장소 포트.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::models::alert::AlertRecord;
use crate::models::collection::Collection;
use crate::models::error_report::ErrorRecord;
use crate::models::performance::PerformanceSample;
use crate::models::transaction::{TransactionRecord, TransactionStatus};

/// 시간 창 집계에 붙는 동등 조건
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    /// 조건 없음 (전체 건수)
    Any,
    /// 에러 메시지 완전 일치 (`errors` 전용)
    MessageEquals(String),
    /// 거래 상태 일치 (`transactions` 전용)
    StatusEquals(TransactionStatus),
}

/// 모니터링 레코드 저장소.
///
/// 각 쓰기는 독립적이다. 샘플 쓰기와 알림 쓰기를 하나의 트랜잭션으로 묶지 않는다.
#[async_trait]
pub trait MonitoringStore: Send + Sync {
    /// 성능 샘플 저장
    async fn save_performance(&self, sample: &PerformanceSample) -> Result<(), CoreError>;

    /// 에러 레코드 저장
    async fn save_error(&self, record: &ErrorRecord) -> Result<(), CoreError>;

    /// 알림 레코드 저장 후 ID 반환
    async fn save_alert(&self, alert: &AlertRecord) -> Result<i64, CoreError>;

    /// 거래 레코드 저장 (주문 처리 쪽 협력자용)
    async fn save_transaction(&self, record: &TransactionRecord) -> Result<(), CoreError>;

    /// `timestamp > since` 이고 필터를 만족하는 레코드 수.
    /// 경계 시각과 같은 레코드는 세지 않는다.
    async fn count_since(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        since: DateTime<Utc>,
    ) -> Result<u64, CoreError>;

    /// `timestamp < cutoff` 인 레코드를 오래된 순으로 최대 `limit`건 한 번에 삭제.
    /// 삭제된 건수를 반환한다.
    async fn delete_older_than(
        &self,
        collection: Collection,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, CoreError>;

    /// 최근 알림 레코드 (최신순)
    async fn recent_alerts(&self, limit: usize) -> Result<Vec<AlertRecord>, CoreError>;
}
