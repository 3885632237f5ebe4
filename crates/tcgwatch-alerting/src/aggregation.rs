//! 시간 창 집계.
//!
//! `timestamp > now - window` 범위의 레코드 수를 센다. 경계 시각의 레코드는
//! 포함하지 않는다. 건수 상한이 없으므로 호출자가 시간 창을 작게 유지한다.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tcgwatch_core::error::CoreError;
use tcgwatch_core::models::collection::Collection;
use tcgwatch_core::ports::clock::Clock;
use tcgwatch_core::ports::storage::{MonitoringStore, RecordFilter};

/// 최근 레코드 집계기
#[derive(Clone)]
pub struct AggregationQuery {
    store: Arc<dyn MonitoringStore>,
    clock: Arc<dyn Clock>,
}

impl AggregationQuery {
    pub fn new(store: Arc<dyn MonitoringStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// 최근 `window_ms` 안에서 필터를 만족하는 레코드 수
    pub async fn count_recent_matching(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        window_ms: u64,
    ) -> Result<u64, CoreError> {
        let now = self.clock.now();
        let since = window_start(now, window_ms)
            .ok_or_else(|| CoreError::Config(format!("시간 창 범위 초과: {window_ms}ms")))?;
        self.store.count_since(collection, filter, since).await
    }
}

/// `now - window_ms`. 표현할 수 없는 범위면 None.
pub fn window_start(now: DateTime<Utc>, window_ms: u64) -> Option<DateTime<Utc>> {
    let window = Duration::try_milliseconds(i64::try_from(window_ms).ok()?)?;
    now.checked_sub_signed(window)
}
