//! 보존 기간 정리.
//!
//! 실행마다 컬렉션별로 보존 기간이 지난 레코드를 오래된 순으로 최대
//! `page_size`건 지운다. 남은 레코드는 다음 실행이 처리한다.

use std::sync::Arc;
use std::time::Duration;
use tcgwatch_core::models::collection::Collection;
use tcgwatch_core::ports::clock::Clock;
use tcgwatch_core::ports::storage::MonitoringStore;
use tcgwatch_core::thresholds::RetentionPolicy;
use tokio::sync::watch;
use tracing::{error, info};

use crate::aggregation::window_start;

/// 1회 정리 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// 컬렉션별 삭제 건수 (실패한 컬렉션은 빠진다)
    pub deleted: Vec<(Collection, usize)>,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.deleted.iter().map(|(_, n)| n).sum()
    }

    pub fn deleted_from(&self, collection: Collection) -> Option<usize> {
        self.deleted
            .iter()
            .find(|(c, _)| *c == collection)
            .map(|(_, n)| *n)
    }
}

/// 보존 정리기
pub struct RetentionSweeper {
    store: Arc<dyn MonitoringStore>,
    clock: Arc<dyn Clock>,
    policy: RetentionPolicy,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn MonitoringStore>, clock: Arc<dyn Clock>, policy: RetentionPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// 정리 1회 실행. 한 컬렉션의 실패는 나머지를 막지 않는다.
    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let Some(cutoff) = window_start(self.clock.now(), self.policy.period_ms) else {
            error!("보존 기간 범위 초과, 정리 건너뜀: {}ms", self.policy.period_ms);
            return report;
        };

        for &collection in &self.policy.collections {
            match self
                .store
                .delete_older_than(collection, cutoff, self.policy.page_size)
                .await
            {
                Ok(deleted) => report.deleted.push((collection, deleted)),
                Err(e) => error!("{collection} 정리 실패: {e}"),
            }
        }

        let summary = report
            .deleted
            .iter()
            .map(|(c, n)| format!("{c}={n}"))
            .collect::<Vec<_>>()
            .join(", ");
        info!("정리 완료: {summary} (기준 {cutoff})");
        report
    }

    /// 주기 정리 루프
    pub async fn run(self: Arc<Self>, period: Duration, mut shutdown_rx: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep().await;
                }
                _ = shutdown_rx.changed() => {
                    info!("보존 정리 루프 종료");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use tcgwatch_core::models::performance::PerformanceSample;
    use tcgwatch_core::ports::clock::ManualClock;
    use tcgwatch_core::ports::storage::RecordFilter;
    use tcgwatch_storage::sqlite::SqliteStorage;

    const DAY_MS: i64 = 86_400_000;

    fn sample(ts: chrono::DateTime<Utc>) -> PerformanceSample {
        PerformanceSample {
            route: "/cards".to_string(),
            metric_type: "cardZoom".to_string(),
            load_time: 120.0,
            timestamp: ts,
            user_id: None,
        }
    }

    async fn remaining(store: &SqliteStorage) -> u64 {
        store
            .count_since(
                Collection::Performance,
                &RecordFilter::Any,
                Utc::now() - ChronoDuration::days(3650),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn sweep_deletes_one_page_per_run() {
        let now = Utc::now();
        let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::new(now));
        for i in 0..700 {
            store
                .save_performance(&sample(now - ChronoDuration::milliseconds(31 * DAY_MS + i)))
                .await
                .unwrap();
        }
        let sweeper = RetentionSweeper::new(store.clone(), clock, RetentionPolicy::default());

        let first = sweeper.sweep().await;
        assert_eq!(first.deleted_from(Collection::Performance), Some(500));
        assert_eq!(first.deleted_from(Collection::Errors), Some(0));
        assert_eq!(remaining(&store).await, 200);

        let second = sweeper.sweep().await;
        assert_eq!(second.deleted_from(Collection::Performance), Some(200));
        assert_eq!(remaining(&store).await, 0);
    }

    #[tokio::test]
    async fn records_inside_retention_survive() {
        let now = Utc::now();
        let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
        store
            .save_performance(&sample(now - ChronoDuration::days(29)))
            .await
            .unwrap();
        store
            .save_performance(&sample(now - ChronoDuration::days(31)))
            .await
            .unwrap();
        let sweeper = RetentionSweeper::new(
            store.clone(),
            Arc::new(ManualClock::new(now)),
            RetentionPolicy::default(),
        );

        assert_eq!(sweeper.sweep().await.total(), 1);
        assert_eq!(remaining(&store).await, 1);
    }

    #[tokio::test]
    async fn only_configured_collections_are_swept() {
        let now = Utc::now();
        let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let policy = RetentionPolicy {
            collections: vec![Collection::Alerts],
            ..RetentionPolicy::default()
        };
        store
            .save_performance(&sample(now - ChronoDuration::days(90)))
            .await
            .unwrap();
        let sweeper = RetentionSweeper::new(store.clone(), Arc::new(ManualClock::new(now)), policy);

        let report = sweeper.sweep().await;
        assert_eq!(report.deleted, vec![(Collection::Alerts, 0)]);
        assert_eq!(remaining(&store).await, 1);
    }

    #[tokio::test]
    async fn unrepresentable_period_skips_run_without_panicking() {
        let now = Utc::now();
        let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
        store
            .save_performance(&sample(now - ChronoDuration::days(90)))
            .await
            .unwrap();
        let policy = RetentionPolicy {
            period_ms: u64::MAX,
            ..RetentionPolicy::default()
        };
        let sweeper = RetentionSweeper::new(store.clone(), Arc::new(ManualClock::new(now)), policy);

        let report = sweeper.sweep().await;
        assert_eq!(report.total(), 0);
        assert_eq!(remaining(&store).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_sweeps_on_interval() {
        let now = Utc::now();
        let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
        store
            .save_performance(&sample(now - ChronoDuration::days(40)))
            .await
            .unwrap();
        let sweeper = Arc::new(RetentionSweeper::new(
            store.clone(),
            Arc::new(ManualClock::new(now)),
            RetentionPolicy::default(),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(sweeper.run(Duration::from_secs(3600), shutdown_rx));

        tokio::time::sleep(Duration::from_secs(3601)).await;
        assert_eq!(remaining(&store).await, 0);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
