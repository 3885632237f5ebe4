//! `MonitoringStore` 포트 구현.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tcgwatch_core::error::CoreError;
use tcgwatch_core::models::alert::AlertRecord;
use tcgwatch_core::models::collection::Collection;
use tcgwatch_core::models::error_report::ErrorRecord;
use tcgwatch_core::models::performance::PerformanceSample;
use tcgwatch_core::models::transaction::TransactionRecord;
use tcgwatch_core::ports::storage::{MonitoringStore, RecordFilter};

use super::SqliteStorage;

#[async_trait]
impl MonitoringStore for SqliteStorage {
    async fn save_performance(&self, sample: &PerformanceSample) -> Result<(), CoreError> {
        self.insert_performance(sample)
    }

    async fn save_error(&self, record: &ErrorRecord) -> Result<(), CoreError> {
        self.insert_error(record)
    }

    async fn save_alert(&self, alert: &AlertRecord) -> Result<i64, CoreError> {
        self.insert_alert(alert)
    }

    async fn save_transaction(&self, record: &TransactionRecord) -> Result<(), CoreError> {
        self.insert_transaction(record)
    }

    async fn count_since(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        since: DateTime<Utc>,
    ) -> Result<u64, CoreError> {
        self.count_window(collection, filter, since)
    }

    async fn delete_older_than(
        &self,
        collection: Collection,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, CoreError> {
        self.delete_page(collection, cutoff, limit)
    }

    async fn recent_alerts(&self, limit: usize) -> Result<Vec<AlertRecord>, CoreError> {
        self.select_recent_alerts(limit)
    }
}
