//! 성능 샘플, 에러, 거래 저장.

use rusqlite::params;
use tcgwatch_core::error::CoreError;
use tcgwatch_core::models::error_report::ErrorRecord;
use tcgwatch_core::models::performance::PerformanceSample;
use tcgwatch_core::models::transaction::TransactionRecord;
use tracing::debug;

use super::{storage_err, to_millis, SqliteStorage};

impl SqliteStorage {
    pub(super) fn insert_performance(&self, sample: &PerformanceSample) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO performance (route, metric_type, load_time, user_id, timestamp_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                sample.route,
                sample.metric_type,
                sample.load_time,
                sample.user_id,
                to_millis(sample.timestamp),
            ],
        )
        .map_err(storage_err("성능 샘플 저장"))?;

        debug!(
            "성능 샘플 저장: {} {}ms ({})",
            sample.metric_type, sample.load_time, sample.route
        );
        Ok(())
    }

    pub(super) fn insert_error(&self, record: &ErrorRecord) -> Result<(), CoreError> {
        let metadata = record
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO errors (message, stack, user_id, route, metadata, timestamp_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.message,
                record.stack,
                record.user_id,
                record.route,
                metadata,
                to_millis(record.timestamp),
            ],
        )
        .map_err(storage_err("에러 레코드 저장"))?;

        debug!("에러 레코드 저장: {}", record.message);
        Ok(())
    }

    pub(super) fn insert_transaction(&self, record: &TransactionRecord) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO transactions (id, status, amount, user_id, timestamp_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.status.as_str(),
                record.amount,
                record.user_id,
                to_millis(record.timestamp),
            ],
        )
        .map_err(storage_err("거래 저장"))?;
        Ok(())
    }
}
