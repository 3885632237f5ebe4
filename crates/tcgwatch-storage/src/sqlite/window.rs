//! 시간 창 집계와 보존 정리용 일괄 삭제.
//!
//! 집계는 `timestamp_ms > since` (경계 제외), 삭제는 `timestamp_ms < cutoff`.
//! 집계 쪽에는 건수 상한이 없다. 시간 창 크기로 결과 규모를 제한한다.

use chrono::{DateTime, Utc};
use rusqlite::params;
use tcgwatch_core::error::CoreError;
use tcgwatch_core::models::collection::Collection;
use tcgwatch_core::ports::storage::RecordFilter;
use tracing::debug;

use super::{storage_err, to_millis, SqliteStorage};

impl SqliteStorage {
    pub(super) fn count_window(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        since: DateTime<Utc>,
    ) -> Result<u64, CoreError> {
        let table = collection.as_str();
        let since_ms = to_millis(since);
        let conn = self.lock()?;

        let count: i64 = match (filter, collection) {
            (RecordFilter::Any, _) => conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE timestamp_ms > ?1"),
                params![since_ms],
                |row| row.get(0),
            ),
            (RecordFilter::MessageEquals(message), Collection::Errors) => conn.query_row(
                "SELECT COUNT(*) FROM errors WHERE timestamp_ms > ?1 AND message = ?2",
                params![since_ms, message],
                |row| row.get(0),
            ),
            (RecordFilter::StatusEquals(status), Collection::Transactions) => conn.query_row(
                "SELECT COUNT(*) FROM transactions WHERE timestamp_ms > ?1 AND status = ?2",
                params![since_ms, status.as_str()],
                |row| row.get(0),
            ),
            (filter, collection) => {
                return Err(CoreError::Validation {
                    field: "filter".to_string(),
                    message: format!("{collection} 컬렉션에 쓸 수 없는 필터: {filter:?}"),
                })
            }
        }
        .map_err(storage_err("시간 창 집계"))?;

        debug!("{table} 집계 (since={since}, {filter:?}): {count}건");
        Ok(count.max(0) as u64)
    }

    pub(super) fn delete_page(
        &self,
        collection: Collection,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, CoreError> {
        let table = collection.as_str();
        let conn = self.lock()?;

        // 단일 문장: 오래된 순 limit건만 지운다
        let deleted = conn
            .execute(
                &format!(
                    "DELETE FROM {table} WHERE rowid IN (
                        SELECT rowid FROM {table}
                        WHERE timestamp_ms < ?1
                        ORDER BY timestamp_ms ASC
                        LIMIT ?2
                    )"
                ),
                params![to_millis(cutoff), limit as i64],
            )
            .map_err(storage_err("보존 정리 삭제"))?;

        debug!("{table} 정리: {deleted}건 삭제 (cutoff={cutoff})");
        Ok(deleted)
    }
}
