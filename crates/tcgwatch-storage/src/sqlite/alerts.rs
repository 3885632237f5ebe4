//! 알림 레코드 저장/조회.

use rusqlite::params;
use serde_json::{Map, Value};
use tcgwatch_core::error::CoreError;
use tcgwatch_core::models::alert::{AlertRecord, AlertSeverity, AlertType};
use tracing::debug;

use super::{from_millis, storage_err, to_millis, SqliteStorage};

/// DB 행 (파싱 전)
struct AlertRow {
    id: i64,
    alert_type: String,
    severity: String,
    message: String,
    details: String,
    timestamp_ms: i64,
}

impl AlertRow {
    fn into_record(self) -> Result<AlertRecord, CoreError> {
        let alert_type = AlertType::parse(&self.alert_type)
            .ok_or_else(|| CoreError::Storage(format!("알 수 없는 알림 종류: {}", self.alert_type)))?;
        let severity = AlertSeverity::parse(&self.severity)
            .ok_or_else(|| CoreError::Storage(format!("알 수 없는 심각도: {}", self.severity)))?;
        let details: Map<String, Value> = serde_json::from_str(&self.details)?;

        Ok(AlertRecord {
            id: Some(self.id),
            alert_type,
            severity,
            message: self.message,
            details,
            timestamp: from_millis(self.timestamp_ms)?,
        })
    }
}

impl SqliteStorage {
    pub(super) fn insert_alert(&self, alert: &AlertRecord) -> Result<i64, CoreError> {
        let details = serde_json::to_string(&alert.details)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO alerts (alert_type, severity, message, details, timestamp_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                alert.alert_type.as_str(),
                alert.severity.as_str(),
                alert.message,
                details,
                to_millis(alert.timestamp),
            ],
        )
        .map_err(storage_err("알림 저장"))?;

        let id = conn.last_insert_rowid();
        debug!(
            "알림 저장: #{id} [{}/{}] {}",
            alert.alert_type,
            alert.severity.as_str(),
            alert.message
        );
        Ok(id)
    }

    pub(super) fn select_recent_alerts(&self, limit: usize) -> Result<Vec<AlertRecord>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, alert_type, severity, message, details, timestamp_ms
                 FROM alerts ORDER BY timestamp_ms DESC, id DESC LIMIT ?1",
            )
            .map_err(storage_err("쿼리 준비"))?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(AlertRow {
                    id: row.get(0)?,
                    alert_type: row.get(1)?,
                    severity: row.get(2)?,
                    message: row.get(3)?,
                    details: row.get(4)?,
                    timestamp_ms: row.get(5)?,
                })
            })
            .map_err(storage_err("쿼리 실행"))?;

        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row.map_err(storage_err("행 읽기"))?.into_record()?);
        }
        Ok(alerts)
    }
}
