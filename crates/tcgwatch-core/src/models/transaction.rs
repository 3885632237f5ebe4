//! 거래 레코드 모델.
//!
//! 거래는 주문 처리 시스템이 기록하며, 모니터링은 실패 건수만 집계한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 거래 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// 거래 한 건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}
