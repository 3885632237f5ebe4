//! 모니터링 컬렉션 식별자.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 저장소의 이름 있는 레코드 묶음
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// 성능 샘플
    Performance,
    /// 에러 보고
    Errors,
    /// 알림 로그
    Alerts,
    /// 거래 (주문 처리 쪽에서 기록)
    Transactions,
}

impl Collection {
    /// 저장소 테이블 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Errors => "errors",
            Self::Alerts => "alerts",
            Self::Transactions => "transactions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
